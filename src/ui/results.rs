use std::iter;

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::db::{ResultSet, Value};
use crate::dispatch::OutputRegions;
use super::theme::{icons, Theme};

const MIN_COLUMN_WIDTH: usize = 4;
const MAX_COLUMN_WIDTH: usize = 40;
const LINE_BREAK: &str = "⏎";

#[derive(Debug, Default)]
pub struct ResultsState {
    pub table: TableState,
    pub set_index: usize,
    pub column_offset: usize,
}

impl ResultsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn select_next(&mut self, row_count: usize) {
        if row_count == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) => (i + 1).min(row_count - 1),
            None => 0,
        };
        self.table.select(Some(i));
    }

    pub fn select_prev(&mut self, row_count: usize) {
        if row_count == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.table.select(Some(i));
    }

    pub fn scroll_left(&mut self) {
        self.column_offset = self.column_offset.saturating_sub(1);
    }

    pub fn scroll_right(&mut self, column_count: usize) {
        if self.column_offset + 1 < column_count {
            self.column_offset += 1;
        }
    }

    pub fn next_set(&mut self, set_count: usize) {
        if self.set_index + 1 < set_count {
            self.set_index += 1;
            self.table = TableState::default();
            self.column_offset = 0;
        }
    }

    pub fn prev_set(&mut self) {
        if self.set_index > 0 {
            self.set_index -= 1;
            self.table = TableState::default();
            self.column_offset = 0;
        }
    }
}

/// Single-line cell text. Rows are one line tall, so line breaks are shown
/// as a marker instead of being cut off.
pub fn cell_text(value: &Value) -> String {
    let text = value.to_string();
    if !text.contains(['\n', '\r']) {
        return text;
    }
    text.replace("\r\n", LINE_BREAK)
        .replace(['\n', '\r'], LINE_BREAK)
}

/// Display width of each column: the widest of the header and its cells.
pub fn column_widths(set: &ResultSet) -> Vec<u16> {
    set.columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let widest = set
                .rows
                .iter()
                .map(|row| cell_text(&row[idx]).width())
                .chain(iter::once(name.width()))
                .max()
                .unwrap_or(0);
            widest.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH) as u16
        })
        .collect()
}

pub fn render_error(frame: &mut Frame, area: Rect, error: &str, theme: &Theme) {
    let paragraph = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} ", icons::WARNING), theme.error_style()),
        Span::styled(error, theme.error_style()),
    ]))
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_style(theme.error_style())
            .style(Style::default().bg(theme.bg)),
    );
    frame.render_widget(paragraph, area);
}

pub fn render_results(
    frame: &mut Frame,
    area: Rect,
    regions: &OutputRegions,
    state: &mut ResultsState,
    focused: bool,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.block_style(focused))
        .style(Style::default().bg(theme.bg));

    if !regions.has_results() {
        frame.render_widget(block.title(" Results "), area);
        return;
    }

    let Some(set) = regions.result_sets.get(state.set_index) else {
        let placeholder = Paragraph::new("The query produces no result.")
            .style(theme.dim_style())
            .alignment(Alignment::Center)
            .block(block.title(" Results "));
        frame.render_widget(placeholder, area);
        return;
    };

    let skip = state.column_offset.min(set.columns.len().saturating_sub(1));

    let header = Row::new(
        set.columns
            .iter()
            .skip(skip)
            .map(|name| Cell::from(name.as_str()).style(theme.header_style())),
    )
    .height(1);

    let rows: Vec<Row> = set
        .rows
        .iter()
        .map(|row| {
            let cells = row
                .iter()
                .skip(skip)
                .map(|value| Cell::from(cell_text(value)).style(theme.text_style()));
            Row::new(cells).height(1)
        })
        .collect();

    let widths: Vec<Constraint> = column_widths(set)
        .into_iter()
        .skip(skip)
        .map(Constraint::Length)
        .collect();

    let title = if regions.result_sets.len() > 1 {
        format!(
            " Results {}/{} ({} rows) ",
            state.set_index + 1,
            regions.result_sets.len(),
            set.rows.len()
        )
    } else {
        format!(" Results ({} rows) ", set.rows.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(block.title(title))
        .row_highlight_style(theme.selected_style().add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(table, area, &mut state.table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_count_wide_characters_and_clamp() {
        let set = ResultSet::new(
            vec!["小韻".to_string(), "n".to_string(), "long".to_string()],
            vec![vec![
                Value::from("東"),
                Value::Integer(7),
                Value::from("x".repeat(100).as_str()),
            ]],
        );
        assert_eq!(column_widths(&set), vec![4, 4, 40]);
    }

    #[test]
    fn line_breaks_become_visible_markers() {
        assert_eq!(cell_text(&Value::from("東\n冬")), "東⏎冬");
        assert_eq!(cell_text(&Value::from("a\r\nb\rc")), "a⏎b⏎c");
        assert_eq!(cell_text(&Value::from("plain")), "plain");
        assert_eq!(cell_text(&Value::Null), "NULL");

        let set = ResultSet::new(vec!["x".to_string()], vec![vec![Value::from("ab\ncd")]]);
        assert_eq!(column_widths(&set), vec![5]);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut state = ResultsState::new();
        state.select_prev(3);
        assert_eq!(state.table.selected(), Some(0));
        for _ in 0..5 {
            state.select_next(3);
        }
        assert_eq!(state.table.selected(), Some(2));

        state.select_next(0);
        assert_eq!(state.table.selected(), Some(2));
    }

    #[test]
    fn switching_sets_resets_position() {
        let mut state = ResultsState::new();
        state.select_next(5);
        state.scroll_right(3);
        state.next_set(2);
        assert_eq!(state.set_index, 1);
        assert_eq!(state.table.selected(), None);
        assert_eq!(state.column_offset, 0);

        state.next_set(2);
        assert_eq!(state.set_index, 1);
        state.prev_set();
        assert_eq!(state.set_index, 0);
    }
}
