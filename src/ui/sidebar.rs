use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::db::{ObjectKind, SchemaObject};
use super::theme::{icons, Theme};

#[derive(Debug, Clone)]
struct Group {
    kind: ObjectKind,
    expanded: bool,
    names: Vec<String>,
}

/// A visible row: a group header, or an object inside group `.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Group(usize),
    Object(usize, usize),
}

/// Tables and views, each kind under a collapsible header.
#[derive(Debug, Default)]
pub struct TreeState {
    groups: Vec<Group>,
    selected: Option<Entry>,
    pub scroll_offset: usize,
}

impl TreeState {
    pub fn from_objects(objects: &[SchemaObject]) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        for object in objects {
            match groups.iter_mut().find(|g| g.kind == object.kind) {
                Some(group) => group.names.push(object.name.clone()),
                None => groups.push(Group {
                    kind: object.kind,
                    expanded: true,
                    names: vec![object.name.clone()],
                }),
            }
        }
        groups.sort_by_key(|g| g.kind);

        Self {
            selected: (!groups.is_empty()).then_some(Entry::Group(0)),
            groups,
            scroll_offset: 0,
        }
    }

    /// Rows in display order, skipping the contents of collapsed groups.
    pub fn rows(&self) -> Vec<Entry> {
        let mut rows = Vec::new();
        for (gi, group) in self.groups.iter().enumerate() {
            rows.push(Entry::Group(gi));
            if group.expanded {
                rows.extend((0..group.names.len()).map(|oi| Entry::Object(gi, oi)));
            }
        }
        rows
    }

    fn position(&self, rows: &[Entry]) -> usize {
        self.selected
            .and_then(|entry| rows.iter().position(|&row| row == entry))
            .unwrap_or(0)
    }

    fn step(&mut self, forward: bool) {
        let rows = self.rows();
        if rows.is_empty() {
            return;
        }
        let len = rows.len();
        let position = self.position(&rows);
        let next = if forward { (position + 1) % len } else { (position + len - 1) % len };
        self.selected = Some(rows[next]);
    }

    pub fn select_next(&mut self) {
        self.step(true);
    }

    pub fn select_prev(&mut self) {
        self.step(false);
    }

    pub fn toggle_selected(&mut self) {
        if let Some(Entry::Group(gi)) = self.selected {
            if let Some(group) = self.groups.get_mut(gi) {
                group.expanded = !group.expanded;
            }
        }
    }

    pub fn selected_object(&self) -> Option<&str> {
        match self.selected? {
            Entry::Object(gi, oi) => self.groups.get(gi)?.names.get(oi).map(String::as_str),
            Entry::Group(_) => None,
        }
    }

    pub fn is_selected_group(&self) -> bool {
        matches!(self.selected, Some(Entry::Group(_)))
    }

    pub fn is_selected(&self, entry: Entry) -> bool {
        self.selected == Some(entry)
    }

    pub fn select_by_click(&mut self, row: usize) {
        if let Some(&entry) = self.rows().get(row) {
            self.selected = Some(entry);
        }
    }

    pub fn kind(&self, entry: Entry) -> Option<ObjectKind> {
        match entry {
            Entry::Group(gi) | Entry::Object(gi, _) => self.groups.get(gi).map(|g| g.kind),
        }
    }

    pub fn is_expanded(&self, gi: usize) -> bool {
        self.groups.get(gi).is_some_and(|g| g.expanded)
    }

    /// Text shown for a row: the group label or the object name.
    pub fn label(&self, entry: Entry) -> &str {
        match entry {
            Entry::Group(gi) => self.groups.get(gi).map_or("", |g| g.kind.label()),
            Entry::Object(gi, oi) => self
                .groups
                .get(gi)
                .and_then(|g| g.names.get(oi))
                .map_or("", String::as_str),
        }
    }

    pub fn update_scroll(&mut self, height: usize) {
        let position = self.position(&self.rows());
        if position < self.scroll_offset {
            self.scroll_offset = position;
        } else if height > 0 && position >= self.scroll_offset + height {
            self.scroll_offset = position + 1 - height;
        }
    }
}

/// `SELECT * FROM "name" LIMIT 100;` with the identifier quoted.
pub fn preview_query(name: &str) -> String {
    format!("SELECT * FROM \"{}\" LIMIT 100;", name.replace('"', "\"\""))
}

pub fn render_sidebar(
    frame: &mut Frame,
    area: Rect,
    tree_state: &mut TreeState,
    focused: bool,
    theme: &Theme,
) {
    let visible_height = area.height.saturating_sub(2) as usize;

    tree_state.update_scroll(visible_height);

    let tree: &TreeState = tree_state;
    let rows = tree.rows();
    let total_rows = rows.len();
    let scroll_offset = tree.scroll_offset;

    let items: Vec<ListItem> = rows
        .iter()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|&entry| {
            let label = tree.label(entry);
            let selected = tree.is_selected(entry);
            match entry {
                Entry::Group(gi) => {
                    let icon = if tree.is_expanded(gi) { icons::COLLAPSE } else { icons::EXPAND };
                    let style = if selected { theme.selected_style() } else { theme.group_style() };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!(" {icon} "), theme.dim_style()),
                        Span::styled(label, style),
                    ]))
                }
                Entry::Object(..) => {
                    let style = if selected { theme.selected_style() } else { theme.object_style() };
                    let icon = match tree.kind(entry) {
                        Some(ObjectKind::View) => icons::VIEW,
                        _ => icons::TABLE,
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(icon, theme.dim_style()),
                        Span::raw(" "),
                        Span::styled(label, style),
                    ]))
                }
            }
        })
        .collect();

    let block = Block::default()
        .title(format!(" {} Snapshot ", icons::DATABASE))
        .borders(Borders::ALL)
        .border_style(theme.block_style(focused))
        .style(Style::default().bg(theme.bg_secondary));

    frame.render_widget(List::new(items).block(block), area);

    if total_rows > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");

        let mut scrollbar_state = ScrollbarState::new(total_rows).position(scroll_offset);

        let scrollbar_area = Rect::new(
            area.x + area.width.saturating_sub(1),
            area.y + 1,
            1,
            area.height.saturating_sub(2),
        );

        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objects() -> Vec<SchemaObject> {
        vec![
            SchemaObject { name: "廣韻字頭全".into(), kind: ObjectKind::View },
            SchemaObject { name: "廣韻字頭".into(), kind: ObjectKind::Table },
            SchemaObject { name: "廣韻小韻".into(), kind: ObjectKind::Table },
        ]
    }

    #[test]
    fn groups_tables_before_views() {
        let tree = TreeState::from_objects(&objects());
        let labels: Vec<&str> = tree.rows().into_iter().map(|row| tree.label(row)).collect();
        assert_eq!(labels, ["tables", "廣韻字頭", "廣韻小韻", "views", "廣韻字頭全"]);
        assert_eq!(tree.kind(Entry::Object(1, 0)), Some(ObjectKind::View));
    }

    #[test]
    fn empty_snapshot_has_no_selection() {
        let mut tree = TreeState::from_objects(&[]);
        tree.select_next();
        tree.toggle_selected();
        assert!(tree.rows().is_empty());
        assert!(!tree.is_selected_group());
        assert_eq!(tree.selected_object(), None);
    }

    #[test]
    fn click_selects_visible_row() {
        let mut tree = TreeState::from_objects(&objects());
        tree.select_by_click(2);
        assert_eq!(tree.selected_object(), Some("廣韻小韻"));
        tree.select_by_click(99);
        assert_eq!(tree.selected_object(), Some("廣韻小韻"));
        tree.select_prev();
        tree.select_prev();
        tree.select_prev();
        assert_eq!(tree.selected_object(), Some("廣韻字頭全"));
    }

    #[test]
    fn collapsed_group_hides_its_objects() {
        let mut tree = TreeState::from_objects(&objects());
        assert!(tree.is_selected_group());
        tree.toggle_selected();
        tree.select_next();
        assert!(tree.is_selected_group());
        tree.select_next();
        assert_eq!(tree.selected_object(), Some("廣韻字頭全"));
        tree.select_next();
        assert!(tree.is_selected_group());
    }

    #[test]
    fn preview_query_quotes_identifiers() {
        assert_eq!(preview_query("廣韻小韻"), "SELECT * FROM \"廣韻小韻\" LIMIT 100;");
        assert_eq!(preview_query("a\"b"), "SELECT * FROM \"a\"\"b\" LIMIT 100;");
    }
}
