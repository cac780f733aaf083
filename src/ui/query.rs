use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use super::theme::{icons, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryButton {
    None,
    Run,
    Clear,
    Export,
}

pub struct ButtonRegion {
    pub run: Rect,
    pub clear: Rect,
    pub export: Rect,
}

fn contains(rect: Rect, x: u16, y: u16) -> bool {
    rect.x <= x && x < rect.x + rect.width && rect.y <= y && y < rect.y + rect.height
}

impl ButtonRegion {
    pub fn hit_test(&self, x: u16, y: u16) -> QueryButton {
        if contains(self.run, x, y) {
            QueryButton::Run
        } else if contains(self.clear, x, y) {
            QueryButton::Clear
        } else if contains(self.export, x, y) {
            QueryButton::Export
        } else {
            QueryButton::None
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub initial_text: String,
    pub line_numbers: bool,
}

pub fn new_editor<'a>(config: &EditorConfig, theme: &Theme) -> TextArea<'a> {
    let mut editor = TextArea::from(config.initial_text.split('\n').map(str::to_string));
    editor.set_cursor_line_style(Style::default());
    if config.line_numbers {
        editor.set_line_number_style(theme.muted_style());
    }
    editor
}

pub struct QueryPanel<'t> {
    pub focused: bool,
    pub run_enabled: bool,
    pub selected_button: QueryButton,
    pub hovered_button: QueryButton,
    pub theme: &'t Theme,
}

pub fn render_query_panel(
    frame: &mut Frame,
    area: Rect,
    textarea: &TextArea,
    panel: QueryPanel<'_>,
) -> ButtonRegion {
    let theme = panel.theme;

    let run_width = 10u16;
    let clear_width = 11u16;
    let export_width = 12u16;
    let spacing = 1u16;
    let total_buttons_width = run_width + clear_width + export_width + spacing * 2;

    let buttons_x = area.x + area.width.saturating_sub(total_buttons_width + 2);
    let buttons_y = area.y;

    let run_rect = Rect::new(buttons_x, buttons_y, run_width, 1);
    let clear_rect = Rect::new(buttons_x + run_width + spacing, buttons_y, clear_width, 1);
    let export_rect = Rect::new(
        buttons_x + run_width + spacing + clear_width + spacing,
        buttons_y,
        export_width,
        1,
    );

    let mut ta = textarea.clone();
    ta.set_block(
        Block::default()
            .title(" SQL ")
            .borders(Borders::ALL)
            .border_style(theme.block_style(panel.focused))
            .style(Style::default().bg(theme.bg_secondary)),
    );
    ta.set_style(theme.text_style());
    if panel.focused {
        ta.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED).bg(theme.accent));
    } else {
        ta.set_cursor_style(Style::default());
    }
    frame.render_widget(&ta, area);

    let run_style = if panel.run_enabled {
        button_style(QueryButton::Run, &panel)
    } else {
        theme.button_disabled_style()
    };
    let clear_style = button_style(QueryButton::Clear, &panel);
    let export_style = button_style(QueryButton::Export, &panel);

    frame.render_widget(Paragraph::new(format!(" {} Run ", icons::PLAY)).style(run_style), run_rect);
    frame.render_widget(Paragraph::new(format!(" {} Clear ", icons::CLEAR)).style(clear_style), clear_rect);
    frame.render_widget(Paragraph::new(format!(" {} Export ", icons::EXPORT)).style(export_style), export_rect);

    ButtonRegion {
        run: run_rect,
        clear: clear_rect,
        export: export_rect,
    }
}

fn button_style(button: QueryButton, panel: &QueryPanel<'_>) -> Style {
    if button == panel.selected_button {
        panel.theme.button_active_style()
    } else if button == panel.hovered_button {
        panel.theme.button_hover_style()
    } else {
        panel.theme.button_style()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_test_finds_each_button() {
        let region = ButtonRegion {
            run: Rect::new(10, 0, 10, 1),
            clear: Rect::new(21, 0, 11, 1),
            export: Rect::new(33, 0, 12, 1),
        };
        assert_eq!(region.hit_test(10, 0), QueryButton::Run);
        assert_eq!(region.hit_test(31, 0), QueryButton::Clear);
        assert_eq!(region.hit_test(44, 0), QueryButton::Export);
        assert_eq!(region.hit_test(20, 0), QueryButton::None);
        assert_eq!(region.hit_test(12, 1), QueryButton::None);
    }

    #[test]
    fn editor_keeps_trailing_empty_line() {
        let config = EditorConfig {
            initial_text: "-- comment\nSELECT 1;\n".to_string(),
            line_numbers: true,
        };
        let editor = new_editor(&config, &Theme::default());
        assert_eq!(editor.lines(), ["-- comment", "SELECT 1;", ""]);
    }
}
