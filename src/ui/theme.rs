use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub bg_secondary: Color,
    pub bg_highlight: Color,
    pub bg_selected: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub error: Color,
    pub border: Color,
    pub border_focused: Color,
    pub group: Color,
    pub object: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::blackboard()
    }
}

impl Theme {
    /// Dark chalkboard palette for the editor and tables.
    pub fn blackboard() -> Self {
        Self {
            bg: Color::Rgb(12, 16, 33),
            bg_secondary: Color::Rgb(20, 25, 46),
            bg_highlight: Color::Rgb(37, 43, 70),
            bg_selected: Color::Rgb(37, 59, 118),
            text: Color::Rgb(248, 248, 248),
            text_dim: Color::Rgb(174, 174, 174),
            text_muted: Color::Rgb(110, 114, 130),
            accent: Color::Rgb(251, 222, 45),
            error: Color::Rgb(255, 100, 100),
            border: Color::Rgb(60, 66, 95),
            border_focused: Color::Rgb(251, 222, 45),
            group: Color::Rgb(255, 100, 0),
            object: Color::Rgb(141, 166, 206),
        }
    }

    /// Washed-out variant drawn while the database is still loading.
    pub fn blurred(&self) -> Self {
        Self {
            text: self.text_muted,
            text_dim: self.text_muted,
            accent: self.text_muted,
            error: self.text_muted,
            border_focused: self.border,
            group: self.text_muted,
            object: self.text_muted,
            ..self.clone()
        }
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn border_focused_style(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.bg_selected)
            .fg(self.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn button_style(&self) -> Style {
        Style::default()
            .fg(self.text_dim)
            .bg(self.bg_secondary)
    }

    pub fn button_hover_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.bg_highlight)
    }

    pub fn button_active_style(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn button_disabled_style(&self) -> Style {
        Style::default()
            .fg(self.text_muted)
            .bg(self.bg_secondary)
            .add_modifier(Modifier::CROSSED_OUT)
    }

    pub fn group_style(&self) -> Style {
        Style::default()
            .fg(self.group)
            .add_modifier(Modifier::BOLD)
    }

    pub fn object_style(&self) -> Style {
        Style::default().fg(self.object)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn block_style(&self, focused: bool) -> Style {
        if focused {
            self.border_focused_style()
        } else {
            self.border_style()
        }
    }
}

pub mod icons {
    pub const TABLE: &str = "";
    pub const VIEW: &str = "";
    pub const DATABASE: &str = "";
    pub const PLAY: &str = "";
    pub const EXPORT: &str = "";
    pub const CLEAR: &str = "";
    pub const WARNING: &str = "";
    pub const EXPAND: &str = "▶";
    pub const COLLAPSE: &str = "▼";
}
