use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::theme::{icons, Theme};

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Modal shown when bootstrap fails. Input is blocked until dismissed.
pub fn render_notice(frame: &mut Frame, message: &str, detail: &str, theme: &Theme) {
    let dialog_area = centered(frame.area(), 72, 9);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(format!(" {} Notice ", icons::WARNING))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(theme.error_style())
        .style(Style::default().bg(theme.bg_secondary));
    frame.render_widget(block, dialog_area);

    let inner = Rect::new(
        dialog_area.x + 2,
        dialog_area.y + 1,
        dialog_area.width.saturating_sub(4),
        dialog_area.height.saturating_sub(2),
    );

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(2),
        Constraint::Length(1),
    ])
    .split(inner);

    let title = Paragraph::new(message)
        .style(theme.error_style().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let detail = Paragraph::new(detail)
        .style(theme.dim_style())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, chunks[1]);

    let help = Paragraph::new("Enter: dismiss  |  Esc: quit")
        .style(theme.muted_style())
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

pub fn render_loading(frame: &mut Frame, snapshot: &str, theme: &Theme) {
    let area = centered(frame.area(), 48, 3);
    frame.render_widget(Clear, area);

    let text = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} ", icons::DATABASE), theme.accent_style()),
        Span::styled(format!("Loading {snapshot}…"), theme.text_style()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .style(Style::default().bg(theme.bg_secondary)),
    );
    frame.render_widget(text, area);
}
