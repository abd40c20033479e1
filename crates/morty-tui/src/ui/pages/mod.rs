//! Page renderers and the blocks they share.

pub mod characters;
pub mod details;

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::styles::Palette;

/// Centered error message with key hints, e.g. `[("r", "Try again")]`.
pub fn render_error_block(
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
    message: &str,
    hints: &[(&str, &str)],
) {
    let mut hint_spans = Vec::new();
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            hint_spans.push(Span::raw("   "));
        }
        hint_spans.push(Span::styled(format!("[{}]", key), palette.help_key()));
        hint_spans.push(Span::styled(format!(" {}", label), palette.text()));
    }

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Oops! Something went wrong", palette.error())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), palette.muted())),
        Line::from(""),
        Line::from(hint_spans),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(false));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Centered placeholder such as a loading or empty state.
pub fn render_notice(frame: &mut Frame, area: Rect, palette: &Palette, title: &str, detail: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(title.to_string(), palette.title())),
        Line::from(Span::styled(detail.to_string(), palette.muted())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(false));
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    frame.render_widget(paragraph, area);
}
