use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, Page};

use super::pages::{characters, details};
use super::styles::{self, Palette};

pub fn render(frame: &mut Frame, app: &App) {
    let palette = styles::palette(app.current_theme());

    frame.render_widget(Block::default().style(palette.base()), frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0], &palette);
    match app.page {
        Page::Characters => characters::render(frame, app, chunks[1], &palette),
        Page::Details(id) => details::render(frame, app, id, chunks[1], &palette),
    }
    render_status_bar(frame, app, chunks[2], &palette);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, &palette),
        AppState::EnteringId => render_id_prompt(frame, app, &palette),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let title = "  Rick and Morty";
    let subtitle = match app.page {
        Page::Characters => "  Character Explorer".to_string(),
        Page::Details(id) if id > 0 => format!("  Character #{}", id),
        Page::Details(_) => "  Character".to_string(),
    };
    let help_hint = "[?] Help";
    let used = title.len() + subtitle.chars().count() + help_hint.len() + 2;

    let title_line = Line::from(vec![
        Span::styled(title, palette.title()),
        Span::styled(subtitle, palette.accent()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(help_hint, palette.muted()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(palette.muted());
    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let shortcuts = match app.page {
        Page::Characters => "[/]search [←/→]page [t]heme [q]uit",
        Page::Details(_) => "[Esc]back [t]heme [q]uit",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} cached queries ", app.queries.len()),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let left_style = if app.status_message.is_some() {
        palette.error()
    } else {
        palette.muted()
    };
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, palette.muted()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(palette.status_bar()), area);
}

fn render_help_overlay(frame: &mut Frame, palette: &Palette) {
    let area = centered_rect_fixed(50, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), palette.help_key()),
            Span::styled(desc, palette.text()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  Rick and Morty Character Explorer", palette.title())),
        Line::from(Span::styled(format!("  version {}", version), palette.muted())),
        Line::from(""),
        Line::from(Span::styled(" Characters", palette.accent())),
        key("↑/↓ j/k", "Move selection"),
        key("Enter", "Open character details"),
        key("←/→", "Previous/next page"),
        key("/", "Search by name"),
        key("Esc", "Clear search"),
        key("g", "Go to character id"),
        Line::from(""),
        Line::from(Span::styled(" Details", palette.accent())),
        key("↑/↓", "Scroll episodes"),
        key("Esc", "Back to list"),
        Line::from(""),
        Line::from(Span::styled(" Anywhere", palette.accent())),
        key("r", "Try again after an error"),
        key("t", "Toggle dark/light theme"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("      Press ", palette.muted()),
            Span::styled("?", palette.help_key()),
            Span::styled(" or ", palette.muted()),
            Span::styled("Esc", palette.help_key()),
            Span::styled(" to close", palette.muted()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(true))
        .style(palette.base());
    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_id_prompt(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect_fixed(36, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(vec![
            Span::styled("  Character id: ", palette.muted()),
            Span::styled(format!("{}▌", app.id_input), palette.text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Enter]", palette.help_key()),
            Span::styled(" open  ", palette.muted()),
            Span::styled("[Esc]", palette.help_key()),
            Span::styled(" cancel", palette.muted()),
        ]),
    ];
    let block = Block::default()
        .title(" Go to character ")
        .title_style(palette.title())
        .borders(Borders::ALL)
        .border_style(palette.border(true))
        .style(palette.base());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(50, 20, outer), Rect::new(25, 10, 50, 20));

        let small = Rect::new(0, 0, 30, 10);
        assert_eq!(centered_rect_fixed(50, 20, small), Rect::new(0, 0, 30, 10));
    }
}
