//! Characters page: search box, result list with a preview card, and the
//! pagination bar.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use morty_core::utils::{or_unknown, truncate_string};
use morty_core::{results_summary, Character, CharactersPage, PageControls, QueryStatus};

use super::{render_error_block, render_notice};
use crate::app::{App, AppState};
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search box
            Constraint::Length(1), // Result count
            Constraint::Min(5),    // Results
            Constraint::Length(1), // Pagination
        ])
        .split(area);

    render_search_box(frame, app, chunks[0], palette);

    let status = app.queries.characters_status(&app.browser.filters());
    let is_fetching = matches!(status, QueryStatus::Success { is_fetching: true, .. });
    match (&status, status.data()) {
        (QueryStatus::Error { error, stale: None }, _) => {
            render_error_block(
                frame,
                chunks[2],
                palette,
                &error.to_string(),
                &[("r", "Try again")],
            );
        }
        (_, Some(page)) if page.results.is_empty() => {
            render_notice(
                frame,
                chunks[2],
                palette,
                "No characters found",
                "Try adjusting your search terms",
            );
        }
        (_, Some(page)) => {
            let summary = results_summary(&page.info, app.store.search_term());
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(format!(" {}", summary), palette.muted()))),
                chunks[1],
            );
            render_results(frame, app, page, is_fetching, chunks[2], palette);
            render_pagination(frame, app, page, chunks[3], palette);
        }
        (_, None) => {
            render_notice(frame, chunks[2], palette, "Loading characters...", "");
        }
    }
}

fn render_search_box(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let searching = matches!(app.state, AppState::Searching);
    let content = if app.search_input.is_empty() && !searching {
        Span::styled("Search by character name...", palette.muted())
    } else {
        let cursor = if searching { "▌" } else { "" };
        Span::styled(format!("{}{}", app.search_input, cursor), palette.text())
    };

    let mut title = vec![Span::styled(" [/] Search ", palette.title())];
    if !app.search_input.is_empty() {
        title.push(Span::styled("[Esc] Clear ", palette.muted()));
    }

    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(palette.border(searching));
    frame.render_widget(Paragraph::new(Line::from(content)).block(block), area);
}

fn render_results(
    frame: &mut Frame,
    app: &App,
    page: &CharactersPage,
    is_fetching: bool,
    area: Rect,
    palette: &Palette,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let items: Vec<ListItem> = page
        .results
        .iter()
        .enumerate()
        .map(|(i, character)| {
            let style = if i == app.selection {
                palette.selected()
            } else {
                palette.text()
            };
            let line = Line::from(vec![
                Span::styled("● ", palette.status(&character.status)),
                Span::styled(format!("{:<28}", truncate_string(&character.name, 28)), style),
                Span::styled(
                    format!(" {:>3} eps", character.episode_count()),
                    palette.muted(),
                ),
            ]);
            ListItem::new(line).style(style)
        })
        .collect();

    let updating = if is_fetching { " (updating)" } else { "" };
    let block = Block::default()
        .title(format!(" Characters{} ", updating))
        .title_style(palette.title())
        .borders(Borders::ALL)
        .border_style(palette.border(true));
    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.selection));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    match page.results.get(app.selection) {
        Some(character) => render_card(frame, character, chunks[1], palette),
        None => frame.render_widget(Block::default().borders(Borders::ALL), chunks[1]),
    }
}

/// Summary card for the selected character.
fn render_card(frame: &mut Frame, character: &Character, area: Rect, palette: &Palette) {
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), palette.muted()),
            Span::styled(value, palette.text()),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(character.name.clone(), palette.title())),
        Line::from(vec![
            Span::styled("● ", palette.status(&character.status)),
            Span::styled(character.status.to_string(), palette.text()),
        ]),
        Line::from(""),
        field("Species", character.species.clone()),
        field("Type", or_unknown(&character.kind).to_string()),
        field("Gender", character.gender.to_string()),
        field("Episodes", character.episode_count().to_string()),
        Line::from(""),
        Line::from(Span::styled("[Enter] Details", palette.help_key())),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_pagination(frame: &mut Frame, app: &App, page: &CharactersPage, area: Rect, palette: &Palette) {
    let controls = PageControls::new(app.browser.page(), &page.info);
    if !controls.is_visible() {
        return;
    }

    let nav = |enabled: bool, label: &'static str| {
        if enabled {
            Span::styled(label, palette.help_key())
        } else {
            Span::styled(label, palette.muted())
        }
    };
    let line = Line::from(vec![
        nav(controls.has_prev, "[←] Previous"),
        Span::raw("   "),
        Span::styled(controls.label(), palette.title()),
        Span::raw("   "),
        nav(controls.has_next, "Next [→]"),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}
