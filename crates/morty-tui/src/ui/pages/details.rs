//! Character details page: info block and episodes grouped by season.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use morty_core::models::group_by_season;
use morty_core::utils::{format_relative, format_timestamp, or_unknown};
use morty_core::{Character, Episode, QueryStatus};

use super::{render_error_block, render_notice};
use crate::app::{App, EpisodeIds};
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, id: i64, area: Rect, palette: &Palette) {
    if id <= 0 {
        render_error_block(frame, area, palette, "Invalid character ID", &[("Esc", "Back")]);
        return;
    }

    match app.queries.character_status(id) {
        QueryStatus::Error { error, stale: None } => {
            render_error_block(
                frame,
                area,
                palette,
                &error.to_string(),
                &[("r", "Try again"), ("Esc", "Back")],
            );
        }
        status => match status.data() {
            Some(character) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(10), Constraint::Min(5)])
                    .split(area);
                render_info(frame, character, chunks[0], palette);
                render_episodes(frame, app, chunks[1], palette);
            }
            None => render_notice(frame, area, palette, "Loading character details...", ""),
        },
    }
}

fn render_info(frame: &mut Frame, character: &Character, area: Rect, palette: &Palette) {
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {:<15}", label), palette.muted()),
            Span::styled(value, palette.text()),
        ])
    };

    let created = format!(
        "{} ({})",
        format_timestamp(&character.created),
        format_relative(&character.created, &Utc::now())
    );
    let lines = vec![
        Line::from(vec![
            Span::raw("  "),
            Span::styled("● ", palette.status(&character.status)),
            Span::styled(character.status_line(), palette.text()),
        ]),
        Line::from(""),
        field("Gender", character.gender.to_string()),
        field("Type", or_unknown(&character.kind).to_string()),
        field("Episodes", character.episode_count().to_string()),
        field("Origin", character.origin.name.clone()),
        field("Last Location", character.location.name.clone()),
        field("Created", created),
    ];

    let block = Block::default()
        .title(format!(" {} ", character.name))
        .title_style(palette.title())
        .borders(Borders::ALL)
        .border_style(palette.border(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_episodes(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let ids = match &app.episode_ids {
        EpisodeIds::Pending => {
            render_notice(frame, area, palette, "Loading episodes...", "");
            return;
        }
        EpisodeIds::Invalid(_) => {
            render_error_block(frame, area, palette, "Failed to load episodes", &[("Esc", "Back")]);
            return;
        }
        EpisodeIds::Ready(ids) => ids,
    };

    match app.queries.episodes_status(ids) {
        QueryStatus::Error { stale: None, .. } => {
            render_error_block(
                frame,
                area,
                palette,
                "Failed to load episodes",
                &[("r", "Try again"), ("Esc", "Back")],
            );
        }
        status => match status.data() {
            Some(episodes) if episodes.is_empty() => {
                render_notice(frame, area, palette, "No episodes found.", "");
            }
            Some(episodes) => {
                let lines = episode_lines(episodes, palette);
                let block = Block::default()
                    .title(format!(" Episodes ({}) ", episodes.len()))
                    .title_style(palette.title())
                    .borders(Borders::ALL)
                    .border_style(palette.border(false));
                let scroll = app.episode_scroll.min(lines.len().saturating_sub(1));
                let paragraph = Paragraph::new(lines)
                    .block(block)
                    .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
                frame.render_widget(paragraph, area);
            }
            None => render_notice(frame, area, palette, "Loading episodes...", ""),
        },
    }
}

/// One header line per season followed by its episodes.
pub fn episode_lines(episodes: &[Episode], palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, season) in group_by_season(episodes).iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            format!("  Season {}", season.label),
            palette.title(),
        )));
        for episode in &season.episodes {
            lines.push(Line::from(vec![
                Span::styled(format!("    {:<8}", episode.episode), palette.accent()),
                Span::styled(episode.name.clone(), palette.text()),
                Span::styled(format!("  {}", episode.air_date), palette.muted()),
            ]));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::styles::DARK;

    fn episode(id: i64, code: &str) -> Episode {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Episode {}", id),
            "air_date": "December 2, 2013",
            "episode": code,
            "characters": [],
            "url": "",
            "created": "2017-11-10T12:56:33.798Z"
        }))
        .expect("valid episode")
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_episode_lines_grouped_by_season() {
        let episodes = vec![episode(12, "S02E01"), episode(2, "S01E02"), episode(1, "S01E01")];
        let lines: Vec<String> = episode_lines(&episodes, &DARK).iter().map(text).collect();

        assert_eq!(lines[0], "  Season 1");
        assert!(lines[1].contains("S01E01"));
        assert!(lines[2].contains("S01E02"));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "  Season 2");
        assert!(lines[5].contains("S02E01"));
    }
}
