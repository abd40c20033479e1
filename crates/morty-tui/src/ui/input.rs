//! Keyboard input handling for the TUI.
//!
//! This module translates key events into application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState, Page, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::EnteringId => {
            handle_id_input(app, key);
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Keys shared by both pages
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('t') => {
            app.toggle_theme();
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.retry_current();
            return Ok(false);
        }
        KeyCode::Char('g') => {
            app.id_input.clear();
            app.state = AppState::EnteringId;
            return Ok(false);
        }
        _ => {}
    }

    match app.page {
        Page::Characters => handle_characters_input(app, key),
        Page::Details(_) => handle_details_input(app, key),
    }
    Ok(false)
}

fn handle_characters_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => app.state = AppState::Searching,
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Left | KeyCode::Char('h') => app.prev_page(),
        KeyCode::Right | KeyCode::Char('l') => app.next_page(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Esc => {
            if !app.search_input.is_empty() {
                app.clear_search();
            }
        }
        _ => {}
    }
}

fn handle_details_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => app.back_to_list(),
        KeyCode::Up | KeyCode::Char('k') => {
            app.episode_scroll = app.episode_scroll.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.episode_scroll = app.episode_scroll.saturating_add(1);
        }
        KeyCode::PageUp => {
            app.episode_scroll = app.episode_scroll.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            app.episode_scroll = app.episode_scroll.saturating_add(PAGE_SCROLL_SIZE);
        }
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.commit_search();
            app.state = AppState::Normal;
        }
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_search(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

fn handle_id_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.open_entered_id();
        }
        KeyCode::Esc => {
            app.id_input.clear();
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.id_input.pop();
        }
        KeyCode::Char(c) => app.push_id_char(c),
        _ => {}
    }
}
