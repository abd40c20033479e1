//! Color palettes and text styles.
//!
//! Every style is derived from a [`Palette`], chosen by the store's theme.

use morty_core::models::CharacterStatus;
use morty_core::Theme;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Color,
    pub accent: Color,
    pub error: Color,
    pub muted: Color,
    pub text: Color,
    pub highlight: Color,
    pub status_bar: Color,
    pub background: Color,
}

/// Portal green on near-black.
pub const DARK: Palette = Palette {
    primary: Color::Rgb(151, 206, 76),
    accent: Color::Rgb(240, 200, 80),
    error: Color::Rgb(230, 90, 90),
    muted: Color::Rgb(128, 128, 128),
    text: Color::White,
    highlight: Color::Rgb(48, 56, 48),
    status_bar: Color::Rgb(32, 32, 40),
    background: Color::Reset,
};

pub const LIGHT: Palette = Palette {
    primary: Color::Rgb(60, 130, 30),
    accent: Color::Rgb(170, 110, 0),
    error: Color::Rgb(190, 40, 40),
    muted: Color::Rgb(110, 110, 110),
    text: Color::Black,
    highlight: Color::Rgb(214, 232, 200),
    status_bar: Color::Rgb(225, 225, 230),
    background: Color::Rgb(250, 250, 247),
};

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => DARK,
        Theme::Light => LIGHT,
    }
}

impl Palette {
    /// Page background and default text.
    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.primary).add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.highlight)
            .fg(self.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.primary)
        } else {
            Style::default().fg(self.muted)
        }
    }

    pub fn status_bar(&self) -> Style {
        Style::default().bg(self.status_bar).fg(self.text)
    }

    pub fn help_key(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    /// Dot color for a character's status.
    pub fn status(&self, status: &CharacterStatus) -> Style {
        let color = match status {
            CharacterStatus::Alive => self.primary,
            CharacterStatus::Dead => self.error,
            CharacterStatus::Unknown => self.muted,
        };
        Style::default().fg(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_follows_theme() {
        assert_eq!(palette(Theme::Dark), DARK);
        assert_eq!(palette(Theme::Light), LIGHT);
        assert_ne!(DARK.text, LIGHT.text);
    }

    #[test]
    fn test_status_colors() {
        let p = DARK;
        assert_eq!(p.status(&CharacterStatus::Alive).fg, Some(p.primary));
        assert_eq!(p.status(&CharacterStatus::Dead).fg, Some(p.error));
        assert_eq!(p.status(&CharacterStatus::Unknown).fg, Some(p.muted));
    }
}
