//! UI state store: the search term and the dark-mode flag.
//!
//! Only the dark-mode flag outlives the process. It is written through a
//! [`ThemeStorage`] collaborator, so tests and alternative front-ends can
//! inject their own persistence. Theme changes are published on a
//! `tokio::sync::watch` channel for whatever renders the palette.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::Config;

/// File holding the persisted subset of the store
const STORAGE_FILE: &str = "ui-storage.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn from_dark_mode(is_dark_mode: bool) -> Self {
        if is_dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

// ============================================================================
// Ambient preference
// ============================================================================

/// Color-scheme hint from the hosting terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSchemePreference {
    Dark,
    Light,
    Unknown,
}

impl ColorSchemePreference {
    /// Read `COLORFGBG` ("fg;bg" or "fg;default;bg").
    pub fn detect() -> Self {
        Self::from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
    }

    pub fn from_colorfgbg(value: Option<&str>) -> Self {
        let Some(background) = value.and_then(|v| v.rsplit(';').next()) else {
            return ColorSchemePreference::Unknown;
        };
        match background.trim().parse::<u8>() {
            Ok(0..=6 | 8) => ColorSchemePreference::Dark,
            Ok(_) => ColorSchemePreference::Light,
            Err(_) => ColorSchemePreference::Unknown,
        }
    }

    /// Terminals are dark far more often than not.
    pub fn prefers_dark(&self) -> bool {
        !matches!(self, ColorSchemePreference::Light)
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Durable storage for the dark-mode flag.
pub trait ThemeStorage: Send {
    /// Stored flag, or `None` if nothing was saved yet.
    fn load(&self) -> Option<bool>;
    fn save(&self, is_dark_mode: bool) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredUiState {
    is_dark_mode: bool,
}

/// JSON file storage, `<config_dir>/morty/ui-storage.json` by default.
#[derive(Debug, Clone)]
pub struct FileThemeStorage {
    path: PathBuf,
}

impl FileThemeStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::config_dir()?.join(STORAGE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThemeStorage for FileThemeStorage {
    fn load(&self) -> Option<bool> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<StoredUiState>(&contents) {
            Ok(state) => Some(state.is_dark_mode),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Ignoring unreadable UI storage");
                None
            }
        }
    }

    fn save(&self, is_dark_mode: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(&StoredUiState { is_dark_mode })?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// In-memory storage. Clones share the stored value.
#[derive(Debug, Clone, Default)]
pub struct MemoryThemeStorage {
    value: Arc<Mutex<Option<bool>>>,
}

impl MemoryThemeStorage {
    pub fn with_value(is_dark_mode: bool) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(is_dark_mode))),
        }
    }

    pub fn stored(&self) -> Option<bool> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ThemeStorage for MemoryThemeStorage {
    fn load(&self) -> Option<bool> {
        self.stored()
    }

    fn save(&self, is_dark_mode: bool) -> Result<()> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(is_dark_mode);
        Ok(())
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct UiStore {
    search_term: String,
    is_dark_mode: bool,
    storage: Box<dyn ThemeStorage>,
    theme_tx: watch::Sender<Theme>,
}

impl UiStore {
    /// The stored flag wins over the ambient preference.
    pub fn new(storage: Box<dyn ThemeStorage>, preference: ColorSchemePreference) -> Self {
        let is_dark_mode = storage.load().unwrap_or_else(|| preference.prefers_dark());
        let (theme_tx, _) = watch::channel(Theme::from_dark_mode(is_dark_mode));
        Self {
            search_term: String::new(),
            is_dark_mode,
            storage,
            theme_tx,
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn is_dark_mode(&self) -> bool {
        self.is_dark_mode
    }

    pub fn theme(&self) -> Theme {
        Theme::from_dark_mode(self.is_dark_mode)
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.theme().toggled();
        self.set_theme(next);
        next
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.is_dark_mode = theme.is_dark();
        if let Err(e) = self.storage.save(self.is_dark_mode) {
            warn!(error = %e, "Failed to persist theme");
        }
        self.theme_tx.send_replace(theme);
    }

    /// Receiver that always holds the current theme.
    pub fn subscribe_theme(&self) -> watch::Receiver<Theme> {
        self.theme_tx.subscribe()
    }
}

impl std::fmt::Debug for UiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiStore")
            .field("search_term", &self.search_term)
            .field("is_dark_mode", &self.is_dark_mode)
            .finish_non_exhaustive()
    }
}
