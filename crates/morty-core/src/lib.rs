//! Morty core - API client, models, query cache and UI state for the
//! Rick and Morty character explorer.
//!
//! This crate contains everything below the view layer:
//! - `api`: HTTP client and typed resource accessors
//! - `models`: characters, episodes, pagination and filters
//! - `query`: the keyed query cache and its `QueryClient`
//! - `store`: search term and persisted dark-mode flag
//! - `browse`, `debounce`: derived page state and search debouncing
//! - `config`, `utils`: configuration and formatting helpers

pub mod api;
pub mod browse;
pub mod config;
pub mod debounce;
pub mod models;
pub mod query;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError, ErrorClass};
pub use browse::{results_summary, CharacterBrowser, PageControls};
pub use config::Config;
pub use debounce::Debouncer;
pub use models::{Character, CharacterFilters, CharactersPage, Episode, PageInfo};
pub use query::{QueryClient, QueryKey, QueryStatus};
pub use store::{ColorSchemePreference, FileThemeStorage, MemoryThemeStorage, Theme, ThemeStorage, UiStore};
