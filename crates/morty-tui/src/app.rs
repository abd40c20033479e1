//! Application state management for Morty.
//!
//! This module contains the `App` struct that owns the query client, the UI
//! store and the page state, and coordinates the background fetch tasks whose
//! results come back over an mpsc channel.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use morty_core::api::extract_episode_ids;
use morty_core::query::{QueryPolicies, QueryResult, Subscription};
use morty_core::{
    ApiClient, ApiError, Character, CharacterBrowser, CharacterFilters, CharactersPage,
    ColorSchemePreference, Config, Debouncer, Episode, FileThemeStorage, MemoryThemeStorage,
    QueryClient, QueryKey, Theme, UiStore,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background fetch result channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Interval between query cache garbage collection passes.
const GC_INTERVAL_SECS: u64 = 60;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Longest id accepted by the go-to-character prompt.
const MAX_ID_INPUT_LENGTH: usize = 6;

// ============================================================================
// UI State Types
// ============================================================================

/// The two routes of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Characters,
    /// Detail page for a character id. Ids below 1 render as invalid.
    Details(i64),
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    EnteringId,
    ShowingHelp,
    Quitting,
}

/// Episode ids of the character on the detail page, once it is known.
#[derive(Debug, Clone, PartialEq)]
pub enum EpisodeIds {
    Pending,
    Ready(Vec<i64>),
    Invalid(ApiError),
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from fetch tasks back to the main loop, tagged with what was
/// requested so results for a view the user already left can be dropped.
enum FetchResult {
    Characters(CharacterFilters, QueryResult<CharactersPage>),
    Character(i64, QueryResult<Character>),
    Episodes(i64, QueryResult<Vec<Episode>>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub queries: QueryClient,
    pub store: UiStore,
    pub theme: watch::Receiver<Theme>,

    // UI State
    pub state: AppState,
    pub page: Page,
    pub browser: CharacterBrowser,
    /// Text in the search box; reaches the store after the debounce gap.
    pub search_input: String,
    pub id_input: String,
    pub selection: usize,
    pub episode_scroll: usize,
    pub episode_ids: EpisodeIds,

    // Query subscriptions for the visible page and its episode list
    page_subscription: Option<Subscription>,
    episodes_subscription: Option<Subscription>,

    // Background task channels
    fetch_tx: mpsc::Sender<FetchResult>,
    fetch_rx: mpsc::Receiver<FetchResult>,
    search_debouncer: Debouncer<String>,
    search_rx: mpsc::UnboundedReceiver<String>,
    gc_task: JoinHandle<()>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create the application from the user's config and storage.
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        }
        .with_env_overrides();
        debug!(base_url = config.base_url(), "Config loaded");

        let api = ApiClient::with_base_url(config.base_url(), config.request_timeout())?;
        let policies = QueryPolicies::default().with_refetch_on_focus(config.refetch_on_focus);
        let queries = QueryClient::with_policies(api, policies);

        let preference = ColorSchemePreference::detect();
        let store = match FileThemeStorage::default_location() {
            Ok(storage) => UiStore::new(Box::new(storage), preference),
            Err(e) => {
                warn!(error = %e, "No config directory, theme will not persist");
                UiStore::new(Box::new(MemoryThemeStorage::default()), preference)
            }
        };

        Ok(Self::with_parts(config, queries, store))
    }

    /// Assemble an app from already-built services.
    pub fn with_parts(config: Config, queries: QueryClient, store: UiStore) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (search_debouncer, search_rx) = Debouncer::new(config.search_debounce());
        let gc_task = queries.spawn_garbage_collector(Duration::from_secs(GC_INTERVAL_SECS));
        let theme = store.subscribe_theme();
        let search_input = store.search_term().to_string();

        let mut browser = CharacterBrowser::new();
        browser.set_search(store.search_term());

        Self {
            config,
            queries,
            store,
            theme,
            state: AppState::Normal,
            page: Page::Characters,
            browser,
            search_input,
            id_input: String::new(),
            selection: 0,
            episode_scroll: 0,
            episode_ids: EpisodeIds::Pending,
            page_subscription: None,
            episodes_subscription: None,
            fetch_tx,
            fetch_rx,
            search_debouncer,
            search_rx,
            gc_task,
            status_message: None,
        }
    }

    pub fn current_theme(&self) -> Theme {
        *self.theme.borrow()
    }

    // ========================================================================
    // Characters page
    // ========================================================================

    /// Load the list page selected by the current search and page.
    pub fn load_characters(&mut self) {
        let filters = self.browser.filters();
        self.page_subscription = Some(self.queries.subscribe(&QueryKey::characters(&filters)));
        self.episodes_subscription = None;

        let queries = self.queries.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = queries.characters(&filters).await;
            Self::send_result(&tx, FetchResult::Characters(filters, result)).await;
        });
    }

    pub fn retry_characters(&mut self) {
        let filters = self.browser.filters();
        let queries = self.queries.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = queries.retry_characters(&filters).await;
            Self::send_result(&tx, FetchResult::Characters(filters, result)).await;
        });
    }

    /// The visible list page, if it has loaded.
    pub fn current_list(&self) -> Option<std::sync::Arc<CharactersPage>> {
        self.queries
            .characters_status(&self.browser.filters())
            .data()
            .cloned()
    }

    pub fn selected_character_id(&self) -> Option<i64> {
        self.current_list()
            .and_then(|page| page.results.get(self.selection).map(|c| c.id))
    }

    /// Move the list selection and warm the cache for the character under it.
    pub fn move_selection(&mut self, delta: isize) {
        let Some(page) = self.current_list() else {
            return;
        };
        if page.results.is_empty() {
            return;
        }
        let last = page.results.len() - 1;
        let next = if delta.is_negative() {
            self.selection.saturating_sub(delta.unsigned_abs())
        } else {
            self.selection.saturating_add(delta.unsigned_abs()).min(last)
        };
        if next != self.selection {
            self.selection = next;
            if let Some(id) = self.selected_character_id() {
                self.queries.prefetch_character(id);
            }
        }
    }

    pub fn next_page(&mut self) {
        let Some(page) = self.current_list() else {
            return;
        };
        if self.browser.next_page(&page.info) {
            self.selection = 0;
            self.load_characters();
        }
    }

    pub fn prev_page(&mut self) {
        let Some(page) = self.current_list() else {
            return;
        };
        if self.browser.prev_page(&page.info) {
            self.selection = 0;
            self.load_characters();
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
        self.search_debouncer.schedule(self.search_input.clone());
    }

    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
        self.search_debouncer.schedule(self.search_input.clone());
    }

    /// Apply the search box immediately, skipping the debounce gap.
    pub fn commit_search(&mut self) {
        self.search_debouncer.cancel();
        let term = self.search_input.clone();
        self.apply_search(&term);
    }

    pub fn clear_search(&mut self) {
        self.search_debouncer.cancel();
        self.search_input.clear();
        self.store.clear_search();
        self.apply_search("");
    }

    /// A settled search term: store it and reload from page 1 when the
    /// filters changed.
    fn apply_search(&mut self, term: &str) {
        self.store.set_search_term(term);
        if self.browser.set_search(term) {
            debug!(term, "Search changed");
            self.selection = 0;
            self.load_characters();
        }
    }

    // ========================================================================
    // Details page
    // ========================================================================

    pub fn open_selected(&mut self) {
        if let Some(id) = self.selected_character_id() {
            self.open_character(id);
        }
    }

    /// Route to the detail page of `id` and start loading it.
    pub fn open_character(&mut self, id: i64) {
        self.page = Page::Details(id);
        self.episode_scroll = 0;
        self.episode_ids = EpisodeIds::Pending;
        self.page_subscription = None;
        self.episodes_subscription = None;
        if id <= 0 {
            return;
        }
        self.page_subscription = Some(self.queries.subscribe(&QueryKey::character(id)));

        let queries = self.queries.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = queries.character(id).await;
            Self::send_result(&tx, FetchResult::Character(id, result)).await;
        });
    }

    /// Parse the go-to prompt and open that character. Anything that is not
    /// a positive number lands on the invalid-id page.
    pub fn open_entered_id(&mut self) {
        let id = self.id_input.trim().parse::<i64>().unwrap_or(0);
        self.id_input.clear();
        self.open_character(id);
    }

    pub fn push_id_char(&mut self, c: char) {
        if c.is_ascii_digit() && self.id_input.len() < MAX_ID_INPUT_LENGTH {
            self.id_input.push(c);
        }
    }

    pub fn retry_character(&mut self, id: i64) {
        let queries = self.queries.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = queries.retry_character(id).await;
            Self::send_result(&tx, FetchResult::Character(id, result)).await;
        });
    }

    fn load_episodes(&mut self, character_id: i64, ids: Vec<i64>, retry: bool) {
        self.episodes_subscription = Some(self.queries.subscribe(&QueryKey::episodes(&ids)));

        let queries = self.queries.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = if retry {
                queries.retry_episodes(&ids).await
            } else {
                queries.episodes(&ids).await
            };
            Self::send_result(&tx, FetchResult::Episodes(character_id, result)).await;
        });
    }

    pub fn back_to_list(&mut self) {
        self.page = Page::Characters;
        self.load_characters();
    }

    /// `r` on the current page: retry whatever failed.
    pub fn retry_current(&mut self) {
        match self.page {
            Page::Characters => {
                if self
                    .queries
                    .characters_status(&self.browser.filters())
                    .error()
                    .is_some()
                {
                    self.retry_characters();
                }
            }
            Page::Details(id) if id > 0 => {
                if self.queries.character_status(id).error().is_some() {
                    self.retry_character(id);
                } else if let EpisodeIds::Ready(ids) = self.episode_ids.clone() {
                    if self.queries.episodes_status(&ids).error().is_some() {
                        self.load_episodes(id, ids, true);
                    }
                }
            }
            Page::Details(_) => {}
        }
    }

    // ========================================================================
    // Theme and focus
    // ========================================================================

    pub fn toggle_theme(&mut self) {
        let theme = self.store.toggle_theme();
        info!(?theme, "Theme toggled");
    }

    /// Terminal focus came back: refresh stale data the visible page uses.
    pub fn focus_regained(&mut self) {
        let started = self.queries.focus_regained();
        if started > 0 {
            debug!(started, "Refetching on focus");
        }
    }

    // ========================================================================
    // Background results
    // ========================================================================

    async fn send_result(tx: &mpsc::Sender<FetchResult>, result: FetchResult) {
        if tx.send(result).await.is_err() {
            debug!("Fetch result dropped, app is shutting down");
        }
    }

    /// Drain settled search terms and completed fetches.
    pub fn check_background_tasks(&mut self) {
        let mut last_term = None;
        while let Ok(term) = self.search_rx.try_recv() {
            last_term = Some(term);
        }
        if let Some(term) = last_term {
            self.apply_search(&term);
        }

        let mut results = Vec::new();
        while let Ok(result) = self.fetch_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_fetch_result(result);
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Characters(filters, result) => {
                if self.page != Page::Characters || filters != self.browser.filters() {
                    debug!(?filters, "Dropping result for a list no longer shown");
                    return;
                }
                match result {
                    Ok(page) => {
                        let len = page.results.len();
                        self.selection = self.selection.min(len.saturating_sub(1));
                        self.status_message = None;
                        if let Some(id) = self.selected_character_id() {
                            self.queries.prefetch_character(id);
                        }
                    }
                    Err(e) => {
                        self.status_message = Some(format!("Failed to load characters: {}", e));
                    }
                }
            }
            FetchResult::Character(id, result) => {
                if self.page != Page::Details(id) {
                    debug!(id, "Dropping result for a character no longer shown");
                    return;
                }
                match result {
                    Ok(character) => {
                        self.status_message = None;
                        match extract_episode_ids(&character.episode) {
                            Ok(ids) => {
                                self.episode_ids = EpisodeIds::Ready(ids.clone());
                                self.load_episodes(id, ids, false);
                            }
                            Err(e) => {
                                warn!(id, error = %e, "Character has malformed episode URLs");
                                self.episode_ids = EpisodeIds::Invalid(e);
                            }
                        }
                    }
                    Err(e) => {
                        self.status_message = Some(format!("Failed to load character: {}", e));
                    }
                }
            }
            FetchResult::Episodes(id, result) => {
                if self.page != Page::Details(id) {
                    return;
                }
                if let Err(e) = result {
                    self.status_message = Some(format!("Failed to load episodes: {}", e));
                }
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.gc_task.abort();
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use morty_core::query::QueryPolicy;

    use super::*;

    /// App wired to an unreachable API with in-memory storage.
    pub fn test_app() -> App {
        let api = ApiClient::with_base_url("http://127.0.0.1:9/api", Duration::from_secs(1))
            .expect("client should build");
        let policies = QueryPolicies {
            character_list: QueryPolicy::character_list().with_retry_budget(0),
            character: QueryPolicy::character().with_retry_budget(0),
            episodes: QueryPolicy::episodes().with_retry_budget(0),
        };
        let store = UiStore::new(
            Box::new(MemoryThemeStorage::default()),
            ColorSchemePreference::Dark,
        );
        App::with_parts(
            Config::default(),
            QueryClient::with_policies(api, policies),
            store,
        )
    }
}
