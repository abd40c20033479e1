//! `QueryClient`: the three resource caches behind one handle.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::cache::{QueryCache, QueryResult, QueryStatus, Subscription};
use super::key::QueryKey;
use super::policy::QueryPolicies;
use crate::api::{extract_episode_ids, ApiClient, ApiError};
use crate::models::{Character, CharacterFilters, CharactersPage, Episode};

/// Composition root for data fetching. Cloning shares the caches.
#[derive(Clone)]
pub struct QueryClient {
    api: ApiClient,
    lists: QueryCache<CharactersPage>,
    characters: QueryCache<Character>,
    episodes: QueryCache<Vec<Episode>>,
}

impl QueryClient {
    pub fn new(api: ApiClient) -> Self {
        Self::with_policies(api, QueryPolicies::default())
    }

    pub fn with_policies(api: ApiClient, policies: QueryPolicies) -> Self {
        Self {
            api,
            lists: QueryCache::new("characters", policies.character_list),
            characters: QueryCache::new("character", policies.character),
            episodes: QueryCache::new("episodes", policies.episodes),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // ========================================================================
    // Character lists
    // ========================================================================

    pub async fn characters(&self, filters: &CharacterFilters) -> QueryResult<CharactersPage> {
        let key = QueryKey::characters(filters);
        self.lists.fetch(key, self.list_fetcher(filters)).await
    }

    pub async fn retry_characters(&self, filters: &CharacterFilters) -> QueryResult<CharactersPage> {
        let key = QueryKey::characters(filters);
        self.lists.retry(key, self.list_fetcher(filters)).await
    }

    pub fn characters_status(&self, filters: &CharacterFilters) -> QueryStatus<CharactersPage> {
        self.lists.status(&QueryKey::characters(filters))
    }

    /// Store a list page as if it had just been fetched.
    pub fn set_characters(&self, filters: &CharacterFilters, page: CharactersPage) -> Arc<CharactersPage> {
        self.lists.set_data(QueryKey::characters(filters), page)
    }

    fn list_fetcher(
        &self,
        filters: &CharacterFilters,
    ) -> impl Fn() -> BoxFuture<'static, Result<CharactersPage, ApiError>>
           + Send
           + Sync
           + 'static {
        let api = self.api.clone();
        let filters = filters.clone();
        move || {
            let api = api.clone();
            let filters = filters.clone();
            async move { api.list_characters(&filters).await }.boxed()
        }
    }

    // ========================================================================
    // Single character
    // ========================================================================

    /// Fetch one character.
    ///
    /// A fresh detail entry is returned as-is. Otherwise, a character found in
    /// a cached list page seeds the detail entry with no network call, as long
    /// as that page is younger than the detail freshness window. Only then is
    /// `GET /character/{id}` issued.
    pub async fn character(&self, id: i64) -> QueryResult<Character> {
        validate_id(id)?;
        if !self.has_fresh_character(id) {
            if let Some(seeded) = self.seed_from_lists(id) {
                return Ok(seeded);
            }
        }
        self.characters
            .fetch(QueryKey::character(id), self.character_fetcher(id))
            .await
    }

    /// Look a character up in cached list pages only.
    pub fn cached_character(&self, id: i64) -> Option<Character> {
        self.lists.peek(|page| page.find(id).cloned())
    }

    pub async fn retry_character(&self, id: i64) -> QueryResult<Character> {
        validate_id(id)?;
        self.characters
            .retry(QueryKey::character(id), self.character_fetcher(id))
            .await
    }

    /// Warm the detail entry, e.g. when the list selection moves onto `id`.
    /// Characters already in a fresh list page are seeded from it instead.
    pub fn prefetch_character(&self, id: i64) {
        if id <= 0 || self.has_fresh_character(id) || self.seed_from_lists(id).is_some() {
            return;
        }
        self.characters
            .prefetch(QueryKey::character(id), self.character_fetcher(id));
    }

    fn has_fresh_character(&self, id: i64) -> bool {
        matches!(
            self.characters.status(&QueryKey::character(id)),
            QueryStatus::Success { is_stale: false, .. }
        )
    }

    /// Copy `id` from the newest list page holding it into the detail entry.
    /// The entry keeps the page's fetch time, so it goes stale when the page
    /// data would have.
    fn seed_from_lists(&self, id: i64) -> Option<Arc<Character>> {
        let (found, fetched_at) = self.lists.peek_latest(|page| page.find(id).cloned())?;
        if fetched_at.elapsed() >= self.characters.policy().freshness {
            return None;
        }
        debug!(id, "Seeding character from cached list page");
        Some(
            self.characters
                .set_data_at(QueryKey::character(id), found, fetched_at),
        )
    }

    pub fn character_status(&self, id: i64) -> QueryStatus<Character> {
        self.characters.status(&QueryKey::character(id))
    }

    fn character_fetcher(
        &self,
        id: i64,
    ) -> impl Fn() -> BoxFuture<'static, Result<Character, ApiError>>
           + Send
           + Sync
           + 'static {
        let api = self.api.clone();
        move || {
            let api = api.clone();
            async move { api.get_character(id).await }.boxed()
        }
    }

    // ========================================================================
    // Episodes
    // ========================================================================

    pub async fn episodes(&self, ids: &[i64]) -> QueryResult<Vec<Episode>> {
        let key = QueryKey::episodes(ids);
        self.episodes.fetch(key, self.episodes_fetcher(ids)).await
    }

    /// Episodes a character appears in, in the character's own order.
    pub async fn character_episodes(&self, character: &Character) -> QueryResult<Vec<Episode>> {
        let ids = extract_episode_ids(&character.episode)?;
        self.episodes(&ids).await
    }

    pub async fn retry_episodes(&self, ids: &[i64]) -> QueryResult<Vec<Episode>> {
        let key = QueryKey::episodes(ids);
        self.episodes.retry(key, self.episodes_fetcher(ids)).await
    }

    pub fn episodes_status(&self, ids: &[i64]) -> QueryStatus<Vec<Episode>> {
        self.episodes.status(&QueryKey::episodes(ids))
    }

    fn episodes_fetcher(
        &self,
        ids: &[i64],
    ) -> impl Fn() -> BoxFuture<'static, Result<Vec<Episode>, ApiError>>
           + Send
           + Sync
           + 'static {
        let api = self.api.clone();
        let ids: Arc<[i64]> = ids.into();
        move || {
            let api = api.clone();
            let ids = Arc::clone(&ids);
            async move { api.get_episodes_by_ids(&ids).await }.boxed()
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Register a view as an active consumer of `key`.
    pub fn subscribe(&self, key: &QueryKey) -> Subscription {
        match key {
            QueryKey::Characters(_) => self.lists.subscribe(key),
            QueryKey::Character(_) => self.characters.subscribe(key),
            QueryKey::Episodes(_) => self.episodes.subscribe(key),
        }
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        match key {
            QueryKey::Characters(_) => self.lists.subscriber_count(key),
            QueryKey::Character(_) => self.characters.subscriber_count(key),
            QueryKey::Episodes(_) => self.episodes.subscriber_count(key),
        }
    }

    pub fn invalidate(&self, key: &QueryKey) {
        match key {
            QueryKey::Characters(_) => self.lists.invalidate(key),
            QueryKey::Character(_) => self.characters.invalidate(key),
            QueryKey::Episodes(_) => self.episodes.invalidate(key),
        }
    }

    /// Abort the in-flight request for `key`, if any.
    pub fn cancel(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::Characters(_) => self.lists.cancel(key),
            QueryKey::Character(_) => self.characters.cancel(key),
            QueryKey::Episodes(_) => self.episodes.cancel(key),
        }
    }

    /// The terminal regained focus: refresh stale, subscribed entries of the
    /// caches whose policy opts in. Returns the number of refetches started.
    pub fn focus_regained(&self) -> usize {
        let lists = self.lists.refetch_on_focus(|key| {
            let filters = match key {
                QueryKey::Characters(filters) => filters.clone(),
                _ => CharacterFilters::default(),
            };
            self.list_fetcher(&filters)
        });
        let characters = self.characters.refetch_on_focus(|key| {
            let id = match key {
                QueryKey::Character(id) => *id,
                _ => 0,
            };
            self.character_fetcher(id)
        });
        let episodes = self.episodes.refetch_on_focus(|key| {
            let ids: &[i64] = match key {
                QueryKey::Episodes(ids) => ids,
                _ => &[],
            };
            self.episodes_fetcher(ids)
        });
        lists + characters + episodes
    }

    /// Evict idle entries from every cache.
    pub fn collect_garbage(&self) -> usize {
        self.lists.collect_garbage() + self.characters.collect_garbage() + self.episodes.collect_garbage()
    }

    /// Run [`QueryClient::collect_garbage`] every `interval` until the handle
    /// is aborted.
    pub fn spawn_garbage_collector(&self, interval: Duration) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = client.collect_garbage();
                if evicted > 0 {
                    info!(evicted, "Query cache garbage collection");
                }
            }
        })
    }

    /// Number of entries across all caches.
    pub fn len(&self) -> usize {
        self.lists.len() + self.characters.len() + self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_id(id: i64) -> Result<(), ApiError> {
    if id <= 0 {
        return Err(ApiError::ClientBuild(format!("Invalid character ID: {}", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::character::fixtures::character;
    use crate::models::PageInfo;

    /// Client pointed at a closed port: any network call fails fast.
    fn offline_client() -> QueryClient {
        let api = ApiClient::with_base_url("http://127.0.0.1:9/api", Duration::from_secs(1))
            .expect("client should build");
        let policies = QueryPolicies::default();
        QueryClient::with_policies(
            api,
            QueryPolicies {
                character_list: policies.character_list.with_retry_budget(0),
                character: policies.character.with_retry_budget(0),
                episodes: policies.episodes.with_retry_budget(0),
            },
        )
    }

    fn page_with(ids: &[i64]) -> CharactersPage {
        CharactersPage {
            info: PageInfo {
                count: ids.len() as u32,
                pages: 1,
                next: None,
                prev: None,
            },
            results: ids.iter().map(|&id| character(id, "Rick Sanchez")).collect(),
        }
    }

    #[tokio::test]
    async fn test_character_seeded_from_list_without_network() {
        let client = offline_client();
        let filters = CharacterFilters::new().with_name("rick");
        client
            .lists
            .set_data(QueryKey::characters(&filters), page_with(&[1, 8]));

        let found = client.character(8).await.expect("served from list page");
        assert_eq!(found.id, 8);
        assert!(matches!(
            client.character_status(8),
            QueryStatus::Success { is_stale: false, is_fetching: false, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_character_ages_with_its_list_page() {
        let client = offline_client();
        client
            .lists
            .set_data(QueryKey::characters(&CharacterFilters::new()), page_with(&[5]));
        let freshness = client.characters.policy().freshness;

        tokio::time::advance(freshness - Duration::from_secs(60)).await;
        let found = client.character(5).await.expect("seeded from list page");
        assert_eq!(found.id, 5);
        assert!(matches!(
            client.character_status(5),
            QueryStatus::Success { is_stale: false, .. }
        ));

        // The detail entry expires with the list data it came from.
        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(matches!(
            client.character_status(5),
            QueryStatus::Success { is_stale: true, .. }
        ));
        client
            .character(5)
            .await
            .expect_err("old list data is not reused, the offline refetch fails");
    }

    #[tokio::test]
    async fn test_prefetch_of_listed_character_seeds_without_network() {
        let client = offline_client();
        client
            .lists
            .set_data(QueryKey::characters(&CharacterFilters::new()), page_with(&[4]));

        client.prefetch_character(4);
        assert!(matches!(
            client.character_status(4),
            QueryStatus::Success { is_stale: false, is_fetching: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_cached_character_is_peek_only() {
        let client = offline_client();
        assert!(client.cached_character(1).is_none());
        client
            .lists
            .set_data(QueryKey::characters(&CharacterFilters::new()), page_with(&[1]));
        assert_eq!(client.cached_character(1).map(|c| c.id), Some(1));
        assert!(client.cached_character(2).is_none());
    }

    #[tokio::test]
    async fn test_invalid_character_id_rejected() {
        let client = offline_client();
        let err = client.character(0).await.expect_err("id 0 is invalid");
        assert!(matches!(err, ApiError::ClientBuild(_)));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_character_episodes_rejects_malformed_urls() {
        let client = offline_client();
        let mut rick = character(1, "Rick Sanchez");
        rick.episode = vec!["https://rickandmortyapi.com/api/episode/abc".to_string()];

        let err = client.character_episodes(&rick).await.expect_err("malformed url");
        assert!(matches!(err, ApiError::InvalidEpisodeUrl(_)));
    }

    #[tokio::test]
    async fn test_character_without_episodes_makes_no_request() {
        let client = offline_client();
        let mut rick = character(1, "Rick Sanchez");
        rick.episode.clear();

        let episodes = client.character_episodes(&rick).await.expect("empty batch");
        assert!(episodes.is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_surfaces_as_error_status() {
        let client = offline_client();
        let filters = CharacterFilters::new();
        let err = client.characters(&filters).await.expect_err("offline");
        assert_eq!(err.class().as_str(), "network-error");
        assert!(client.characters_status(&filters).error().is_some());
    }

    #[tokio::test]
    async fn test_subscribe_routes_to_matching_cache() {
        let client = offline_client();
        let key = QueryKey::character(3);
        let subscription = client.subscribe(&key);
        assert_eq!(client.characters.len(), 1);
        assert!(client.lists.is_empty());
        drop(subscription);
    }
}
