//! End-to-end behavior of `QueryClient` against the mock API.

mod common;

use std::time::Duration;

use common::{MockApi, BROKEN_CHARACTER_ID};
use futures::future::join_all;
use morty_core::models::StatusFilter;
use morty_core::query::{QueryPolicies, QueryPolicy};
use morty_core::{
    ApiClient, ApiError, CharacterBrowser, CharacterFilters, PageControls, QueryClient, QueryKey, QueryStatus,
};

// ============================================================================
// Episode batching
// ============================================================================

#[tokio::test]
async fn test_empty_episode_batch_makes_no_request() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let episodes = client.episodes(&[]).await.expect("empty batch");
    assert!(episodes.is_empty());
    assert_eq!(api.total_hits(), 0);
}

#[tokio::test]
async fn test_single_episode_uses_single_resource_endpoint() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let episodes = client.episodes(&[3]).await.expect("single episode");
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].id, 3);
    assert_eq!(api.hits(), vec!["/api/episode/3".to_string()]);
}

#[tokio::test]
async fn test_episode_batch_is_one_request() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let episodes = client.episodes(&[1, 2, 3]).await.expect("batch");
    let ids: Vec<i64> = episodes.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(api.hits(), vec!["/api/episode/1,2,3".to_string()]);

    // Same ids again: served from the cache.
    client.episodes(&[1, 2, 3]).await.expect("cached batch");
    assert_eq!(api.total_hits(), 1);
}

#[tokio::test]
async fn test_episode_batch_with_unknown_id_fails() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let err = client.episodes(&[1, 99]).await.expect_err("episode 99 does not exist");
    assert_eq!(err, ApiError::NotFound("Episodes not found: [99]".to_string()));
    // Missing episodes are not retried.
    assert_eq!(api.hits_for("/api/episode/1,99"), 1);
}

#[tokio::test]
async fn test_character_episodes_batches_episode_urls() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let rick = client.character(1).await.expect("character");
    let episodes = client.character_episodes(&rick).await.expect("episodes");
    assert_eq!(episodes.len(), 2);
    assert_eq!(api.hits_for("/api/episode/1,2"), 1);
}

// ============================================================================
// De-duplication and cross-entry lookup
// ============================================================================

#[tokio::test]
async fn test_concurrent_requests_for_one_character_share_a_call() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let results = join_all((0..5).map(|_| client.character(7))).await;
    for result in results {
        assert_eq!(result.expect("character").name, "Rick #7");
    }
    assert_eq!(api.hits_for("/api/character/7"), 1);
}

#[tokio::test]
async fn test_character_from_list_page_needs_no_detail_request() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let page = client
        .characters(&CharacterFilters::new().with_page(1))
        .await
        .expect("list page");
    let target = page.results[4].id;

    assert!(client.cached_character(target).is_some());
    let character = client.character(target).await.expect("character");
    assert_eq!(character.id, target);
    assert_eq!(api.hits_for(&format!("/api/character/{}", target)), 0);
    assert!(matches!(
        client.character_status(target),
        QueryStatus::Success { is_stale: false, .. }
    ));
}

#[tokio::test]
async fn test_prefetch_warms_detail_entry() {
    let api = MockApi::start().await;
    let client = api.query_client();

    client.prefetch_character(9);
    client.prefetch_character(9);
    let character = client.character(9).await.expect("character");
    assert_eq!(character.id, 9);
    assert_eq!(api.hits_for("/api/character/9"), 1);
}

#[tokio::test]
async fn test_selecting_listed_character_prefetches_without_request() {
    let api = MockApi::start().await;
    let client = api.query_client();

    client
        .characters(&CharacterFilters::new().with_page(1))
        .await
        .expect("list page");
    client.prefetch_character(4);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let character = client.character(4).await.expect("character");
    assert_eq!(character.id, 4);
    assert_eq!(api.hits_for("/api/character/"), 0);
}

// ============================================================================
// Search and pagination
// ============================================================================

#[tokio::test]
async fn test_rick_search_pagination() {
    let api = MockApi::start().await;
    let client = api.query_client();
    let mut browser = CharacterBrowser::new();
    browser.set_search("rick");

    let first_filters = browser.filters();
    let first = client.characters(&first_filters).await.expect("page 1");
    assert_eq!(first.info.pages, 2);
    assert!(first.results.iter().all(|c| c.name.starts_with("Rick")));

    let controls = PageControls::new(browser.page(), &first.info);
    assert!(controls.is_visible());
    assert!(controls.has_next);
    assert!(!controls.has_prev);

    assert!(browser.set_page(2));
    let second_filters = browser.filters();
    assert_ne!(QueryKey::characters(&first_filters), QueryKey::characters(&second_filters));

    let second = client.characters(&second_filters).await.expect("page 2");
    assert_eq!(api.hits_for("/api/character?"), 2);
    assert!(second.info.has_prev());
    assert!(!second.info.has_next());

    // Going back to page 1 is a fresh cache hit.
    browser.set_page(1);
    client.characters(&browser.filters()).await.expect("page 1 again");
    assert_eq!(api.hits_for("/api/character?"), 2);
}

#[tokio::test]
async fn test_filters_are_forwarded_as_query_parameters() {
    let api = MockApi::start().await;
    let client = api.query_client();
    let filters = CharacterFilters::new()
        .with_name("rick")
        .with_status(Some(StatusFilter::Alive))
        .with_page(1);

    let page = client.characters(&filters).await.expect("filtered page");
    assert!(!page.results.is_empty());
    assert_eq!(api.hits(), vec!["/api/character?name=rick&status=alive&page=1".to_string()]);
}

#[tokio::test]
async fn test_search_without_matches_is_an_empty_page() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let page = client
        .characters(&CharacterFilters::new().with_name("birdperson"))
        .await
        .expect("empty page");
    assert!(page.results.is_empty());
    assert_eq!(page.info.pages, 0);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_wrong_base_path_is_an_error_not_an_empty_page() {
    let api = MockApi::start().await;
    let misconfigured = ApiClient::with_base_url(&format!("{}/wrong", api.base_url), Duration::from_secs(5))
        .expect("client should build");

    let err = misconfigured
        .list_characters(&CharacterFilters::new())
        .await
        .expect_err("unknown route");
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(api.hits_for("/api/wrong/character"), 1);
}

#[tokio::test]
async fn test_unknown_character_is_not_found_without_retries() {
    let api = MockApi::start().await;
    let client = api.query_client();

    let err = client.character(9999).await.expect_err("unknown id");
    assert_eq!(err, ApiError::NotFound("Character not found".to_string()));
    assert_eq!(api.hits_for("/api/character/9999"), 1);

    // The error is cached: a re-render does not hit the network.
    client.character(9999).await.expect_err("cached error");
    assert_eq!(api.hits_for("/api/character/9999"), 1);
}

#[tokio::test]
async fn test_server_errors_are_retried_then_surfaced() {
    let api = MockApi::start().await;
    let policies = QueryPolicies {
        character: QueryPolicy::character().with_retry_budget(1),
        ..QueryPolicies::default()
    };
    let client = QueryClient::with_policies(api.api_client(), policies);
    let path = format!("/api/character/{}", BROKEN_CHARACTER_ID);

    let err = client.character(BROKEN_CHARACTER_ID).await.expect_err("server error");
    assert_eq!(
        err,
        ApiError::Server {
            status: 500,
            message: "portal gun misfired".to_string()
        }
    );
    assert_eq!(api.hits_for(&path), 2);

    client
        .retry_character(BROKEN_CHARACTER_ID)
        .await
        .expect_err("still failing");
    assert_eq!(api.hits_for(&path), 4);
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let unreachable = morty_core::ApiClient::with_base_url("http://127.0.0.1:9/api", Duration::from_secs(1))
        .expect("client should build");
    let policies = QueryPolicies {
        character_list: QueryPolicy::character_list().with_retry_budget(0),
        ..QueryPolicies::default()
    };
    let client = QueryClient::with_policies(unreachable, policies);

    let err = client
        .characters(&CharacterFilters::new())
        .await
        .expect_err("unreachable");
    assert_eq!(err.class().as_str(), "network-error");
}
