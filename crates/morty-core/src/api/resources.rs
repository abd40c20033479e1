//! Typed accessors for the character and episode endpoints.

use std::collections::BTreeSet;

use tracing::debug;

use super::{ApiClient, ApiError};
use crate::models::{Character, CharacterFilters, CharactersPage, Episode};

/// Body message of the 404 the API sends for a search without matches.
const NO_RESULTS_MESSAGE: &str = "There is nothing here";

impl ApiClient {
    /// `GET /character` with the given filters as query parameters.
    ///
    /// The API answers a search without matches with a 404 carrying
    /// "There is nothing here"; that one is reported as an empty page. Any
    /// other 404 (a wrong base URL, for one) stays an error.
    pub async fn list_characters(&self, filters: &CharacterFilters) -> Result<CharactersPage, ApiError> {
        match self.get("character", &filters.query_params()).await {
            Err(ApiError::NotFound(message)) if message == NO_RESULTS_MESSAGE => {
                debug!(?filters, "No characters match");
                Ok(CharactersPage::default())
            }
            result => result,
        }
    }

    /// `GET /character/{id}`. Unknown ids fail with [`ApiError::NotFound`].
    pub async fn get_character(&self, id: i64) -> Result<Character, ApiError> {
        self.get(&format!("character/{}", id), &[]).await
    }

    /// Fetch several episodes with at most one request.
    ///
    /// No ids means no request. A single id uses the single-resource endpoint
    /// (which returns an object, not a list); more ids are joined into one
    /// comma-separated batch request. The batch must hold exactly the
    /// requested ids: missing ones fail with [`ApiError::NotFound`], extra
    /// ones with [`ApiError::InvalidResponse`].
    pub async fn get_episodes_by_ids(&self, ids: &[i64]) -> Result<Vec<Episode>, ApiError> {
        let episodes = match ids {
            [] => return Ok(Vec::new()),
            [id] => {
                let episode: Episode = self.get(&format!("episode/{}", id), &[]).await?;
                vec![episode]
            }
            _ => {
                let joined = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                self.get(&format!("episode/{}", joined), &[]).await?
            }
        };
        debug!(requested = ids.len(), received = episodes.len(), "Episode batch fetched");
        check_episode_batch(ids, episodes)
    }
}

fn check_episode_batch(ids: &[i64], episodes: Vec<Episode>) -> Result<Vec<Episode>, ApiError> {
    let requested: BTreeSet<i64> = ids.iter().copied().collect();
    let received: BTreeSet<i64> = episodes.iter().map(|e| e.id).collect();

    let missing: Vec<i64> = requested.difference(&received).copied().collect();
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!("Episodes not found: {:?}", missing)));
    }
    let unexpected: Vec<i64> = received.difference(&requested).copied().collect();
    if !unexpected.is_empty() {
        return Err(ApiError::InvalidResponse(format!(
            "Unexpected episodes in batch: {:?}",
            unexpected
        )));
    }
    Ok(episodes)
}

/// Parse the trailing numeric path segment of each episode URL.
///
/// A single malformed URL fails the whole batch: a partial episode list would
/// silently misrepresent the character.
pub fn extract_episode_ids<S: AsRef<str>>(urls: &[S]) -> Result<Vec<i64>, ApiError> {
    urls.iter()
        .map(|url| {
            let url = url.as_ref();
            url.trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|segment| segment.parse::<i64>().ok())
                .ok_or_else(|| ApiError::InvalidEpisodeUrl(url.to_string()))
        })
        .collect()
}
