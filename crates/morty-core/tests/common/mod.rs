//! In-process stand-in for the Rick and Morty API.
//!
//! Serves a fixed data set of 60 characters (odd ids are alive Ricks, even
//! ids are dead Mortys) and 12 episodes, with the API's page size of 20.
//! Every request's path and query is recorded so tests can count network
//! calls per route.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use morty_core::{ApiClient, QueryClient};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const CHARACTER_COUNT: i64 = 60;
pub const EPISODE_COUNT: i64 = 12;
const PAGE_SIZE: usize = 20;

/// Character id that always answers 500.
pub const BROKEN_CHARACTER_ID: i64 = 500;

#[derive(Clone, Default)]
struct Hits(Arc<Mutex<Vec<String>>>);

impl Hits {
    fn record(&self, uri: &Uri) {
        let entry = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        self.0.lock().expect("hits lock").push(entry);
    }
}

pub struct MockApi {
    pub base_url: String,
    hits: Hits,
}

impl MockApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock api");
        let addr = listener.local_addr().expect("local addr");
        let hits = Hits::default();

        let router = Router::new()
            .route("/api/character", get(list_characters))
            .route("/api/character/{id}", get(get_character))
            .route("/api/episode/{ids}", get(get_episodes))
            .fallback(unknown_route)
            .with_state(hits.clone());
        tokio::spawn(async move { axum::serve(listener, router).await });

        Self {
            base_url: format!("http://{}/api", addr),
            hits,
        }
    }

    pub fn api_client(&self) -> ApiClient {
        ApiClient::with_base_url(&self.base_url, Duration::from_secs(5)).expect("client should build")
    }

    pub fn query_client(&self) -> QueryClient {
        QueryClient::new(self.api_client())
    }

    /// Every recorded request as `path?query`.
    pub fn hits(&self) -> Vec<String> {
        self.hits.0.lock().expect("hits lock").clone()
    }

    /// Requests whose path and query start with `prefix`.
    pub fn hits_for(&self, prefix: &str) -> usize {
        self.hits().iter().filter(|h| h.starts_with(prefix)).count()
    }

    pub fn total_hits(&self) -> usize {
        self.hits().len()
    }
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

/// Unrouted paths answer a bare 404, like any web server would.
async fn unknown_route(State(hits): State<Hits>, uri: Uri) -> StatusCode {
    hits.record(&uri);
    StatusCode::NOT_FOUND
}

fn character_json(id: i64) -> Value {
    let (name, status, gender) = if id % 2 == 1 {
        (format!("Rick #{}", id), "Alive", "Male")
    } else {
        (format!("Morty #{}", id), "Dead", "Male")
    };
    let first_episode = (id - 1) % EPISODE_COUNT + 1;
    let second_episode = id % EPISODE_COUNT + 1;
    json!({
        "id": id,
        "name": name,
        "status": status,
        "species": "Human",
        "type": "",
        "gender": gender,
        "origin": { "name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1" },
        "location": { "name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3" },
        "image": format!("https://rickandmortyapi.com/api/character/avatar/{}.jpeg", id),
        "episode": [
            format!("https://rickandmortyapi.com/api/episode/{}", first_episode),
            format!("https://rickandmortyapi.com/api/episode/{}", second_episode),
        ],
        "url": format!("https://rickandmortyapi.com/api/character/{}", id),
        "created": "2017-11-04T18:48:46.250Z"
    })
}

fn episode_json(id: i64) -> Value {
    let season = (id - 1) / 10 + 1;
    let number = (id - 1) % 10 + 1;
    json!({
        "id": id,
        "name": format!("Episode {}", id),
        "air_date": "December 2, 2013",
        "episode": format!("S{:02}E{:02}", season, number),
        "characters": ["https://rickandmortyapi.com/api/character/1"],
        "url": format!("https://rickandmortyapi.com/api/episode/{}", id),
        "created": "2017-11-10T12:56:33.798Z"
    })
}

async fn list_characters(
    State(hits): State<Hits>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.record(&uri);

    let name = params.get("name").map(|n| n.to_lowercase());
    let matching: Vec<Value> = (1..=CHARACTER_COUNT)
        .map(character_json)
        .filter(|c| match &name {
            Some(name) => c["name"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(name.as_str())),
            None => true,
        })
        .filter(|c| match params.get("status") {
            Some(status) => c["status"]
                .as_str()
                .is_some_and(|s| s.eq_ignore_ascii_case(status)),
            None => true,
        })
        .collect();

    let pages = matching.len().div_ceil(PAGE_SIZE);
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    if matching.is_empty() || page == 0 || page > pages {
        return not_found("There is nothing here");
    }

    let results: Vec<Value> = matching
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();
    let link = |p: usize| format!("https://rickandmortyapi.com/api/character?page={}", p);
    Json(json!({
        "info": {
            "count": matching.len(),
            "pages": pages,
            "next": (page < pages).then(|| link(page + 1)),
            "prev": (page > 1).then(|| link(page - 1)),
        },
        "results": results,
    }))
    .into_response()
}

async fn get_character(State(hits): State<Hits>, uri: Uri, Path(id): Path<i64>) -> Response {
    hits.record(&uri);
    if id == BROKEN_CHARACTER_ID {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "portal gun misfired" })))
            .into_response();
    }
    if !(1..=CHARACTER_COUNT).contains(&id) {
        return not_found("Character not found");
    }
    Json(character_json(id)).into_response()
}

async fn get_episodes(State(hits): State<Hits>, uri: Uri, Path(ids): Path<String>) -> Response {
    hits.record(&uri);
    let parsed: Result<Vec<i64>, _> = ids.split(',').map(str::parse::<i64>).collect();
    let Ok(parsed) = parsed else {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Hey! you must provide an id" })))
            .into_response();
    };
    let episodes: Vec<Value> = parsed
        .iter()
        .copied()
        .filter(|id| (1..=EPISODE_COUNT).contains(id))
        .map(episode_json)
        .collect();

    // A single id answers with an object, like the real API.
    if !ids.contains(',') {
        return match episodes.into_iter().next() {
            Some(episode) => Json(episode).into_response(),
            None => not_found("Episode not found"),
        };
    }
    Json(Value::Array(episodes)).into_response()
}
