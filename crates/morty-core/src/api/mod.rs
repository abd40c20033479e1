//! REST API client module for the Rick and Morty API.
//!
//! This module provides the `ApiClient` for communicating with
//! `https://rickandmortyapi.com/api` and the typed resource accessors built on
//! top of it (character lists, single characters, episode batches).
//!
//! The API is public and read-only; no authentication is involved.

pub mod client;
pub mod error;
pub mod resources;

pub use client::{ApiClient, DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, ErrorClass};
pub use resources::extract_episode_ids;
