//! Client-side query cache.
//!
//! Every remote read goes through a [`QueryClient`], which owns one
//! [`QueryCache`] per resource type. Entries are addressed by [`QueryKey`] and
//! governed by a [`QueryPolicy`]:
//!
//! - fresh data is served without I/O
//! - concurrent reads of one key share a single request
//! - failures are retried with exponential backoff, then cached
//! - idle entries are evicted after the retention window

pub mod cache;
pub mod client;
pub mod key;
pub mod policy;

pub use cache::{retry_delay, QueryCache, QueryResult, QueryStatus, Subscription};
pub use client::QueryClient;
pub use key::{QueryKey, QueryKind};
pub use policy::{QueryPolicies, QueryPolicy};
