//! Keyed in-memory query cache.
//!
//! A `QueryCache<V>` maps [`QueryKey`]s to entries holding the last fetched
//! value, the last error, the in-flight request (if any) and a subscriber
//! count. Fetches run as spawned tasks shared between every caller waiting on
//! the same key, so a caller that stops waiting never aborts the request and
//! the entry is still populated for later readers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::key::QueryKey;
use super::policy::QueryPolicy;
use crate::api::ApiError;

/// Outcome of a query as seen by its consumers.
pub type QueryResult<V> = Result<Arc<V>, ApiError>;

type SharedFetch<V> = Shared<BoxFuture<'static, QueryResult<V>>>;

/// Delay before the first automatic retry; doubles per attempt.
const INITIAL_RETRY_DELAY_MS: u64 = 1000;

/// Upper bound for the retry delay.
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Backoff before retry number `attempt + 1`.
pub fn retry_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(INITIAL_RETRY_DELAY_MS.saturating_mul(factor).min(MAX_RETRY_DELAY_MS))
}

/// Read-only view of an entry, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus<V> {
    /// Never fetched and nothing in flight.
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    Success {
        data: Arc<V>,
        is_stale: bool,
        is_fetching: bool,
    },
    /// Retry budget exhausted. `stale` is the last good value, if any.
    Error {
        error: ApiError,
        stale: Option<Arc<V>>,
    },
}

impl<V> QueryStatus<V> {
    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            QueryStatus::Success { data, .. } => Some(data),
            QueryStatus::Error { stale, .. } => stale.as_ref(),
            QueryStatus::Idle | QueryStatus::Loading => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryStatus::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryStatus::Loading)
    }
}

/// A running fetch: the shared result, the task's abort handle and the
/// signal that cuts a pending backoff short.
struct InFlight<V> {
    shared: SharedFetch<V>,
    abort: AbortHandle,
    wake: Arc<Notify>,
}

struct Entry<V> {
    data: Option<(Arc<V>, Instant)>,
    error: Option<(ApiError, Instant)>,
    /// Marked stale by `invalidate` regardless of age.
    invalidated: bool,
    in_flight: Option<InFlight<V>>,
    subscribers: usize,
    last_used: Instant,
    /// Bumped for every started fetch; completions of older fetches are ignored.
    generation: u64,
}

impl<V> Entry<V> {
    fn new(now: Instant) -> Self {
        Self {
            data: None,
            error: None,
            invalidated: false,
            in_flight: None,
            subscribers: 0,
            last_used: now,
            generation: 0,
        }
    }

    fn fresh_data(&self, policy: &QueryPolicy, now: Instant) -> Option<Arc<V>> {
        if self.invalidated || self.error.is_some() {
            return None;
        }
        match self.data {
            Some((ref data, fetched_at)) if now.duration_since(fetched_at) < policy.freshness => {
                Some(Arc::clone(data))
            }
            _ => None,
        }
    }

    fn cached_error(&self, policy: &QueryPolicy, now: Instant) -> Option<ApiError> {
        match self.error {
            Some((ref error, failed_at)) if now.duration_since(failed_at) < policy.freshness => {
                Some(error.clone())
            }
            _ => None,
        }
    }
}

struct Inner<V> {
    entries: HashMap<QueryKey, Entry<V>>,
}

fn lock_inner<V>(inner: &Mutex<Inner<V>>) -> MutexGuard<'_, Inner<V>> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes the outcome of a spawned fetch back into its entry. If the task is
/// aborted before completing, the drop records `ApiError::Cancelled` so the
/// entry never stays in flight forever.
struct CompletionGuard<V> {
    inner: Arc<Mutex<Inner<V>>>,
    key: QueryKey,
    generation: u64,
    done: bool,
}

impl<V> CompletionGuard<V> {
    fn record(&mut self, result: Result<Arc<V>, ApiError>) {
        self.done = true;
        let now = Instant::now();
        let mut inner = lock_inner(&self.inner);
        let Some(entry) = inner.entries.get_mut(&self.key) else {
            return;
        };
        if entry.generation != self.generation {
            return;
        }
        entry.in_flight = None;
        entry.last_used = now;
        match result {
            Ok(data) => {
                entry.data = Some((data, now));
                entry.error = None;
                entry.invalidated = false;
            }
            Err(error) => {
                entry.error = Some((error, now));
            }
        }
    }
}

impl<V> Drop for CompletionGuard<V> {
    fn drop(&mut self) {
        if !self.done {
            debug!(key = ?self.key, "Query task dropped before completing");
            self.record(Err(ApiError::Cancelled));
        }
    }
}

/// Keyed cache for one value type with a single [`QueryPolicy`].
pub struct QueryCache<V> {
    name: &'static str,
    policy: QueryPolicy,
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            policy: self.policy,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + Sync + 'static> QueryCache<V> {
    pub fn new(name: &'static str, policy: QueryPolicy) -> Self {
        Self {
            name,
            policy,
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        lock_inner(&self.inner)
    }

    /// Return fresh data without I/O, join the in-flight request for `key`,
    /// or start one. A cached error is returned as-is until it expires or
    /// [`QueryCache::retry`] clears it.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryResult<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let pending = {
            let now = Instant::now();
            let mut inner = self.lock();
            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now));
            entry.last_used = now;

            if let Some(ref in_flight) = entry.in_flight {
                debug!(query = self.name, key = ?key, "Joining in-flight request");
                in_flight.shared.clone()
            } else if let Some(data) = entry.fresh_data(&self.policy, now) {
                return Ok(data);
            } else if let Some(error) = entry.cached_error(&self.policy, now) {
                return Err(error);
            } else {
                self.start(entry, key, fetcher)
            }
        };
        pending.await
    }

    /// Warm the cache for `key` without waiting. Does nothing when the entry
    /// is fresh, already loading, or holds a recent error. Failures are only
    /// logged.
    pub fn prefetch<F, Fut>(&self, key: QueryKey, fetcher: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let now = Instant::now();
        let mut inner = self.lock();
        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        entry.last_used = now;

        if entry.in_flight.is_some()
            || entry.fresh_data(&self.policy, now).is_some()
            || entry.cached_error(&self.policy, now).is_some()
        {
            return;
        }
        debug!(query = self.name, key = ?key, "Prefetching");
        let _ = self.start(entry, key, fetcher);
    }

    /// Clear a cached error and fetch immediately, ignoring freshness.
    ///
    /// If a request is already running it is joined, and a pending backoff
    /// ends at once with a fresh retry budget. Callers already waiting on that
    /// request keep waiting on the same result.
    pub async fn retry<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryResult<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let pending = {
            let now = Instant::now();
            let mut inner = self.lock();
            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now));
            entry.last_used = now;
            entry.error = None;

            match entry.in_flight {
                Some(ref in_flight) => {
                    debug!(query = self.name, key = ?key, "Manual retry, skipping backoff");
                    in_flight.wake.notify_one();
                    in_flight.shared.clone()
                }
                None => self.start(entry, key, fetcher),
            }
        };
        pending.await
    }

    /// Spawn the fetch task for `key` and record it as in flight.
    fn start<F, Fut>(&self, entry: &mut Entry<V>, key: QueryKey, fetcher: F) -> SharedFetch<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        entry.generation += 1;
        let mut guard = CompletionGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
            generation: entry.generation,
            done: false,
        };
        let name = self.name;
        let retry_budget = self.policy.retry_budget;
        let wake = Arc::new(Notify::new());
        let task_wake = Arc::clone(&wake);

        let handle = tokio::spawn(async move {
            let result = run_with_retries(name, &key, retry_budget, &fetcher, &task_wake)
                .await
                .map(Arc::new);
            if let Err(ref e) = result {
                warn!(query = name, key = ?key, error = %e, "Query failed");
            }
            guard.record(result.clone());
            result
        });
        let abort = handle.abort_handle();

        let shared = async move {
            match handle.await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Cancelled),
            }
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            shared: shared.clone(),
            abort,
            wake,
        });
        shared
    }

    /// Abort the in-flight request for `key`. Waiting callers receive
    /// [`ApiError::Cancelled`] and the entry records it as its error.
    pub fn cancel(&self, key: &QueryKey) -> bool {
        let abort = {
            let inner = self.lock();
            inner
                .entries
                .get(key)
                .and_then(|entry| entry.in_flight.as_ref())
                .map(|in_flight| in_flight.abort.clone())
        };
        match abort {
            Some(abort) => {
                abort.abort();
                true
            }
            None => false,
        }
    }

    /// Last fetched value for `key`, fresh or not.
    pub fn get_data(&self, key: &QueryKey) -> Option<Arc<V>> {
        self.lock()
            .entries
            .get(key)
            .and_then(|entry| entry.data.as_ref())
            .map(|(data, _)| Arc::clone(data))
    }

    /// Store a value as if it had just been fetched.
    pub fn set_data(&self, key: QueryKey, value: V) -> Arc<V> {
        self.set_data_at(key, value, Instant::now())
    }

    /// Store a value fetched at `fetched_at`; its freshness counts from then.
    pub fn set_data_at(&self, key: QueryKey, value: V, fetched_at: Instant) -> Arc<V> {
        let now = Instant::now();
        let data = Arc::new(value);
        let mut inner = self.lock();
        let entry = inner.entries.entry(key).or_insert_with(|| Entry::new(now));
        entry.data = Some((Arc::clone(&data), fetched_at));
        entry.error = None;
        entry.invalidated = false;
        entry.last_used = now;
        data
    }

    /// Scan every cached value; the first `Some` returned by `f` wins.
    pub fn peek<R>(&self, mut f: impl FnMut(&V) -> Option<R>) -> Option<R> {
        let inner = self.lock();
        inner
            .entries
            .values()
            .filter_map(|entry| entry.data.as_ref())
            .find_map(|(data, _)| f(data))
    }

    /// Like [`QueryCache::peek`], but considers every match and returns the
    /// most recently fetched one together with its fetch time.
    pub fn peek_latest<R>(&self, mut f: impl FnMut(&V) -> Option<R>) -> Option<(R, Instant)> {
        let inner = self.lock();
        inner
            .entries
            .values()
            .filter_map(|entry| entry.data.as_ref())
            .filter_map(|(data, fetched_at)| f(data).map(|found| (found, *fetched_at)))
            .max_by_key(|(_, fetched_at)| *fetched_at)
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus<V> {
        let now = Instant::now();
        let inner = self.lock();
        let Some(entry) = inner.entries.get(key) else {
            return QueryStatus::Idle;
        };
        let is_fetching = entry.in_flight.is_some();
        let data = entry.data.as_ref().map(|(data, _)| Arc::clone(data));

        if let Some((ref error, _)) = entry.error {
            if !is_fetching {
                return QueryStatus::Error {
                    error: error.clone(),
                    stale: data,
                };
            }
        }
        match data {
            Some(data) => QueryStatus::Success {
                is_stale: entry.fresh_data(&self.policy, now).is_none(),
                data,
                is_fetching,
            },
            None if is_fetching => QueryStatus::Loading,
            None => QueryStatus::Idle,
        }
    }

    /// Mark `key` stale so the next fetch goes to the network.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.lock().entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    /// Register an active consumer of `key`; the entry is not evicted while
    /// the returned guard lives.
    pub fn subscribe(&self, key: &QueryKey) -> Subscription {
        let now = Instant::now();
        {
            let mut inner = self.lock();
            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now));
            entry.subscribers += 1;
            entry.last_used = now;
        }

        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        Subscription {
            release: Some(Box::new(move || {
                let mut inner = lock_inner(&inner);
                if let Some(entry) = inner.entries.get_mut(&key) {
                    entry.subscribers = entry.subscribers.saturating_sub(1);
                    entry.last_used = Instant::now();
                }
            })),
        }
    }

    /// Number of live subscriptions on `key`.
    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.lock().entries.get(key).map_or(0, |entry| entry.subscribers)
    }

    /// Keys with subscribers whose data is stale, for focus refetching.
    pub fn stale_subscribed_keys(&self) -> Vec<QueryKey> {
        let now = Instant::now();
        self.lock()
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers > 0
                    && entry.in_flight.is_none()
                    && entry.data.is_some()
                    && entry.fresh_data(&self.policy, now).is_none()
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Refresh stale entries that still have subscribers, when the policy
    /// opts in. `make_fetcher` builds the fetcher for each key. Returns the
    /// number of refetches started.
    pub fn refetch_on_focus<M, F, Fut>(&self, make_fetcher: M) -> usize
    where
        M: Fn(&QueryKey) -> F,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        if !self.policy.refetch_on_focus {
            return 0;
        }
        let keys = self.stale_subscribed_keys();
        for key in &keys {
            let fetcher = make_fetcher(key);
            self.prefetch(key.clone(), fetcher);
        }
        if !keys.is_empty() {
            debug!(query = self.name, count = keys.len(), "Refetching on focus");
        }
        keys.len()
    }

    /// Evict entries that have had no subscriber and no request in flight for
    /// at least the retention window. Returns the number evicted.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let retention = self.policy.retention;
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| {
            entry.subscribers > 0
                || entry.in_flight.is_some()
                || now.duration_since(entry.last_used) < retention
        });
        let evicted = before - inner.entries.len();
        if evicted > 0 {
            debug!(query = self.name, evicted, "Evicted idle cache entries");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn run_with_retries<V, F, Fut>(
    name: &'static str,
    key: &QueryKey,
    retry_budget: u32,
    fetcher: &F,
    wake: &Notify,
) -> Result<V, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<V, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retry_budget && e.is_retryable() => {
                let delay = retry_delay(attempt);
                attempt += 1;
                debug!(
                    query = name,
                    key = ?key,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying query"
                );
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = wake.notified() => attempt = 0,
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Guard for an active consumer; dropping it releases the entry for eviction.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
