use std::time::Duration;

const MINUTE: u64 = 60;

/// Caching policy for one resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// How long fetched data is served without a network call.
    pub freshness: Duration,
    /// How long an entry without subscribers survives before eviction.
    pub retention: Duration,
    /// Automatic retries after the first failed attempt.
    pub retry_budget: u32,
    /// Refetch stale subscribed entries when the terminal regains focus.
    pub refetch_on_focus: bool,
}

impl QueryPolicy {
    /// Character list pages: searched and paged often, cached briefly.
    pub const fn character_list() -> Self {
        Self {
            freshness: Duration::from_secs(5 * MINUTE),
            retention: Duration::from_secs(10 * MINUTE),
            retry_budget: 2,
            refetch_on_focus: false,
        }
    }

    /// Single characters change less than list pages.
    pub const fn character() -> Self {
        Self {
            freshness: Duration::from_secs(10 * MINUTE),
            retention: Duration::from_secs(30 * MINUTE),
            retry_budget: 2,
            refetch_on_focus: false,
        }
    }

    /// Episode records are effectively immutable upstream.
    pub const fn episodes() -> Self {
        Self {
            freshness: Duration::from_secs(30 * MINUTE),
            retention: Duration::from_secs(60 * MINUTE),
            retry_budget: 2,
            refetch_on_focus: false,
        }
    }

    pub const fn with_refetch_on_focus(mut self, enabled: bool) -> Self {
        self.refetch_on_focus = enabled;
        self
    }

    pub const fn with_retry_budget(mut self, retries: u32) -> Self {
        self.retry_budget = retries;
        self
    }
}

/// Policies for the three caches owned by a `QueryClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicies {
    pub character_list: QueryPolicy,
    pub character: QueryPolicy,
    pub episodes: QueryPolicy,
}

impl Default for QueryPolicies {
    fn default() -> Self {
        Self {
            character_list: QueryPolicy::character_list(),
            character: QueryPolicy::character(),
            episodes: QueryPolicy::episodes(),
        }
    }
}

impl QueryPolicies {
    /// Detail-heavy resources may opt into focus refetching; list pages never do.
    pub fn with_refetch_on_focus(mut self, enabled: bool) -> Self {
        self.character = self.character.with_refetch_on_focus(enabled);
        self.episodes = self.episodes.with_refetch_on_focus(enabled);
        self
    }
}
