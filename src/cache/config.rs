//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Entries are evicted this long after insertion.
    pub ttl: Option<Duration>,

    /// Entries are evicted if not read within this duration.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)), // 5 minutes
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    /// Set max capacity for cache (builder pattern).
    #[must_use]
    pub fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Set time-to-live for cache entries.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    /// Set time-to-idle for cache entries.
    #[must_use]
    pub fn tti(mut self, duration: Duration) -> Self {
        self.tti = Some(duration);
        self
    }

    /// Filter content: read on every match, small values, short TTL.
    pub fn hot_data() -> Self {
        Self {
            max_capacity: 50_000,
            ttl: Some(Duration::from_secs(60)), // 1 minute
            tti: Some(Duration::from_secs(30)), // 30 seconds idle
        }
    }

    /// Keyword lists and chat titles: read constantly, change rarely.
    /// Writes invalidate explicitly, so the TTL only bounds staleness
    /// across processes sharing one database.
    pub fn cold_data() -> Self {
        Self {
            max_capacity: 5_000,
            ttl: Some(Duration::from_secs(3600)), // 1 hour
            tti: None,
        }
    }

    /// Compiled keyword patterns. Pure function of the keyword, so only
    /// idleness matters.
    pub fn compiled() -> Self {
        Self {
            max_capacity: 20_000,
            ttl: None,
            tti: Some(Duration::from_secs(1800)), // 30 minutes idle
        }
    }
}
