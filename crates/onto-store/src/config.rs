//! Store configuration

use crate::DEFAULT_MAX_BATCH_MUTATIONS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Store-side limits and cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum document mutations per commit
    pub max_batch_mutations: usize,
    /// Title cache capacity (entries)
    pub title_cache_capacity: u64,
    /// Title cache time-to-live in seconds
    pub title_cache_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_batch_mutations: DEFAULT_MAX_BATCH_MUTATIONS,
            title_cache_capacity: 10_000,
            title_cache_ttl_secs: 300,
        }
    }
}

impl StoreConfig {
    /// Set mutation limit
    #[inline]
    #[must_use]
    pub fn with_max_batch_mutations(mut self, limit: usize) -> Self {
        self.max_batch_mutations = limit;
        self
    }

    /// Set title cache capacity
    #[inline]
    #[must_use]
    pub fn with_title_cache_capacity(mut self, capacity: u64) -> Self {
        self.title_cache_capacity = capacity;
        self
    }

    /// Set title cache TTL
    #[inline]
    #[must_use]
    pub fn with_title_cache_ttl(mut self, ttl: Duration) -> Self {
        self.title_cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Title cache TTL
    #[inline]
    #[must_use]
    pub fn title_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.title_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_store() {
        let config = StoreConfig::default();
        assert_eq!(config.max_batch_mutations, 500);
        assert_eq!(config.title_cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn builders_override() {
        let config = StoreConfig::default()
            .with_max_batch_mutations(10)
            .with_title_cache_capacity(5)
            .with_title_cache_ttl(Duration::from_secs(1));
        assert_eq!(config.max_batch_mutations, 10);
        assert_eq!(config.title_cache_capacity, 5);
        assert_eq!(config.title_cache_ttl_secs, 1);
    }
}
