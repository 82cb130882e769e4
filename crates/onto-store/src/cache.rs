//! Title lookup cache using moka
//!
//! Improvement proposals reference nodes by title, and one comparison can
//! resolve the same title many times. Only hits are cached so a node created
//! after a miss is found on the next lookup.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::traits::TitleLookup;
use async_trait::async_trait;
use moka::future::Cache;
use onto_model::NodeId;
use std::time::Duration;

/// [`TitleLookup`] wrapper memoising resolved titles
#[derive(Debug, Clone)]
pub struct CachedTitleLookup<L> {
    inner: L,
    cache: Cache<String, NodeId>,
}

impl<L: TitleLookup> CachedTitleLookup<L> {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(inner: L, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_capacity),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(inner: L, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Create cache sized by store configuration
    #[must_use]
    pub fn from_config(inner: L, config: &StoreConfig) -> Self {
        Self::with_ttl(inner, config.title_cache_capacity, config.title_cache_ttl())
    }

    /// Drop a cached title, e.g. after a rename
    #[inline]
    pub async fn invalidate(&self, title: &str) {
        self.cache.invalidate(title).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Get approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Wrapped lookup
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: TitleLookup> TitleLookup for CachedTitleLookup<L> {
    async fn node_id_by_title(&self, title: &str) -> Result<Option<NodeId>, StoreError> {
        if let Some(hit) = self.cache.get(title).await {
            return Ok(Some(hit));
        }

        let resolved = self.inner.node_id_by_title(title).await?;
        if let Some(id) = &resolved {
            self.cache.insert(title.to_owned(), id.clone()).await;
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Lookup {}

        #[async_trait]
        impl TitleLookup for Lookup {
            async fn node_id_by_title(&self, title: &str) -> Result<Option<NodeId>, StoreError>;
        }
    }

    #[tokio::test]
    async fn hits_are_served_from_cache() {
        let mut inner = MockLookup::new();
        inner
            .expect_node_id_by_title()
            .with(eq("Destroy"))
            .times(1)
            .returning(|_| Ok(Some(NodeId::new("destroy"))));

        let cached = CachedTitleLookup::new(inner, 16);
        for _ in 0..3 {
            let id = cached.node_id_by_title("Destroy").await.unwrap();
            assert_eq!(id, Some(NodeId::new("destroy")));
        }
    }

    #[tokio::test]
    async fn misses_are_not_cached() {
        let mut inner = MockLookup::new();
        inner
            .expect_node_id_by_title()
            .times(2)
            .returning(|_| Ok(None));

        let cached = CachedTitleLookup::new(inner, 16);
        assert_eq!(cached.node_id_by_title("Ghost").await.unwrap(), None);
        assert_eq!(cached.node_id_by_title("Ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn errors_propagate() {
        let mut inner = MockLookup::new();
        inner
            .expect_node_id_by_title()
            .returning(|_| Err(StoreError::Unavailable("offline".into())));

        let cached = CachedTitleLookup::new(inner, 16);
        let err = cached.node_id_by_title("Destroy").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
