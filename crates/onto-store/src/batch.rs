//! Bounded write batches
//!
//! Provides [`WriteBatch`] (one atomic commit) and [`BatchWriter`], which
//! commits the full-so-far batch before accepting an update that would push
//! it past the store's limit. Commits are issued strictly one after another.

use crate::error::StoreError;
use crate::traits::DocumentStore;
use onto_model::NodeUpdate;
use std::mem;

/// Atomic multi-document commit unit
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
    limit: usize,
    updates: Vec<NodeUpdate>,
}

impl WriteBatch {
    /// Create empty batch holding at most `limit` mutations (at least one)
    #[inline]
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            updates: Vec::new(),
        }
    }

    /// Add an update
    ///
    /// # Errors
    /// Hands the update back when the batch is full
    pub fn push(&mut self, update: NodeUpdate) -> Result<(), NodeUpdate> {
        if self.is_full() {
            return Err(update);
        }
        self.updates.push(update);
        Ok(())
    }

    /// Mutation limit
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of queued mutations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Whether nothing is queued
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Whether another mutation would exceed the limit
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.updates.len() >= self.limit
    }

    /// Queued updates
    #[inline]
    #[must_use]
    pub fn updates(&self) -> &[NodeUpdate] {
        &self.updates
    }

    /// Consume into queued updates
    #[inline]
    #[must_use]
    pub fn into_updates(self) -> Vec<NodeUpdate> {
        self.updates
    }
}

/// Counters for committed work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Successful commits
    pub commits: usize,
    /// Node updates included in successful commits
    pub mutations: usize,
}

/// Sequential batch committer over a [`DocumentStore`]
pub struct BatchWriter<'s, S: DocumentStore + ?Sized> {
    store: &'s S,
    batch: WriteBatch,
    stats: CommitStats,
}

impl<'s, S: DocumentStore + ?Sized> BatchWriter<'s, S> {
    /// Create writer sized to the store's mutation limit
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self::with_limit(store, store.max_batch_mutations())
    }

    /// Create writer with an explicit limit, capped by the store's
    #[must_use]
    pub fn with_limit(store: &'s S, limit: usize) -> Self {
        let limit = limit.min(store.max_batch_mutations());
        Self {
            store,
            batch: WriteBatch::new(limit),
            stats: CommitStats::default(),
        }
    }

    /// Queue an update, committing the current batch first if it is full
    ///
    /// Empty updates are dropped.
    ///
    /// # Errors
    /// Returns the store error of a failed commit
    pub async fn write(&mut self, update: NodeUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }
        if self.batch.is_full() {
            self.flush().await?;
        }
        // limit is at least one and flush emptied the batch
        self.batch
            .push(update)
            .map_err(|_| StoreError::BatchTooLarge {
                size: self.batch.len() + 1,
                limit: self.batch.limit(),
            })
    }

    /// Commit whatever is queued
    ///
    /// # Errors
    /// Returns the store error of a failed commit
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let limit = self.batch.limit();
        let batch = mem::replace(&mut self.batch, WriteBatch::new(limit));
        let size = batch.len();
        self.store.commit(batch).await?;
        self.stats.commits += 1;
        self.stats.mutations += size;
        tracing::debug!(size, commits = self.stats.commits, "committed batch");
        Ok(())
    }

    /// Committed work so far
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CommitStats {
        self.stats
    }

    /// Commit the remainder and return totals
    ///
    /// # Errors
    /// Returns the store error of a failed commit
    pub async fn finish(mut self) -> Result<CommitStats, StoreError> {
        self.flush().await?;
        Ok(self.stats)
    }
}

impl<S: DocumentStore + ?Sized> std::fmt::Debug for BatchWriter<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("queued", &self.batch.len())
            .field("limit", &self.batch.limit())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use onto_model::{FieldUpdate, Node, NodeGraph, NodeType};

    fn touch(id: &str) -> NodeUpdate {
        NodeUpdate::new(id).with(FieldUpdate::SetInheritanceRef {
            property: "p".into(),
            source: None,
        })
    }

    fn store(n: usize, limit: usize) -> InMemoryStore {
        let graph = NodeGraph::from_nodes(
            (0..n).map(|i| Node::new(format!("n{i}"), format!("N{i}"), NodeType::Concept)),
        );
        InMemoryStore::from_graph(graph).with_max_batch_mutations(limit)
    }

    #[test]
    fn write_batch_respects_limit() {
        let mut batch = WriteBatch::new(2);
        assert!(batch.push(touch("a")).is_ok());
        assert!(batch.push(touch("b")).is_ok());
        assert!(batch.is_full());
        assert_eq!(batch.push(touch("c")), Err(touch("c")));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(WriteBatch::new(0).limit(), 1);
    }

    #[tokio::test]
    async fn writer_splits_into_sequential_commits() {
        let store = store(7, 3);
        let mut writer = BatchWriter::new(&store);
        for i in 0..7 {
            writer.write(touch(&format!("n{i}"))).await.unwrap();
        }
        // two full batches committed while writing
        assert_eq!(writer.stats().commits, 2);

        let stats = writer.finish().await.unwrap();
        assert_eq!(stats, CommitStats { commits: 3, mutations: 7 });
        assert_eq!(store.commit_count(), 3);
        assert!(store.max_committed_batch() <= 3);
    }

    #[tokio::test]
    async fn writer_drops_empty_updates() {
        let store = store(1, 10);
        let mut writer = BatchWriter::new(&store);
        writer.write(NodeUpdate::new("n0")).await.unwrap();
        let stats = writer.finish().await.unwrap();
        assert_eq!(stats, CommitStats::default());
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn writer_limit_is_capped_by_store() {
        let store = store(4, 2);
        let mut writer = BatchWriter::with_limit(&store, 100);
        for i in 0..4 {
            writer.write(touch(&format!("n{i}"))).await.unwrap();
        }
        let stats = writer.finish().await.unwrap();
        assert_eq!(stats.commits, 2);
    }

    #[tokio::test]
    async fn failed_commit_keeps_earlier_batches() {
        let store = store(5, 2).fail_commit_at(1);
        let mut writer = BatchWriter::new(&store);
        let mut failure = None;
        for i in 0..5 {
            if let Err(e) = writer.write(touch(&format!("n{i}"))).await {
                failure = Some(e);
                break;
            }
        }
        assert!(matches!(failure, Some(StoreError::CommitFailed(_))));
        assert_eq!(writer.stats(), CommitStats { commits: 1, mutations: 2 });
        assert!(store.node("n0").unwrap().inheritance.contains_key("p"));
        assert!(!store.node("n2").unwrap().inheritance.contains_key("p"));
    }
}
