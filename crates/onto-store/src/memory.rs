//! In-memory store
//!
//! Implements every store seam over a [`NodeGraph`] snapshot. Used by the CLI
//! on JSON snapshots and as the fake in tests; `fail_commit_at` injects a
//! commit failure to exercise partial-cascade behaviour.

use crate::batch::WriteBatch;
use crate::error::StoreError;
use crate::traits::{ChangeLogSink, ContributorSink, DocumentStore, NodeQuery, TitleLookup};
use crate::DEFAULT_MAX_BATCH_MUTATIONS;
use async_trait::async_trait;
use dashmap::DashMap;
use onto_model::{ChangeLogId, FieldUpdate, Node, NodeChange, NodeGraph, NodeId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Node collection, change log and commit counters held in memory
#[derive(Debug)]
pub struct InMemoryStore {
    graph: RwLock<NodeGraph>,
    change_log: DashMap<ChangeLogId, NodeChange>,
    max_batch_mutations: usize,
    commits: AtomicUsize,
    max_committed_batch: AtomicUsize,
    fail_commit_at: Mutex<Option<usize>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::from_graph(NodeGraph::new())
    }
}

impl InMemoryStore {
    /// Create store seeded with a snapshot
    #[must_use]
    pub fn from_graph(graph: NodeGraph) -> Self {
        Self {
            graph: RwLock::new(graph),
            change_log: DashMap::new(),
            max_batch_mutations: DEFAULT_MAX_BATCH_MUTATIONS,
            commits: AtomicUsize::new(0),
            max_committed_batch: AtomicUsize::new(0),
            fail_commit_at: Mutex::new(None),
        }
    }

    /// Set the advertised mutation limit
    #[inline]
    #[must_use]
    pub fn with_max_batch_mutations(mut self, limit: usize) -> Self {
        self.max_batch_mutations = limit.max(1);
        self
    }

    /// Reject the commit with this zero-based index
    #[inline]
    #[must_use]
    pub fn fail_commit_at(self, index: usize) -> Self {
        *self.fail_commit_at.lock() = Some(index);
        self
    }

    /// Insert or replace a node
    pub fn insert(&self, node: Node) {
        self.graph.write().insert(node);
    }

    /// Clone of one node, deleted or not
    #[must_use]
    pub fn node(&self, id: &str) -> Option<Node> {
        self.graph.read().get(id).cloned()
    }

    /// Clone of the current snapshot
    #[must_use]
    pub fn graph(&self) -> NodeGraph {
        self.graph.read().clone()
    }

    /// Consume into the current snapshot
    #[must_use]
    pub fn into_graph(self) -> NodeGraph {
        self.graph.into_inner()
    }

    /// Logged changes ordered by id (creation time at millisecond resolution)
    #[must_use]
    pub fn change_log(&self) -> Vec<NodeChange> {
        let mut entries: Vec<_> = self
            .change_log
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, change)| change).collect()
    }

    /// Successful commits so far
    #[inline]
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Largest batch committed so far
    #[inline]
    #[must_use]
    pub fn max_committed_batch(&self) -> usize {
        self.max_committed_batch.load(Ordering::SeqCst)
    }

    fn check_injected_failure(&self) -> Result<(), StoreError> {
        let attempt = self.commits.load(Ordering::SeqCst);
        let mut fail_at = self.fail_commit_at.lock();
        if *fail_at == Some(attempt) {
            *fail_at = None;
            return Err(StoreError::CommitFailed(format!(
                "injected failure on commit {attempt}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, id: &NodeId) -> Result<Option<Node>, StoreError> {
        Ok(self.node(id.as_str()))
    }

    async fn query(&self, query: &NodeQuery) -> Result<Vec<Node>, StoreError> {
        Ok(self
            .graph
            .read()
            .iter()
            .filter(|node| query.matches(node))
            .cloned()
            .collect())
    }

    fn max_batch_mutations(&self) -> usize {
        self.max_batch_mutations
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.len() > self.max_batch_mutations {
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                limit: self.max_batch_mutations,
            });
        }
        self.check_injected_failure()?;

        let mut graph = self.graph.write();
        if let Some(missing) = batch
            .updates()
            .iter()
            .find(|update| graph.get(update.node_id.as_str()).is_none())
        {
            return Err(StoreError::NotFound(missing.node_id.clone()));
        }
        graph.apply(batch.updates());
        drop(graph);

        self.commits.fetch_add(1, Ordering::SeqCst);
        self.max_committed_batch
            .fetch_max(batch.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn snapshot(&self) -> Result<NodeGraph, StoreError> {
        Ok(self.graph())
    }
}

#[async_trait]
impl TitleLookup for InMemoryStore {
    async fn node_id_by_title(&self, title: &str) -> Result<Option<NodeId>, StoreError> {
        Ok(self
            .graph
            .read()
            .live_nodes()
            .find(|node| node.title == title)
            .map(|node| node.id.clone()))
    }
}

#[async_trait]
impl ChangeLogSink for InMemoryStore {
    async fn log(&self, mut change: NodeChange) -> Result<ChangeLogId, StoreError> {
        let id = change.id.unwrap_or_default();
        change.id = Some(id);
        self.change_log.insert(id, change);
        Ok(id)
    }
}

#[async_trait]
impl ContributorSink for InMemoryStore {
    async fn update_contributors(
        &self,
        node_id: &NodeId,
        username: &str,
        property: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut graph = self.graph.write();
        let Some(node) = graph.get_mut(node_id.as_str()) else {
            tracing::warn!(node = %node_id, "contributor update for missing node skipped");
            return Ok(());
        };
        node.apply(&FieldUpdate::AddContributor {
            username: username.to_owned(),
            property: property.map(str::to_owned),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onto_model::{ChangeType, NodeType, NodeUpdate};
    use pretty_assertions::assert_eq;

    fn seeded() -> InMemoryStore {
        let mut ghost = Node::new("ghost", "Destroy", NodeType::Activity);
        ghost.deleted = true;
        InMemoryStore::from_graph(NodeGraph::from_nodes([
            ghost,
            Node::new("destroy", "Destroy", NodeType::Activity),
            Node::new("act", "Act", NodeType::Activity),
        ]))
    }

    #[tokio::test]
    async fn title_lookup_skips_deleted() {
        let store = seeded();
        let id = store.node_id_by_title("Destroy").await.unwrap();
        assert_eq!(id, Some(NodeId::new("destroy")));
        assert_eq!(store.node_id_by_title("destroy").await.unwrap(), None);
    }

    #[tokio::test]
    async fn query_live_excludes_deleted() {
        let store = seeded();
        let live = store.query(&NodeQuery::Live).await.unwrap();
        assert_eq!(live.len(), 2);
        assert_eq!(store.query(&NodeQuery::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing() {
        let store = seeded();
        let mut batch = WriteBatch::new(10);
        let touch = |id: &str| {
            NodeUpdate::new(id).with(FieldUpdate::SetInheritanceRef {
                property: "description".into(),
                source: None,
            })
        };
        batch.push(touch("act")).unwrap();
        batch.push(touch("missing")).unwrap();

        let err = store.commit(batch).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("missing".into()));
        assert!(!store.node("act").unwrap().inheritance.contains_key("description"));
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn oversized_batch_rejected() {
        let store = seeded().with_max_batch_mutations(1);
        let mut batch = WriteBatch::new(2);
        batch.push(NodeUpdate::new("act")).unwrap();
        batch.push(NodeUpdate::new("destroy")).unwrap();
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::BatchTooLarge { size: 2, limit: 1 })
        ));
    }

    #[tokio::test]
    async fn change_log_assigns_ids() {
        let store = seeded();
        let first = store
            .log(NodeChange::new("act", "alice", ChangeType::ChangeText))
            .await
            .unwrap();
        let second = store
            .log(NodeChange::new("act", "alice", ChangeType::AddProperty))
            .await
            .unwrap();
        assert_ne!(first, second);

        let log = store.change_log();
        assert_eq!(log.len(), 2);
        assert!(log.iter().any(|c| c.id == Some(first)));
        assert!(log
            .iter()
            .any(|c| c.id == Some(second) && c.change_type == ChangeType::AddProperty));
    }

    #[tokio::test]
    async fn contributors_are_unioned() {
        let store = seeded();
        let act = NodeId::new("act");
        store.update_contributors(&act, "alice", Some("description")).await.unwrap();
        store.update_contributors(&act, "alice", None).await.unwrap();

        let node = store.node("act").unwrap();
        assert_eq!(node.contributors, vec!["alice".to_string()]);
        assert_eq!(node.contributors_by_property["description"], vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn contributors_on_missing_node_are_skipped() {
        let store = seeded();
        let result = store
            .update_contributors(&NodeId::new("nope"), "alice", None)
            .await;
        assert!(result.is_ok());
    }
}
