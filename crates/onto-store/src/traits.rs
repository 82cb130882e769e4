//! Store seams
//!
//! Everything the planners need from persistence. Implementations decide
//! transport; the planners only rely on atomic per-batch commits and the
//! advertised mutation limit.

use crate::batch::WriteBatch;
use crate::error::StoreError;
use async_trait::async_trait;
use onto_model::{ChangeLogId, Node, NodeChange, NodeGraph, NodeId};
use std::sync::Arc;

/// Predicate for [`DocumentStore::query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeQuery {
    /// Every document, including soft-deleted ones
    All,
    /// Documents with `deleted == false`
    Live,
    /// Live documents with exactly this title
    TitleEquals(String),
    /// Documents with one of these ids
    Ids(Vec<NodeId>),
}

impl NodeQuery {
    /// Whether a node satisfies the predicate
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::All => true,
            Self::Live => !node.deleted,
            Self::TitleEquals(title) => !node.deleted && node.title == *title,
            Self::Ids(ids) => ids.contains(&node.id),
        }
    }
}

/// Node document collection
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one node
    async fn get(&self, id: &NodeId) -> Result<Option<Node>, StoreError>;

    /// Fetch nodes matching a predicate
    async fn query(&self, query: &NodeQuery) -> Result<Vec<Node>, StoreError>;

    /// Maximum number of document mutations in one commit
    fn max_batch_mutations(&self) -> usize;

    /// Commit a batch atomically
    ///
    /// # Errors
    /// Returns error if any update fails; nothing in the batch is applied.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Snapshot of the whole collection
    async fn snapshot(&self) -> Result<NodeGraph, StoreError> {
        Ok(NodeGraph::from_nodes(self.query(&NodeQuery::All).await?))
    }
}

/// Exact-title lookup
#[async_trait]
pub trait TitleLookup: Send + Sync {
    /// Id of the first live node titled `title`
    async fn node_id_by_title(&self, title: &str) -> Result<Option<NodeId>, StoreError>;
}

#[async_trait]
impl<T: TitleLookup + ?Sized> TitleLookup for Arc<T> {
    async fn node_id_by_title(&self, title: &str) -> Result<Option<NodeId>, StoreError> {
        (**self).node_id_by_title(title).await
    }
}

/// Change-log sink
#[async_trait]
pub trait ChangeLogSink: Send + Sync {
    /// Persist an entry and return its id
    async fn log(&self, change: NodeChange) -> Result<ChangeLogId, StoreError>;
}

#[async_trait]
impl<T: ChangeLogSink + ?Sized> ChangeLogSink for Arc<T> {
    async fn log(&self, change: NodeChange) -> Result<ChangeLogId, StoreError> {
        (**self).log(change).await
    }
}

/// Contributor tracking sink
#[async_trait]
pub trait ContributorSink: Send + Sync {
    /// Credit `username` on the node, and on `property` when given
    ///
    /// A missing node is logged and skipped, not an error.
    async fn update_contributors(
        &self,
        node_id: &NodeId,
        username: &str,
        property: Option<&str>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ContributorSink + ?Sized> ContributorSink for Arc<T> {
    async fn update_contributors(
        &self,
        node_id: &NodeId,
        username: &str,
        property: Option<&str>,
    ) -> Result<(), StoreError> {
        (**self).update_contributors(node_id, username, property).await
    }
}
