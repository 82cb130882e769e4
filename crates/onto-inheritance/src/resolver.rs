//! Inheritance resolver
//!
//! Reads a snapshot from a [`DocumentStore`], plans the edit with
//! [`InheritancePlanner`] and commits the plan in bounded, strictly
//! sequential batches. A failed commit leaves earlier batches in place;
//! every plan is idempotent, so re-running converges.

use crate::error::InheritanceError;
use crate::planner::{GeneralizationOption, InheritancePlanner};
use onto_model::{Link, NodeGraph, NodeId, NodeUpdate, PropertyValue};
use onto_store::{BatchWriter, DocumentStore};
use serde::Serialize;
use std::sync::Arc;

/// Result of a committed cascade
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeOutcome {
    /// Updates that were committed, edited node last
    pub updates: Vec<NodeUpdate>,
    /// Number of batch commits issued
    pub commits: usize,
}

impl CascadeOutcome {
    /// Number of node documents changed
    #[inline]
    #[must_use]
    pub fn nodes_updated(&self) -> usize {
        self.updates.len()
    }

    /// Whether nothing was written
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Store-backed inheritance operations
#[derive(Debug)]
pub struct InheritanceResolver<S: ?Sized> {
    store: Arc<S>,
    max_batch_mutations: Option<usize>,
}

impl<S: ?Sized> Clone for InheritanceResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_batch_mutations: self.max_batch_mutations,
        }
    }
}

impl<S: DocumentStore + ?Sized> InheritanceResolver<S> {
    /// Create resolver over a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_batch_mutations: None,
        }
    }

    /// Cap batch size below the store's own limit
    #[inline]
    #[must_use]
    pub fn with_max_batch_mutations(mut self, limit: usize) -> Self {
        self.max_batch_mutations = Some(limit);
        self
    }

    async fn snapshot(&self) -> Result<NodeGraph, InheritanceError> {
        Ok(self.store.snapshot().await?)
    }

    /// Repoint `property` of a node to a new generalization
    ///
    /// # Errors
    /// Returns error if the node is missing, the snapshot cannot be read, or
    /// a batch commit fails
    pub async fn change_inheritance(
        &self,
        node_id: &NodeId,
        property: &str,
        new_generalization: &NodeId,
    ) -> Result<CascadeOutcome, InheritanceError> {
        let graph = self.snapshot().await?;
        let plan = InheritancePlanner::new(&graph).change_inheritance(
            node_id,
            property,
            new_generalization,
        )?;
        let outcome = self.commit(plan).await?;
        tracing::info!(
            node = %node_id,
            property,
            to = %new_generalization,
            nodes = outcome.nodes_updated(),
            commits = outcome.commits,
            "inheritance repointed"
        );
        Ok(outcome)
    }

    /// Store a local value, breaking inheritance for the node
    ///
    /// # Errors
    /// Returns error if the node is missing, the snapshot cannot be read, or
    /// a batch commit fails
    pub async fn break_inheritance(
        &self,
        node_id: &NodeId,
        property: &str,
        value: PropertyValue,
    ) -> Result<CascadeOutcome, InheritanceError> {
        let graph = self.snapshot().await?;
        let plan = InheritancePlanner::new(&graph).break_inheritance(node_id, property, value)?;
        let outcome = self.commit(plan).await?;
        tracing::info!(node = %node_id, property, nodes = outcome.nodes_updated(), "inheritance broken");
        Ok(outcome)
    }

    /// Reconcile inheritance after a generalization link was removed
    ///
    /// # Errors
    /// Returns error if the specialization is missing, the snapshot cannot
    /// be read, or a batch commit fails
    pub async fn unlink_generalization(
        &self,
        specialization: &NodeId,
        unlinked: &NodeId,
    ) -> Result<CascadeOutcome, InheritanceError> {
        let graph = self.snapshot().await?;
        let plan = InheritancePlanner::new(&graph).unlink_generalization(specialization, unlinked)?;
        let outcome = self.commit(plan).await?;
        tracing::info!(
            node = %specialization,
            unlinked = %unlinked,
            nodes = outcome.nodes_updated(),
            "generalization unlinked"
        );
        Ok(outcome)
    }

    /// Adopt properties reachable through newly added generalizations
    ///
    /// # Errors
    /// Returns error if the specialization is missing, the snapshot cannot
    /// be read, or a batch commit fails
    pub async fn link_generalizations(
        &self,
        specialization: &NodeId,
        added: &[Link],
    ) -> Result<CascadeOutcome, InheritanceError> {
        let graph = self.snapshot().await?;
        let plan = InheritancePlanner::new(&graph).link_generalizations(specialization, added)?;
        let outcome = self.commit(plan).await?;
        tracing::info!(
            node = %specialization,
            links = added.len(),
            nodes = outcome.nodes_updated(),
            "generalizations linked"
        );
        Ok(outcome)
    }

    /// Candidates for the inheritance-source selector
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be read
    pub async fn resolve_displayable_generalizations(
        &self,
        node_id: &NodeId,
        property: &str,
    ) -> Result<Option<Vec<GeneralizationOption>>, InheritanceError> {
        let graph = self.snapshot().await?;
        Ok(InheritancePlanner::new(&graph).displayable_generalizations(node_id, property))
    }

    /// Whether deleting the node would orphan a specialization
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be read
    pub async fn would_orphan_specializations(
        &self,
        node_id: &NodeId,
    ) -> Result<bool, InheritanceError> {
        let graph = self.snapshot().await?;
        Ok(InheritancePlanner::new(&graph).would_orphan_specializations(node_id))
    }

    /// Commit a plan in sequential bounded batches
    ///
    /// # Errors
    /// Returns [`InheritanceError::Commit`] with the work already committed
    pub async fn commit(&self, plan: Vec<NodeUpdate>) -> Result<CascadeOutcome, InheritanceError> {
        if plan.is_empty() {
            return Ok(CascadeOutcome::default());
        }
        let store: &S = &self.store;
        let mut writer = match self.max_batch_mutations {
            Some(limit) => BatchWriter::with_limit(store, limit),
            None => BatchWriter::new(store),
        };
        for update in plan.iter().cloned() {
            if let Err(source) = writer.write(update).await {
                return Err(InheritanceError::Commit {
                    source,
                    committed: writer.stats(),
                });
            }
        }
        let committed = writer.stats();
        let stats = writer
            .finish()
            .await
            .map_err(|source| InheritanceError::Commit { source, committed })?;
        Ok(CascadeOutcome {
            updates: plan,
            commits: stats.commits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onto_model::{Node, NodeType};
    use onto_store::{InMemoryStore, StoreError};
    use pretty_assertions::assert_eq;

    /// owner -> n0 -> n1 -> ... -> n{len-1}, all inheriting from owner
    fn chain(len: usize) -> NodeGraph {
        let mut graph = NodeGraph::from_nodes(
            std::iter::once(
                Node::new("owner", "Owner", NodeType::Concept)
                    .with_property("description", "string", "text"),
            )
            .chain(std::iter::once(
                Node::new("other", "Other", NodeType::Concept)
                    .with_property("description", "string", "other text"),
            ))
            .chain((0..len).map(|i| {
                Node::new(format!("n{i}"), format!("N{i}"), NodeType::Concept)
                    .inheriting("description", "owner")
            })),
        );
        graph.link("owner", "n0", "main").unwrap();
        graph.link("other", "n0", "main").unwrap();
        for i in 1..len {
            graph
                .link(&format!("n{}", i - 1), &format!("n{i}"), "main")
                .unwrap();
        }
        graph
    }

    #[tokio::test]
    async fn large_cascade_splits_into_batches() {
        let store = Arc::new(InMemoryStore::from_graph(chain(1200)).with_max_batch_mutations(500));
        let resolver = InheritanceResolver::new(Arc::clone(&store));

        let outcome = resolver
            .change_inheritance(&"n0".into(), "description", &"other".into())
            .await
            .unwrap();

        assert_eq!(outcome.nodes_updated(), 1200);
        assert_eq!(outcome.commits, 3);
        assert!(store.max_committed_batch() <= 500);
        let last = store.node("n1199").unwrap();
        assert_eq!(last.inheritance_ref("description"), Some(&"other".into()));
    }

    #[tokio::test]
    async fn resolver_limit_caps_batches() {
        let store = Arc::new(InMemoryStore::from_graph(chain(10)));
        let resolver = InheritanceResolver::new(Arc::clone(&store)).with_max_batch_mutations(4);
        let outcome = resolver
            .change_inheritance(&"n0".into(), "description", &"other".into())
            .await
            .unwrap();
        assert_eq!(outcome.commits, 3);
    }

    #[tokio::test]
    async fn partial_failure_reports_committed_work_and_rerun_converges() {
        let store = Arc::new(
            InMemoryStore::from_graph(chain(25))
                .with_max_batch_mutations(10)
                .fail_commit_at(1),
        );
        let resolver = InheritanceResolver::new(Arc::clone(&store));
        let n0: NodeId = "n0".into();
        let other: NodeId = "other".into();

        let err = resolver
            .change_inheritance(&n0, "description", &other)
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            InheritanceError::Commit {
                source: StoreError::CommitFailed(_),
                ..
            }
        ));
        assert_eq!(err.committed().commits, 1);
        assert_eq!(err.committed().mutations, 10);

        let stale = |graph: &NodeGraph| {
            (0..25)
                .filter(|i| {
                    graph
                        .get(&format!("n{i}"))
                        .and_then(|n| n.inheritance_ref("description"))
                        != Some(&other)
                })
                .count()
        };
        // ten descendants landed; n0 itself is written last
        assert_eq!(stale(&store.graph()), 15);

        let rerun = resolver
            .change_inheritance(&n0, "description", &other)
            .await
            .unwrap();
        assert_eq!(rerun.nodes_updated(), 15);
        assert_eq!(stale(&store.graph()), 0);
    }

    #[tokio::test]
    async fn displayable_generalizations_through_store() {
        let store = Arc::new(InMemoryStore::from_graph(chain(2)));
        let resolver = InheritanceResolver::new(store);
        let options = resolver
            .resolve_displayable_generalizations(&"n0".into(), "description")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(options.len(), 2);
        assert!(resolver
            .would_orphan_specializations(&"n0".into())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn noop_commits_nothing() {
        let store = Arc::new(InMemoryStore::from_graph(chain(3)));
        let resolver = InheritanceResolver::new(Arc::clone(&store));
        let outcome = resolver
            .change_inheritance(&"n0".into(), "description", &"owner".into())
            .await
            .unwrap();
        assert!(outcome.is_noop());
        assert_eq!(store.commit_count(), 0);
    }
}
