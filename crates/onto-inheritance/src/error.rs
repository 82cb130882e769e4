//! Error types for inheritance planning and propagation

use onto_model::NodeId;
use onto_store::{CommitStats, StoreError};

/// Errors from inheritance operations
#[derive(Debug, thiserror::Error)]
pub enum InheritanceError {
    /// Node is missing or soft-deleted
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Reading the snapshot failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A batch commit failed mid-cascade; earlier batches stay committed
    #[error("commit failed after {} successful batches: {source}", committed.commits)]
    Commit {
        /// The underlying store error
        source: StoreError,
        /// Work committed before the failure
        committed: CommitStats,
    },
}

impl InheritanceError {
    /// Work already committed when the error occurred
    #[must_use]
    pub fn committed(&self) -> CommitStats {
        match self {
            Self::Commit { committed, .. } => *committed,
            _ => CommitStats::default(),
        }
    }
}

/// Internal failures of property propagation
///
/// Never escapes [`PropertyPropagator::get_new_added_properties`]; surfaced
/// only by the `try_` variant.
///
/// [`PropertyPropagator::get_new_added_properties`]: crate::PropertyPropagator::get_new_added_properties
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropagationError {
    /// Added link names the specialization itself
    #[error("node {0} cannot generalize itself")]
    SelfLink(NodeId),

    /// Added generalization already sits below the specialization
    #[error("linking {generalization} above {specialization} would create a cycle")]
    CyclicLink {
        generalization: NodeId,
        specialization: NodeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_error_reports_progress() {
        let err = InheritanceError::Commit {
            source: StoreError::CommitFailed("quota".into()),
            committed: CommitStats {
                commits: 2,
                mutations: 1000,
            },
        };
        assert_eq!(
            err.to_string(),
            "commit failed after 2 successful batches: commit failed: quota"
        );
        assert_eq!(err.committed().mutations, 1000);
    }

    #[test]
    fn other_errors_report_no_progress() {
        let err = InheritanceError::NodeNotFound("n".into());
        assert_eq!(err.committed(), CommitStats::default());
    }
}
