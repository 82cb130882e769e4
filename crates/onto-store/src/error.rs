//! Error types for store operations

use onto_model::NodeId;

/// Errors surfaced by store implementations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Document does not exist
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// Batch holds more mutations than one commit allows
    #[error("batch of {size} mutations exceeds limit {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// Commit was rejected
    #[error("commit failed: {0}")]
    CommitFailed(String),

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if a caller-side retry may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CommitFailed(_) | Self::Unavailable(_))
    }
}
