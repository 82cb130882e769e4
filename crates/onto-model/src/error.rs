//! Error types for graph operations

use crate::ids::NodeId;

/// Errors raised by [`crate::NodeGraph`] edits and checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Node missing or soft-deleted
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node linked to itself
    #[error("node cannot generalize itself: {0}")]
    SelfLoop(NodeId),

    /// Edge would close a specialization cycle
    #[error("linking {generalization} -> {specialization} would create a cycle")]
    CycleDetected {
        generalization: NodeId,
        specialization: NodeId,
    },

    /// Snapshot already contains a cycle through this node
    #[error("specialization cycle through {0}")]
    CyclicSnapshot(NodeId),
}
