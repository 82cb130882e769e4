//! Error types for the editor facade

use onto_diff::DiffError;
use onto_inheritance::InheritanceError;
use onto_model::{ModelError, NodeId};
use onto_store::StoreError;
use std::path::PathBuf;

/// Editor error type
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Node missing or soft-deleted
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Rejected structural edit
    #[error("invalid edit: {0}")]
    Model(#[from] ModelError),

    /// Store read failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Cascade planning or commit failed
    #[error("inheritance error: {0}")]
    Inheritance(#[from] InheritanceError),

    /// Improvement comparison failed
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid snapshot or change-log JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File access failed
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl EditorError {
    /// Whether retrying the same call may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Inheritance(InheritanceError::Store(e) | InheritanceError::Commit { source: e, .. }) => {
                e.is_retryable()
            }
            _ => false,
        }
    }
}
