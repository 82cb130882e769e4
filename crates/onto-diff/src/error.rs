//! Error types for change comparison

use onto_store::StoreError;

/// Errors from comparing properties
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// Resolving a proposed title failed
    #[error("title lookup failed for {title:?}: {source}")]
    Lookup {
        /// Title being resolved
        title: String,
        /// The underlying store error
        source: StoreError,
    },
}
