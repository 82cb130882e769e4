//! JSON snapshot files
//!
//! A snapshot is a JSON array of node documents in the store's camelCase
//! wire format.

use crate::error::EditorError;
use onto_model::{Node, NodeChange, NodeGraph};
use serde::de::DeserializeOwned;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EditorError> {
    let text = std::fs::read_to_string(path).map_err(|source| EditorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Load a node snapshot
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_graph(path: impl AsRef<Path>) -> Result<NodeGraph, EditorError> {
    let nodes: Vec<Node> = read_json(path.as_ref())?;
    tracing::debug!(nodes = nodes.len(), path = %path.as_ref().display(), "snapshot loaded");
    Ok(NodeGraph::from_nodes(nodes))
}

/// Write a node snapshot
///
/// # Errors
/// Returns error if the file cannot be written
pub fn save_graph(graph: &NodeGraph, path: impl AsRef<Path>) -> Result<(), EditorError> {
    let path = path.as_ref();
    let nodes: Vec<&Node> = graph.iter().collect();
    let text = serde_json::to_string_pretty(&nodes)?;
    std::fs::write(path, text).map_err(|source| EditorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load change-log entries
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_changes(path: impl AsRef<Path>) -> Result<Vec<NodeChange>, EditorError> {
    read_json(path.as_ref())
}

/// Load any JSON document
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, EditorError> {
    read_json(path.as_ref())
}
