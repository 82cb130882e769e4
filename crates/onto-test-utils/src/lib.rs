//! Testing utilities for the Onto workspace
//!
//! Shared graph fixtures and store helpers.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use onto_model::{Collection, Node, NodeGraph, NodeType};
use onto_store::InMemoryStore;
use std::sync::Arc;

pub fn activity(id: &str, title: &str) -> Node {
    Node::new(id, title, NodeType::Activity)
}

/// Link `generalization -> specialization` in `collection`, panicking on a bad fixture
pub fn link(graph: &mut NodeGraph, generalization: &str, specialization: &str, collection: &str) {
    graph
        .link(generalization, specialization, collection)
        .unwrap_or_else(|e| panic!("fixture link {generalization} -> {specialization}: {e}"));
}

/// Destroy (node1) with specializations node4 "Destroy information" and
/// node5 "Destroy matter" under "Destroy what?"; node2 "Act" generalizes
/// node1 and owns the description, node3 "Harm" is a second generalization
pub fn destroy_graph() -> NodeGraph {
    let mut graph = NodeGraph::from_nodes([
        activity("node2", "Act").with_property("description", "string", "Do something."),
        activity("node3", "Harm")
            .with_property("description", "string", "Cause damage.")
            .with_property("severity", "number", 3.0),
        activity("node1", "Destroy")
            .with_property("description", "string", "Do something.")
            .inheriting("description", "node2"),
        activity("node4", "Destroy information")
            .with_property("description", "string", "Do something.")
            .inheriting("description", "node2"),
        activity("node5", "Destroy matter")
            .with_property("description", "string", "Erase matter."),
    ]);
    link(&mut graph, "node2", "node1", "main");
    link(&mut graph, "node3", "node1", "main");
    link(&mut graph, "node1", "node4", "Destroy what?");
    link(&mut graph, "node1", "node5", "Destroy what?");
    graph
}

/// `root -> n0 -> n1 -> ... -> n{len-1}`, every `n*` inheriting
/// `description` from `root`; `alt` is a second generalization of `n0`
pub fn chain(len: usize) -> NodeGraph {
    let mut graph = NodeGraph::from_nodes(
        [
            Node::new("root", "Root", NodeType::Concept)
                .with_property("description", "string", "root text"),
            Node::new("alt", "Alternative", NodeType::Concept)
                .with_property("description", "string", "alt text"),
        ]
        .into_iter()
        .chain((0..len).map(|i| {
            Node::new(format!("n{i}"), format!("Node {i}"), NodeType::Concept)
                .with_property("description", "string", "root text")
                .inheriting("description", "root")
        })),
    );
    if len > 0 {
        link(&mut graph, "root", "n0", "main");
        link(&mut graph, "alt", "n0", "main");
    }
    for i in 1..len {
        link(&mut graph, &format!("n{}", i - 1), &format!("n{i}"), "main");
    }
    graph
}

pub fn store(graph: NodeGraph) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::from_graph(graph))
}

pub fn collection(name: &str, ids: &[&str]) -> Collection {
    Collection::new(name, ids.iter().copied())
}
