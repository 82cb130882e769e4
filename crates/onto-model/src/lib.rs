//! Onto Model
//!
//! Typed representation of an ontology graph as stored in the document
//! store, plus an immutable snapshot arena used by the planners.
//!
//! # Core Concepts
//!
//! - [`Node`]: A typed node with properties, inheritance rules and links
//! - [`Collection`]: Named bucket of [`Link`]s (relationship-valued data)
//! - [`InheritanceRule`]: Where a node reads a property from
//! - [`NodeGraph`]: Snapshot of nodes indexed by id, with cycle-safe walks
//! - [`NodeUpdate`]: Field-level mutations produced by planners
//! - [`NodeChange`]: Immutable change-log entry
//!
//! # Example
//!
//! ```rust,ignore
//! use onto_model::{Node, NodeGraph, NodeType};
//!
//! let mut graph = NodeGraph::new();
//! graph.insert(Node::new("act", "Act", NodeType::Activity));
//! graph.insert(Node::new("destroy", "Destroy", NodeType::Activity));
//! graph.link("act", "destroy", "main")?;
//!
//! assert_eq!(graph.descendants("act").len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod change;
mod error;
mod graph;
mod ids;
mod inheritance;
mod node;
mod update;

pub use change::{ChangeDetails, ChangeType, NodeChange};
pub use error::ModelError;
pub use graph::NodeGraph;
pub use ids::{ChangeLogId, NodeId};
pub use inheritance::{generate_inheritance, InheritanceRule, InheritanceType};
pub use node::{
    collection_ids, Collection, Link, Node, NodeType, PropertyType, PropertyValue,
    GENERALIZATIONS, MAIN_COLLECTION, SPECIALIZATIONS,
};
pub use update::{FieldUpdate, NodeUpdate};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn snapshot_round_trips_through_store_json() {
        let json = r#"{
            "act": {
                "id": "act",
                "title": "Act",
                "nodeType": "activity",
                "properties": { "description": "Do something" },
                "propertyType": { "description": "string" },
                "inheritance": {
                    "description": { "ref": null, "inheritanceType": "inheritUnlessAlreadyOverRidden" }
                },
                "specializations": [{ "collectionName": "main", "nodes": [{ "id": "destroy" }] }],
                "generalizations": []
            },
            "destroy": {
                "id": "destroy",
                "title": "Destroy",
                "nodeType": "activity",
                "properties": { "description": "Do something" },
                "propertyType": { "description": "string" },
                "inheritance": {
                    "description": { "ref": "act", "inheritanceType": "inheritUnlessAlreadyOverRidden" }
                },
                "specializations": [],
                "generalizations": [{ "collectionName": "main", "nodes": [{ "id": "act" }] }]
            }
        }"#;

        let graph: NodeGraph = serde_json::from_str(json).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.descendants("act"), vec![NodeId::from("destroy")]);
        assert_eq!(
            graph.resolve_value("destroy", "description"),
            Some(&PropertyValue::Text("Do something".to_string()))
        );

        let back = serde_json::to_value(&graph).unwrap();
        assert_eq!(back["destroy"]["inheritance"]["description"]["ref"], "act");
    }
}
