//! Onto Core - ontology editor facade
//!
//! The entry point for applications:
//! - Repoints inheritance and cascades it to dependent specializations
//! - Links and unlinks generalizations, propagating inherited properties
//! - Compares and accepts improvements, writing the change log
//! - Loads configuration and installs tracing
//!
//! # Example
//!
//! ```rust,ignore
//! use onto_core::{EditorConfig, OntologyEditor};
//! use onto_store::InMemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EditorConfig::from_file("onto.toml")?;
//! onto_core::telemetry::init(&config.log_filter);
//!
//! let store = Arc::new(InMemoryStore::from_graph(onto_core::snapshot::load_graph("graph.json")?));
//! let editor = OntologyEditor::new(store, config);
//!
//! let outcome = editor
//!     .change_inheritance(&"destroy".into(), "description", &"harm".into())
//!     .await?;
//! println!("{} nodes updated", outcome.nodes_updated());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod editor;
pub mod error;
pub mod snapshot;
pub mod telemetry;

pub use config::EditorConfig;
pub use editor::{AcceptedImprovement, CheckReport, EditOutcome, OntologyEditor, OntologyStore};
pub use error::EditorError;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Onto Core
    pub use crate::{EditorConfig, EditorError, OntologyEditor};
    pub use onto_diff::{Improvement, PropertyDiff, ProposedValue, TitleCollection};
    pub use onto_inheritance::CascadeOutcome;
    pub use onto_model::{Collection, Link, Node, NodeChange, NodeGraph, NodeId, NodeType, PropertyValue};
    pub use onto_store::InMemoryStore;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
