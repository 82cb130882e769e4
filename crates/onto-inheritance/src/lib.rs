//! Onto Inheritance
//!
//! Keeps inheritance refs valid across structural edits.
//!
//! # Core Concepts
//!
//! - [`InheritancePlanner`]: pure plans over a [`NodeGraph`] snapshot
//! - [`Cascade`]: root changes plus per-property [`CascadeRule`]s for descendants
//! - [`PropertyPropagator`]: properties gained through new generalizations
//! - [`InheritanceResolver`]: plans against a store snapshot and commits in
//!   bounded batches
//!
//! # Example
//!
//! ```rust,ignore
//! use onto_inheritance::InheritanceResolver;
//!
//! let resolver = InheritanceResolver::new(store);
//! let outcome = resolver
//!     .change_inheritance(&node, "description", &new_generalization)
//!     .await?;
//! println!("{} nodes in {} commits", outcome.nodes_updated(), outcome.commits);
//! ```
//!
//! [`NodeGraph`]: onto_model::NodeGraph

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cascade;
mod error;
mod planner;
mod propagator;
mod resolver;

pub use cascade::{adopt_fields, can_adopt, Cascade, CascadeRule};
pub use error::{InheritanceError, PropagationError};
pub use planner::{GeneralizationOption, InheritancePlanner};
pub use propagator::{NewProperties, NewProperty, PropertyPropagator};
pub use resolver::{CascadeOutcome, InheritanceResolver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
