//! Onto Diff
//!
//! Compares live nodes against proposed improvements and turns accepted
//! differences into change-log entries.
//!
//! # Core Concepts
//!
//! - [`Improvement`]: a proposed edit naming related nodes by title; an
//!   explicit `null` clears a property
//! - [`comparable_properties`]: the live side of a comparison, link lists
//!   included
//! - [`ChangeComparator`]: per-property [`PropertyDiff`]s, resolving titles
//!   through a [`TitleLookup`]
//! - [`changes_from_diffs`]: accepted diffs as [`NodeChange`]s
//! - [`ChangeRecorder`]: best-effort writes to the change-log and contributor
//!   sinks
//! - [`change_description`]: the phrase shown for a change-log entry
//! - [`diff_collections`] / [`diff_sorted_collections`]: marked merges of
//!   collection lists for display
//!
//! # Example
//!
//! ```rust,ignore
//! use onto_diff::{changes_from_diffs, comparable_properties, ChangeComparator, ChangeRecorder};
//!
//! let diffs = ChangeComparator::new(lookup)
//!     .compare_properties(&comparable_properties(&node), &improvement.proposed_properties(), None)
//!     .await?;
//! let changes = changes_from_diffs(&node, &diffs, "alice", &improvement.reasoning);
//! ChangeRecorder::new(log, contributors).record_all(changes).await;
//! ```
//!
//! [`TitleLookup`]: onto_store::TitleLookup
//! [`NodeChange`]: onto_model::NodeChange

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod accept;
mod collections;
mod comparator;
mod description;
mod error;
mod proposal;
mod recorder;

pub use accept::{change_type_of, changes_from_diffs, update_from_diffs};
pub use collections::{
    diff_collections, diff_sorted_collections, ChangeKind, ChangeMark, MarkedCollection, MarkedLink,
};
pub use comparator::{ChangeComparator, PropertyDiff};
pub use description::change_description;
pub use error::DiffError;
pub use proposal::{
    comparable_properties, Improvement, ProposedProperties, ProposedValue, TitleCollection, TITLE,
};
pub use recorder::ChangeRecorder;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
