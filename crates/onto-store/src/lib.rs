//! Onto Store
//!
//! The persistence seam consumed by the inheritance and diff planners.
//!
//! # Core Concepts
//!
//! - [`DocumentStore`]: get/query/commit over node documents
//! - [`TitleLookup`]: exact-title to id resolution
//! - [`ChangeLogSink`] / [`ContributorSink`]: fire-and-forget sinks
//! - [`WriteBatch`]: atomic commit unit with a maximum mutation count
//! - [`BatchWriter`]: splits a stream of updates into sequential commits
//! - [`InMemoryStore`]: reference implementation of every seam
//! - [`CachedTitleLookup`]: memoised title lookups
//!
//! # Example
//!
//! ```rust,ignore
//! use onto_store::{BatchWriter, InMemoryStore};
//!
//! let store = InMemoryStore::from_graph(graph).with_max_batch_mutations(500);
//! let mut writer = BatchWriter::new(&store);
//! for update in plan {
//!     writer.write(update).await?;
//! }
//! let stats = writer.finish().await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod batch;
mod cache;
mod config;
mod error;
mod memory;
mod traits;

pub use batch::{BatchWriter, CommitStats, WriteBatch};
pub use cache::CachedTitleLookup;
pub use config::StoreConfig;
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use traits::{ChangeLogSink, ContributorSink, DocumentStore, NodeQuery, TitleLookup};

/// Per-commit mutation limit of the hosted document store
pub const DEFAULT_MAX_BATCH_MUTATIONS: usize = 500;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
