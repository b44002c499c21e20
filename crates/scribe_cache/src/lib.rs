//! Incremental analysis cache.
//!
//! This crate decides which documents of a corpus must be re-analyzed. It
//! stores each document's findings together with the content, analyzer and
//! configuration hashes they were computed under, tracks the links between
//! documents, and invalidates every transitive dependent of a changed
//! document.

#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod graph;
pub mod hasher;
pub mod incremental;
pub mod manifest;
pub mod references;
pub mod store;

pub use entry::{AnalysisIdentity, CacheEntry, Finding};
pub use error::CacheError;
pub use graph::{build_dependency_graph, DependencyGraph};
pub use hasher::{ChangeSet, SourceHasher};
pub use incremental::{Analyzer, Document, DocumentOutcome, IncrementalRun, RunReport};
pub use manifest::{DiscardReason, SCHEMA_VERSION};
pub use references::extract_references;
pub use store::{CacheStore, LoadOutcome, Lookup};
