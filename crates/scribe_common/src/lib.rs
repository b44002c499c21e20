//! Shared foundational types used across the Scribe incremental analyzer.
//!
//! This crate provides content hashing for documents, analyzer identities and
//! configuration, canonical document identifiers, and the error raised for
//! inputs that cannot be keyed.

#![warn(missing_docs)]

pub mod doc_id;
pub mod error;
mod finite;
pub mod hash;

pub use doc_id::DocumentId;
pub use error::InvalidInputError;
pub use hash::{hash_analyzer_version, hash_config, hash_content, hash_value, ContentHash};
