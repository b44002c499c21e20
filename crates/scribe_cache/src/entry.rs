//! Cached analysis results and their validity identity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use scribe_common::{ContentHash, DocumentId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One analyzer-defined finding.
///
/// The cache stores and replays findings without looking inside them; only
/// the analyzer and the driver know their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Finding(pub serde_json::Value);

impl Finding {
    /// Wraps any serializable analyzer record.
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(record).map(Self)
    }

    /// Decodes the finding back into the analyzer's own record type.
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }
}

/// The two identity digests that are shared by every document in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisIdentity {
    /// Digest of the analyzer name and version.
    pub analyzer_version_hash: ContentHash,
    /// Digest of the resolved configuration.
    pub config_hash: ContentHash,
}

/// Persisted analysis result for one document.
///
/// Entries are replaced wholesale on re-analysis and never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of the document content when it was analyzed.
    pub content_hash: ContentHash,

    /// Hash of the analyzer identity that produced `results`.
    pub analyzer_version_hash: ContentHash,

    /// Hash of the configuration in force for the analysis.
    pub config_hash: ContentHash,

    /// Findings in the order the analyzer produced them.
    pub results: Vec<Finding>,

    /// Other documents this document links to.
    pub references: BTreeSet<DocumentId>,

    /// When the entry was written.
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(
        content_hash: ContentHash,
        identity: AnalysisIdentity,
        results: Vec<Finding>,
        references: BTreeSet<DocumentId>,
    ) -> Self {
        Self {
            content_hash,
            analyzer_version_hash: identity.analyzer_version_hash,
            config_hash: identity.config_hash,
            results,
            references,
            timestamp: Utc::now(),
        }
    }

    /// Returns `true` if all three hashes match exactly.
    pub fn matches(
        &self,
        content_hash: &ContentHash,
        analyzer_version_hash: &ContentHash,
        config_hash: &ContentHash,
    ) -> bool {
        self.content_hash == *content_hash
            && self.analyzer_version_hash == *analyzer_version_hash
            && self.config_hash == *config_hash
    }
}
