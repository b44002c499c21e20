//! One incremental analysis pass over a corpus.
//!
//! The pass runs in three phases:
//!
//! 1. Prepare (parallel, read-only): hash each document, extract its
//!    references and look up a reusable entry.
//! 2. Invalidate (serial): drop the entries of documents that left the
//!    corpus, then, for every removed document and every miss, drop the
//!    stored entries of all transitive dependents. Dependents that are part
//!    of this run become stale even if their own lookup hit.
//! 3. Analyze (parallel): run the analyzer on every stale document and
//!    record a fresh entry.
//!
//! The store is not saved here. The caller saves once the pass returns, so
//! no writer is in flight during serialization.

use std::collections::{BTreeSet, HashSet};

use rayon::prelude::*;
use scribe_common::{hash_analyzer_version, hash_config, hash_content, ContentHash, DocumentId};
use serde::Serialize;
use tracing::debug;

use crate::entry::{AnalysisIdentity, Finding};
use crate::error::CacheError;
use crate::references::extract_references;
use crate::store::{CacheStore, Lookup};

/// The external unit of work that produces findings for a document.
///
/// The cache never interprets findings; it only needs the analyzer's
/// identity so that an upgrade invalidates every stored result.
pub trait Analyzer: Sync {
    /// Stable analyzer name.
    fn name(&self) -> &str;

    /// Analyzer version. Any change invalidates all cached results.
    fn version(&self) -> &str;

    /// Analyzes one document body.
    fn analyze(&self, id: &DocumentId, body: &str) -> Vec<Finding>;
}

impl AnalysisIdentity {
    /// Derives the run identity from an analyzer and its resolved configuration.
    pub fn for_analyzer<A, C>(analyzer: &A, config: &C) -> Result<Self, CacheError>
    where
        A: Analyzer + ?Sized,
        C: Serialize + ?Sized,
    {
        Ok(Self {
            analyzer_version_hash: hash_analyzer_version(analyzer.name(), analyzer.version()),
            config_hash: hash_config(config)?,
        })
    }

    /// Derives the run identity from an analyzer and an already computed
    /// configuration digest.
    pub fn with_config_hash<A: Analyzer + ?Sized>(analyzer: &A, config_hash: ContentHash) -> Self {
        Self {
            analyzer_version_hash: hash_analyzer_version(analyzer.name(), analyzer.version()),
            config_hash,
        }
    }
}

/// A document supplied by the driver.
#[derive(Debug, Clone)]
pub struct Document {
    /// Canonical identifier.
    pub id: DocumentId,
    /// Full text content.
    pub body: String,
}

impl Document {
    /// Creates a document from an identifier and body.
    pub fn new(id: DocumentId, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }
}

/// Findings for one document and whether they came from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    /// The document.
    pub id: DocumentId,
    /// Findings, in analyzer order.
    pub findings: Vec<Finding>,
    /// `true` if the findings were replayed from the store.
    pub cached: bool,
}

/// Summary of an incremental pass.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One outcome per input document, in input order.
    pub outcomes: Vec<DocumentOutcome>,
    /// Entries of documents no longer in the corpus, sorted.
    pub removed: Vec<DocumentId>,
    /// Entries removed by transitive invalidation, in removal order.
    pub invalidated: Vec<DocumentId>,
}

impl RunReport {
    /// Number of documents served from the cache.
    pub fn cached_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.cached).count()
    }

    /// Number of documents that were analyzed.
    pub fn analyzed_count(&self) -> usize {
        self.outcomes.len() - self.cached_count()
    }
}

struct Prepared {
    content_hash: ContentHash,
    references: BTreeSet<DocumentId>,
    cached: Lookup,
}

/// Drives one pass of an analyzer over a corpus, consulting `store`.
pub struct IncrementalRun<'a, A: Analyzer + ?Sized> {
    store: &'a CacheStore,
    analyzer: &'a A,
    identity: AnalysisIdentity,
    reuse: bool,
}

impl<'a, A: Analyzer + ?Sized> IncrementalRun<'a, A> {
    /// Prepares a pass. Fails if `config` cannot be hashed.
    pub fn new<C: Serialize + ?Sized>(
        store: &'a CacheStore,
        analyzer: &'a A,
        config: &C,
    ) -> Result<Self, CacheError> {
        let identity = AnalysisIdentity::for_analyzer(analyzer, config)?;
        Ok(Self::with_identity(store, analyzer, identity))
    }

    /// Prepares a pass with a precomputed identity.
    pub fn with_identity(store: &'a CacheStore, analyzer: &'a A, identity: AnalysisIdentity) -> Self {
        Self {
            store,
            analyzer,
            identity,
            reuse: true,
        }
    }

    /// When `false`, every document is analyzed; fresh entries are still recorded.
    pub fn reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    /// The identity entries are written with and validated against.
    pub fn identity(&self) -> AnalysisIdentity {
        self.identity
    }

    /// Runs the pass over `documents`.
    pub fn execute(&self, documents: &[Document]) -> RunReport {
        let prepared: Vec<Prepared> =
            documents.par_iter().map(|doc| self.prepare(doc)).collect();

        let mut stale: HashSet<&DocumentId> = documents
            .iter()
            .zip(&prepared)
            .filter(|(_, prepared)| prepared.cached == Lookup::Miss)
            .map(|(doc, _)| &doc.id)
            .collect();
        let in_corpus: HashSet<&DocumentId> = documents.iter().map(|doc| &doc.id).collect();

        let live: HashSet<DocumentId> = in_corpus.iter().map(|&id| id.clone()).collect();
        let removed = self.store.retain(&live);

        let misses = documents
            .iter()
            .zip(&prepared)
            .filter(|(_, prepared)| prepared.cached == Lookup::Miss)
            .map(|(doc, _)| &doc.id);
        let changed: Vec<&DocumentId> = removed.iter().chain(misses).collect();

        let mut invalidated = Vec::new();
        for id in changed {
            for dependent in self.store.invalidate_dependents(id) {
                if let Some(&known) = in_corpus.get(&dependent) {
                    stale.insert(known);
                }
                invalidated.push(dependent);
            }
        }

        let outcomes: Vec<DocumentOutcome> = documents
            .par_iter()
            .zip(prepared.into_par_iter())
            .map(|(doc, prepared)| self.finish(doc, prepared, stale.contains(&doc.id)))
            .collect();

        let report = RunReport {
            outcomes,
            removed,
            invalidated,
        };
        debug!(
            analyzer = self.analyzer.name(),
            cached = report.cached_count(),
            analyzed = report.analyzed_count(),
            removed = report.removed.len(),
            invalidated = report.invalidated.len(),
            "incremental pass finished"
        );
        report
    }

    fn prepare(&self, doc: &Document) -> Prepared {
        let content_hash = hash_content(doc.body.as_bytes());
        let references = extract_references(&doc.body, &doc.id);
        let cached = if self.reuse {
            self.store.lookup(&doc.id, &content_hash, &self.identity)
        } else {
            Lookup::Miss
        };
        Prepared {
            content_hash,
            references,
            cached,
        }
    }

    fn finish(&self, doc: &Document, prepared: Prepared, stale: bool) -> DocumentOutcome {
        if !stale {
            if let Lookup::Hit(findings) = prepared.cached {
                return DocumentOutcome {
                    id: doc.id.clone(),
                    findings,
                    cached: true,
                };
            }
        }
        let findings = self.analyzer.analyze(&doc.id, &doc.body);
        self.store.record(
            doc.id.clone(),
            prepared.content_hash,
            self.identity,
            findings.clone(),
            prepared.references,
        );
        DocumentOutcome {
            id: doc.id.clone(),
            findings,
            cached: false,
        }
    }
}
