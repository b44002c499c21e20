//! The persistent document → result store.
//!
//! `CacheStore` owns every [`CacheEntry`] for one corpus and configuration.
//! It is constructed by the driver and shared by reference with workers:
//! reads take a shared lock and never block each other, writes are
//! serialized behind an exclusive lock.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use scribe_common::{ContentHash, DocumentId};
use tracing::{debug, warn};

use crate::entry::{AnalysisIdentity, CacheEntry, Finding};
use crate::error::CacheError;
use crate::graph::DependencyGraph;
use crate::hasher::{ChangeSet, SourceHasher};
use crate::manifest::{read_manifest, write_manifest, DiscardReason};

/// What [`CacheStore::load`] found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No record exists yet; the store is empty.
    Missing,
    /// A valid record was loaded with this many entries.
    Loaded(usize),
    /// A record exists but was unusable; the store is empty.
    Discarded(DiscardReason),
}

/// Result of asking the store for a document's cached findings.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The stored entry is valid; these findings may be reused verbatim.
    Hit(Vec<Finding>),
    /// The document must be analyzed again.
    Miss,
}

/// Persistent mapping from document identifier to cached analysis result.
pub struct CacheStore {
    /// Backing file for this store.
    path: PathBuf,

    /// All entries, guarded for single-writer / multi-reader access.
    entries: RwLock<HashMap<DocumentId, CacheEntry>>,
}

impl CacheStore {
    /// Creates an empty store backed by `path`. Nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a store backed by `path` and loads any existing record.
    ///
    /// This is fail-safe: a missing, corrupt or outdated record results in
    /// an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        store.load();
        store
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory contents with the record on disk.
    ///
    /// Never fails. Corruption and schema mismatches are logged and leave
    /// the store empty. Self-references in a loaded record are dropped, as
    /// in [`set`](Self::set).
    pub fn load(&self) -> LoadOutcome {
        let (loaded, outcome) = match read_manifest(&self.path) {
            Ok(Some(mut entries)) => {
                for (id, entry) in entries.iter_mut() {
                    entry.references.remove(id);
                }
                let count = entries.len();
                debug!(path = %self.path.display(), entries = count, "loaded cache record");
                (entries, LoadOutcome::Loaded(count))
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no cache record, starting empty");
                (HashMap::new(), LoadOutcome::Missing)
            }
            Err(reason) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "discarding unusable cache record, starting empty"
                );
                (HashMap::new(), LoadOutcome::Discarded(reason))
            }
        };
        *self.entries.write() = loaded;
        outcome
    }

    /// Writes a snapshot of every entry to the backing file.
    ///
    /// Missing parent directories are created. The shared lock is held for
    /// the duration, so no write can interleave with serialization.
    pub fn save(&self) -> Result<(), CacheError> {
        let entries = self.entries.read();
        write_manifest(&self.path, &entries)?;
        debug!(path = %self.path.display(), entries = entries.len(), "saved cache record");
        Ok(())
    }

    /// Returns a copy of the entry for `id`, if any.
    pub fn get(&self, id: &DocumentId) -> Option<CacheEntry> {
        self.entries.read().get(id).cloned()
    }

    /// Stores `entry` under `id`, replacing any previous entry wholesale.
    ///
    /// A reference from the document to itself is dropped.
    pub fn set(&self, id: DocumentId, mut entry: CacheEntry) {
        entry.references.remove(&id);
        self.entries.write().insert(id, entry);
    }

    /// Removes and returns the entry for `id`.
    pub fn delete(&self, id: &DocumentId) -> Option<CacheEntry> {
        self.entries.write().remove(id)
    }

    /// Returns `true` if an entry exists for `id`.
    pub fn has(&self, id: &DocumentId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns `true` only if an entry exists for `id` and its content,
    /// analyzer and configuration hashes all equal the given ones.
    pub fn is_valid(
        &self,
        id: &DocumentId,
        content_hash: &ContentHash,
        analyzer_version_hash: &ContentHash,
        config_hash: &ContentHash,
    ) -> bool {
        self.entries
            .read()
            .get(id)
            .is_some_and(|e| e.matches(content_hash, analyzer_version_hash, config_hash))
    }

    /// Deletes every entry that transitively references `id`.
    ///
    /// The reverse graph is rebuilt from the stored reference sets under
    /// the write lock. Returns the removed identifiers in breadth-first
    /// order, each exactly once. The entry for `id` itself is left alone;
    /// removing it is up to the caller.
    pub fn invalidate_dependents(&self, id: &DocumentId) -> Vec<DocumentId> {
        let mut entries = self.entries.write();
        let graph = DependencyGraph::from_forward(
            entries.iter().map(|(doc, entry)| (doc, &entry.references)),
        );
        let removed: Vec<DocumentId> = graph
            .transitive_dependents(id)
            .into_iter()
            .filter(|dependent| entries.remove(dependent).is_some())
            .collect();
        if !removed.is_empty() {
            debug!(document = %id, removed = removed.len(), "invalidated dependents");
        }
        removed
    }

    /// Returns a point-in-time copy of every entry, in unspecified order.
    pub fn entries(&self) -> Vec<(DocumentId, CacheEntry)> {
        self.entries
            .read()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    /// Compares current content hashes against the stored entries.
    pub fn detect_changes(&self, current: &HashMap<DocumentId, ContentHash>) -> ChangeSet {
        SourceHasher::detect_changes(current, &self.entries.read())
    }

    /// Drops entries for documents not in `live`, returning their ids sorted.
    pub fn retain(&self, live: &HashSet<DocumentId>) -> Vec<DocumentId> {
        let mut entries = self.entries.write();
        let mut removed: Vec<DocumentId> = entries
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        for id in &removed {
            entries.remove(id);
        }
        removed.sort();
        if !removed.is_empty() {
            debug!(removed = removed.len(), "dropped entries outside the corpus");
        }
        removed
    }

    /// Returns the cached findings for `id` if its entry is still valid.
    pub fn lookup(
        &self,
        id: &DocumentId,
        content_hash: &ContentHash,
        identity: &AnalysisIdentity,
    ) -> Lookup {
        match self.entries.read().get(id) {
            Some(entry)
                if entry.matches(
                    content_hash,
                    &identity.analyzer_version_hash,
                    &identity.config_hash,
                ) =>
            {
                Lookup::Hit(entry.results.clone())
            }
            _ => Lookup::Miss,
        }
    }

    /// Stores freshly computed findings for `id`, stamped with the current time.
    pub fn record(
        &self,
        id: DocumentId,
        content_hash: ContentHash,
        identity: AnalysisIdentity,
        results: Vec<Finding>,
        references: BTreeSet<DocumentId>,
    ) {
        self.set(id, CacheEntry::new(content_hash, identity, results, references));
    }
}
