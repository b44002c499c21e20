//! Document hashing and change detection.
//!
//! Computes content hashes for documents and compares them against the
//! stored entries to identify which documents are new, modified, deleted,
//! or unchanged since the last run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use scribe_common::{hash_content, ContentHash, DocumentId};

use crate::entry::CacheEntry;
use crate::error::CacheError;

/// Result of comparing current document hashes against the stored entries.
///
/// Only content is compared here. Analyzer and configuration changes are
/// caught by [`CacheStore::is_valid`](crate::CacheStore::is_valid).
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Documents with no stored entry.
    pub new_files: Vec<DocumentId>,

    /// Documents whose content hash differs from the stored entry.
    pub modified_files: Vec<DocumentId>,

    /// Documents with a stored entry that are no longer in the corpus.
    pub deleted_files: Vec<DocumentId>,

    /// Documents whose content hash matches the stored entry.
    pub unchanged_files: Vec<DocumentId>,
}

impl ChangeSet {
    /// Returns `true` if there are no changes (no new, modified, or deleted documents).
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty()
    }

    /// Returns the total number of documents that need reanalysis (new + modified).
    pub fn dirty_count(&self) -> usize {
        self.new_files.len() + self.modified_files.len()
    }
}

/// Utility for computing content hashes of documents and detecting changes.
pub struct SourceHasher;

impl SourceHasher {
    /// Computes the content hash of a single file.
    ///
    /// A missing file is reported as [`CacheError::NotFound`].
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
        Ok(hash_content(&content))
    }

    /// Computes content hashes for every file, keyed by document identifier
    /// relative to `root`.
    ///
    /// Stops at the first file that cannot be read or identified.
    pub fn hash_files(
        root: &Path,
        paths: &[PathBuf],
    ) -> Result<HashMap<DocumentId, ContentHash>, CacheError> {
        let mut hashes = HashMap::with_capacity(paths.len());
        for path in paths {
            let id = DocumentId::from_path(root, path)?;
            let full = if path.is_relative() {
                root.join(path)
            } else {
                path.clone()
            };
            hashes.insert(id, Self::hash_file(&full)?);
        }
        Ok(hashes)
    }

    /// Compares current document hashes against stored entries.
    ///
    /// Every list in the result is sorted for deterministic output.
    pub fn detect_changes(
        current_hashes: &HashMap<DocumentId, ContentHash>,
        entries: &HashMap<DocumentId, CacheEntry>,
    ) -> ChangeSet {
        let mut changes = ChangeSet::default();

        for (id, hash) in current_hashes {
            match entries.get(id) {
                Some(entry) if entry.content_hash == *hash => {
                    changes.unchanged_files.push(id.clone());
                }
                Some(_) => changes.modified_files.push(id.clone()),
                None => changes.new_files.push(id.clone()),
            }
        }

        changes.deleted_files = entries
            .keys()
            .filter(|id| !current_hashes.contains_key(*id))
            .cloned()
            .collect();

        changes.new_files.sort();
        changes.modified_files.sort();
        changes.deleted_files.sort();
        changes.unchanged_files.sort();
        changes
    }
}
