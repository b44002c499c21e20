//! On-disk cache record.
//!
//! The whole store is persisted as one JSON document of the form
//! `{"version": N, "entries": {id: entry}}`. A record whose version differs
//! from [`SCHEMA_VERSION`] is discarded exactly like a corrupt one.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use scribe_common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;
use crate::error::CacheError;

/// Current record schema version. Increment on breaking changes to
/// [`CacheEntry`] or the record layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Loaded form of the record. Entries stay generic until the version has
/// been checked, so a newer or older record is reported as a schema
/// mismatch rather than as garbage.
#[derive(Debug, Deserialize)]
struct CacheManifest {
    version: u32,
    #[serde(default)]
    entries: serde_json::Value,
}

/// Borrowed form of the record, used when saving. Entries are written in
/// identifier order so successive saves of the same store are byte-identical.
#[derive(Serialize)]
struct CacheManifestRef<'a> {
    version: u32,
    entries: BTreeMap<&'a DocumentId, &'a CacheEntry>,
}

/// Why a record on disk was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// The file exists but could not be read.
    Unreadable(String),
    /// The file is not a well-formed record.
    Corrupt(String),
    /// The record was written with a different schema version.
    SchemaMismatch {
        /// Version found in the file.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(reason) => write!(f, "unreadable: {reason}"),
            Self::Corrupt(reason) => write!(f, "corrupt: {reason}"),
            Self::SchemaMismatch { found, expected } => {
                write!(f, "schema version {found}, expected {expected}")
            }
        }
    }
}

/// Reads a record from `path`.
///
/// Returns `Ok(None)` if the file does not exist and `Err(reason)` if it
/// exists but cannot be used.
pub(crate) fn read_manifest(
    path: &Path,
) -> Result<Option<HashMap<DocumentId, CacheEntry>>, DiscardReason> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DiscardReason::Unreadable(e.to_string())),
    };

    let manifest: CacheManifest =
        serde_json::from_str(&content).map_err(|e| DiscardReason::Corrupt(e.to_string()))?;
    if manifest.version != SCHEMA_VERSION {
        return Err(DiscardReason::SchemaMismatch {
            found: manifest.version,
            expected: SCHEMA_VERSION,
        });
    }

    let entries = HashMap::<DocumentId, CacheEntry>::deserialize(manifest.entries)
        .map_err(|e| DiscardReason::Corrupt(e.to_string()))?;
    Ok(Some(entries))
}

/// Writes a record to `path`, creating missing parent directories.
///
/// The record is written to a sibling temporary file and renamed into
/// place, so an interrupted save leaves the previous record intact.
pub(crate) fn write_manifest(
    path: &Path,
    entries: &HashMap<DocumentId, CacheEntry>,
) -> Result<(), CacheError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let manifest = CacheManifestRef {
        version: SCHEMA_VERSION,
        entries: entries.iter().collect(),
    };
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| CacheError::Serialization {
        reason: e.to_string(),
    })?;

    let tmp = temp_path(path);
    std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
