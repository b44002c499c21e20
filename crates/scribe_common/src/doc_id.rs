//! Canonical identifiers for documents in an analyzed corpus.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::InvalidInputError;

/// Normalized, corpus-relative identifier of one document.
///
/// Different spellings of the same location (`./a/../b.md`, `b.md`,
/// `b.md/`, `.\b.md`) collapse to the same `DocumentId`. Segments are joined
/// with `/` regardless of platform, so identifiers are stable across
/// machines and safe to persist.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates an identifier from a corpus-relative path string.
    ///
    /// A leading `/` is treated as the corpus root. Fails if the path is
    /// empty after normalization or climbs above the root.
    pub fn new(raw: &str) -> Result<Self, InvalidInputError> {
        normalize(raw).map(Self)
    }

    /// Creates an identifier for a filesystem path under `root`.
    ///
    /// Relative paths are taken as already relative to the corpus root.
    pub fn from_path(root: &Path, path: &Path) -> Result<Self, InvalidInputError> {
        let relative = if path.is_relative() {
            path
        } else {
            path.strip_prefix(root)
                .map_err(|_| InvalidInputError::OutsideRoot {
                    path: path.display().to_string(),
                    root: root.display().to_string(),
                })?
        };
        Self::new(&relative.to_string_lossy())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the directory part of this identifier, or `""` at the root.
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(dir, _)| dir)
    }

    /// Resolves a link target as written inside this document.
    ///
    /// Targets starting with `/` resolve from the corpus root, anything
    /// else from this document's directory.
    pub fn resolve(&self, target: &str) -> Result<Self, InvalidInputError> {
        if target.starts_with('/') {
            return Self::new(target);
        }
        let parent = self.parent();
        if parent.is_empty() {
            Self::new(target)
        } else {
            Self::new(&format!("{parent}/{target}"))
        }
    }
}

fn normalize(raw: &str) -> Result<String, InvalidInputError> {
    let unified = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(InvalidInputError::EscapesRoot(raw.to_string()));
                }
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return Err(InvalidInputError::EmptyDocumentId);
    }
    Ok(segments.join("/"))
}

impl FromStr for DocumentId {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = InvalidInputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({:?})", self.0)
    }
}
