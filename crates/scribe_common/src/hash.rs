//! Content hashing for cache invalidation and incremental analysis.
//!
//! Three digests decide whether a stored analysis result may be reused: the
//! document content, the analyzer identity, and the resolved configuration.
//! All of them are [`ContentHash`] values so they compare the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

use crate::error::InvalidInputError;
use crate::finite::check_finite;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to be identical.
/// Used to detect when documents, analyzer versions, or configuration have
/// changed and cached results must be recomputed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    fn from_digest(digest: u128) -> Self {
        Self(digest.to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Hashes raw document content.
pub fn hash_content(bytes: &[u8]) -> ContentHash {
    ContentHash::from_bytes(bytes)
}

/// Hashes an analyzer identity.
///
/// The name and version are length-prefixed so `("ab", "c")` and
/// `("a", "bc")` never collide.
pub fn hash_analyzer_version(name: &str, version: &str) -> ContentHash {
    let mut hasher = Xxh3::new();
    write_str(&mut hasher, name);
    write_str(&mut hasher, version);
    ContentHash::from_digest(hasher.digest128())
}

/// Hashes an arbitrary configuration value structurally.
///
/// The value is first converted to a generic tree. Object keys are hashed in
/// sorted order and arrays positionally, so two configurations that differ
/// only in key order produce the same digest. Values that have no generic
/// representation, such as maps keyed by tuples or NaN and infinite
/// numbers, are rejected.
pub fn hash_config<T: Serialize + ?Sized>(config: &T) -> Result<ContentHash, InvalidInputError> {
    check_finite(config)?;
    let value =
        serde_json::to_value(config).map_err(|e| InvalidInputError::Config(e.to_string()))?;
    Ok(hash_value(&value))
}

/// Hashes an already-generic configuration tree. See [`hash_config`].
pub fn hash_value(value: &Value) -> ContentHash {
    let mut hasher = Xxh3::new();
    write_value(&mut hasher, value);
    ContentHash::from_digest(hasher.digest128())
}

// Each node is written as a one-byte tag followed by a length-prefixed body,
// which keeps the encoding unambiguous across nesting levels.
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_NUMBER: u8 = 2;
const TAG_STRING: u8 = 3;
const TAG_ARRAY: u8 = 4;
const TAG_OBJECT: u8 = 5;

fn write_value(hasher: &mut Xxh3, value: &Value) {
    match value {
        Value::Null => hasher.update(&[TAG_NULL]),
        Value::Bool(b) => hasher.update(&[TAG_BOOL, u8::from(*b)]),
        Value::Number(n) => {
            hasher.update(&[TAG_NUMBER]);
            write_str(hasher, &n.to_string());
        }
        Value::String(s) => {
            hasher.update(&[TAG_STRING]);
            write_str(hasher, s);
        }
        Value::Array(items) => {
            hasher.update(&[TAG_ARRAY]);
            hasher.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                write_value(hasher, item);
            }
        }
        Value::Object(map) => {
            hasher.update(&[TAG_OBJECT]);
            hasher.update(&(map.len() as u64).to_le_bytes());
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                write_str(hasher, key);
                write_value(hasher, &map[key]);
            }
        }
    }
}

fn write_str(hasher: &mut Xxh3, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}
