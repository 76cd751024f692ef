//! Content hashing for cache keys and cache-busted filenames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hex characters kept by [`ContentHash::short`].
pub const SHORT_HASH_LEN: usize = 12;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to be identical. The
/// short form names combined output files, so any change to the combined
/// content yields a new URL.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_be_bytes())
    }

    /// Computes a content hash over several parts as if they were concatenated.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.digest128().to_be_bytes())
    }

    /// Returns the first [`SHORT_HASH_LEN`] hex characters of the digest.
    pub fn short(&self) -> String {
        let mut s = self.to_string();
        s.truncate(SHORT_HASH_LEN);
        s
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
        write!(f, "ContentHash({})", self.short())
    }
}
