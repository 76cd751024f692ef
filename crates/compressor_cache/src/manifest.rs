//! Output manifest that records every combined file written so far.
//!
//! The manifest is stored as `manifest.json` in the output directory. Each
//! record is keyed by the block's cache key and remembers where the combined
//! file lives, its fingerprint, the newest source time it was built from, and
//! the HTML tag that references it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use compressor_common::{AssetKind, ContentHash, Mtime};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the manifest file within the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Top-level manifest tracking all compiled-output records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputManifest {
    /// Tool version that produced this manifest. Invalidate on version change.
    pub version: String,

    /// Records keyed by cache key.
    pub records: BTreeMap<String, OutputRecord>,
}

/// A combined output file and what it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Cache key of the block that produced this output.
    pub cache_key: String,

    /// Identity of the block regardless of its source times. A newer output
    /// of the same block supersedes this one.
    #[serde(default)]
    pub block_key: String,

    /// Stylesheet or script.
    pub kind: AssetKind,

    /// Path of the combined file, relative to the static root.
    pub output_path: PathBuf,

    /// Public URL of the combined file.
    pub url: String,

    /// Fingerprint of the combined content.
    pub content_hash: ContentHash,

    /// Newest modification time among the source files, `None` for blocks
    /// made only of inline content.
    pub newest_source: Option<Mtime>,

    /// The HTML that replaces the block.
    pub rendered: String,
}

impl OutputRecord {
    /// Returns `true` if this record can still be served.
    ///
    /// The output file must exist under `root`, and the recorded source time
    /// must not be older than `current_newest`.
    pub fn is_fresh(&self, current_newest: Option<Mtime>, root: &Path) -> bool {
        if !root.join(&self.output_path).is_file() {
            return false;
        }
        match (self.newest_source, current_newest) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(recorded), Some(current)) => recorded >= current,
        }
    }
}

impl OutputManifest {
    /// Creates a new, empty manifest for the given tool version.
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            records: BTreeMap::new(),
        }
    }

    /// Loads the manifest from `dir`, returning `None` if the file doesn't
    /// exist or can't be parsed.
    ///
    /// Any error results in `None` (cache miss), triggering a rebuild.
    pub fn load(dir: &Path) -> Option<Self> {
        match Self::try_load(dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable output manifest");
                None
            }
        }
    }

    /// Loads the manifest from `dir`, reporting a corrupt file as an error.
    ///
    /// Returns `Ok(None)` when no manifest exists yet.
    pub fn try_load(dir: &Path) -> Result<Option<Self>, CacheError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(CacheError::io(&path))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::ManifestParse {
                reason: e.to_string(),
            })
    }

    /// Saves the manifest to `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(dir).map_err(CacheError::io(dir))?;
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(CacheError::io(&path))
    }

    /// Returns `true` if this manifest was produced by a compatible version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.version == current_version
    }
}
