//! High-level output cache.
//!
//! The `OutputCache` type ties together the manifest and the output store into
//! a single interface for the compressor. It handles loading or creating the
//! manifest, answering lookups with fresh records only, writing combined
//! files, and garbage collection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use compressor_common::Mtime;

use crate::error::CacheError;
use crate::manifest::{OutputManifest, OutputRecord};
use crate::store::OutputStore;

/// Cache of combined outputs for one static root.
pub struct OutputCache {
    /// The static root.
    root: PathBuf,

    /// Output directory, relative to the root. Holds the manifest.
    output_dir: PathBuf,

    /// The manifest of written outputs.
    manifest: OutputManifest,

    /// Writer for combined files.
    store: OutputStore,

    /// Tool version string for compatibility checks.
    version: String,
}

impl OutputCache {
    /// Loads an existing manifest or starts a fresh one.
    ///
    /// A manifest from another version, a corrupt one, or none at all all
    /// result in an empty cache.
    pub fn load_or_create(root: &Path, output_dir: &str, version: &str) -> Self {
        let output_dir = PathBuf::from(output_dir);
        let manifest = OutputManifest::load(&root.join(&output_dir))
            .filter(|m| m.is_compatible(version))
            .unwrap_or_else(|| OutputManifest::new(version));

        Self {
            root: root.to_path_buf(),
            output_dir,
            manifest,
            store: OutputStore::new(root),
            version: version.to_string(),
        }
    }

    /// Returns the record for `cache_key` if it can still be served.
    ///
    /// `current_newest` is the newest modification time among the block's
    /// source files right now.
    pub fn lookup(&self, cache_key: &str, current_newest: Option<Mtime>) -> Option<&OutputRecord> {
        let record = self.manifest.records.get(cache_key)?;
        if record.is_fresh(current_newest, &self.root) {
            tracing::debug!(key = cache_key, "output cache hit");
            Some(record)
        } else {
            tracing::debug!(key = cache_key, "output cache entry is stale");
            None
        }
    }

    /// Records an output, replacing any previous record with the same key.
    ///
    /// Older records of the same block are dropped, so their files become
    /// unreferenced and are removed by the next [`gc`](Self::gc).
    pub fn insert(&mut self, record: OutputRecord) {
        if !record.block_key.is_empty() {
            self.manifest.records.retain(|key, old| {
                let superseded = old.block_key == record.block_key && *key != record.cache_key;
                if superseded {
                    tracing::debug!(key = %key, "dropping superseded output record");
                }
                !superseded
            });
        }
        self.manifest.records.insert(record.cache_key.clone(), record);
    }

    /// Writes a combined file unless it already exists. See [`OutputStore::write_if_absent`].
    pub fn write_output(&self, relative: &Path, data: &[u8]) -> Result<bool, CacheError> {
        self.store.write_if_absent(relative, data)
    }

    /// Persists the manifest to the output directory.
    pub fn save(&self) -> Result<(), CacheError> {
        self.manifest.save(&self.root.join(&self.output_dir))
    }

    /// Returns the current manifest.
    pub fn manifest(&self) -> &OutputManifest {
        &self.manifest
    }

    /// Returns the version this cache was opened for.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Drops records whose file is gone and deletes files no record references.
    ///
    /// Returns the number of files removed.
    pub fn gc(&mut self) -> Result<usize, CacheError> {
        let root = &self.root;
        self.manifest
            .records
            .retain(|_, r| root.join(&r.output_path).is_file());

        let live: HashSet<PathBuf> = self
            .manifest
            .records
            .values()
            .map(|r| r.output_path.clone())
            .collect();
        self.store.gc(&self.output_dir, &live)
    }
}
