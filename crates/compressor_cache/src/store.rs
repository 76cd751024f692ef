//! Storage of combined output files under the static root.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::manifest::MANIFEST_FILE;

/// Writes combined output files beneath a static root.
///
/// Output paths are relative to the root, e.g. `CACHE/css/1ff892c21b66.css`.
/// Because file names carry a content hash, an existing file is never rewritten.
pub struct OutputStore {
    /// The static root.
    root: PathBuf,
}

impl OutputStore {
    /// Creates a store rooted at the given static root.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Returns the absolute path for an output path relative to the root.
    pub fn path_of(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Returns `true` if the output file already exists.
    pub fn exists(&self, relative: &Path) -> bool {
        self.path_of(relative).is_file()
    }

    /// Writes `data` to `relative` unless the file already exists.
    ///
    /// Returns `true` if a file was written. Parent directories are created
    /// as needed. The data lands in a temp file first and is then persisted
    /// into place, so readers never observe a partial file.
    pub fn write_if_absent(&self, relative: &Path, data: &[u8]) -> Result<bool, CacheError> {
        let path = self.path_of(relative);
        if path.exists() {
            return Ok(false);
        }
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        std::fs::create_dir_all(&dir).map_err(CacheError::io(&dir))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(CacheError::io(&dir))?;
        tmp.write_all(data).map_err(CacheError::io(tmp.path()))?;
        tmp.persist(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e.error,
        })?;
        Ok(true)
    }

    /// Removes files under `dir` (relative to the root) that are not in `live`.
    ///
    /// `live` holds root-relative paths. The manifest file is always kept.
    /// Returns the number of files removed.
    pub fn gc(&self, dir: &Path, live: &HashSet<PathBuf>) -> Result<usize, CacheError> {
        let base = self.path_of(dir);
        if !base.is_dir() {
            return Ok(0);
        }
        let mut files = Vec::new();
        collect_files(&base, &mut files)?;

        let mut removed = 0;
        for path in files {
            if path.file_name().is_some_and(|n| n == MANIFEST_FILE) {
                continue;
            }
            let relative = path.strip_prefix(&self.root).unwrap_or(&path);
            if live.contains(relative) {
                continue;
            }
            std::fs::remove_file(&path).map_err(CacheError::io(&path))?;
            tracing::debug!(path = %path.display(), "removed unreferenced output");
            removed += 1;
        }
        Ok(removed)
    }
}

/// Recursively collects every regular file under `dir`.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CacheError> {
    for entry in std::fs::read_dir(dir).map_err(CacheError::io(dir))? {
        let path = entry.map_err(CacheError::io(dir))?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
