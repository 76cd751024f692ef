//! Error types for the output cache.

use std::path::PathBuf;

/// Errors raised while reading or writing the output directory.
///
/// Loading the manifest through [`OutputManifest::load`](crate::OutputManifest::load)
/// never fails: a missing or corrupt manifest is a cache miss. Writing combined
/// files or the manifest does fail.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A combined file, a source file or the manifest could not be accessed.
    #[error("output cache I/O error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// `manifest.json` is not a valid manifest.
    #[error("corrupt output manifest: {reason}")]
    ManifestParse {
        /// What the JSON parser reported.
        reason: String,
    },

    /// The manifest could not be encoded as JSON.
    #[error("could not encode output manifest: {reason}")]
    Serialization {
        /// What the JSON encoder reported.
        reason: String,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CacheError::Io { path, source }
    }
}
