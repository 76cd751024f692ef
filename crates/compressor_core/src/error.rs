//! Error types for compressing blocks.

use std::path::PathBuf;

use compressor_cache::CacheError;
use compressor_config::ConfigError;

/// Errors that can occur while splitting, compiling, filtering or writing a block.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    /// A linked asset is not served from the configured URL prefix.
    #[error("\"{url}\" is not in the compress url (\"{prefix}\") and can not be compressed")]
    UncompressableFile {
        /// The offending `href` or `src`.
        url: String,
        /// The configured URL prefix.
        prefix: String,
    },

    /// An element needs a compiler for an extension that has none configured.
    #[error("no compiler configured for '{ext}'")]
    NoCompiler {
        /// The extension, dot included.
        ext: String,
    },

    /// The compiler binary could not be found.
    #[error("compiler binary '{binary}' not found")]
    CompilerNotFound {
        /// The program that was looked up.
        binary: String,
    },

    /// The compiler exited unsuccessfully or produced no output.
    #[error("{message}")]
    CompilerFailed {
        /// The shell command that ran.
        command: String,
        /// The compiler's stderr, or a description of the failure.
        message: String,
    },

    /// A filter could not process its input.
    #[error("filter '{filter}' failed: {message}")]
    FilterFailed {
        /// Name of the filter.
        filter: &'static str,
        /// What went wrong.
        message: String,
    },

    /// A `{% compress %}` block is malformed.
    #[error("template syntax error: {0}")]
    TemplateSyntax(String),

    /// An I/O error on a source or output file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The output cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The configuration is unusable for the requested operation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CompressError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CompressError::Io { path, source }
    }
}
