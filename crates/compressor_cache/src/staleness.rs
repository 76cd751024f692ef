//! Staleness checks based on file modification times.

use std::path::{Path, PathBuf};

use compressor_common::Mtime;

use crate::error::CacheError;

/// Returns where a compiler is expected to write the CSS for `source`.
///
/// The compiled file sits next to its source with a `.css` extension.
pub fn compiled_path(source: &Path) -> PathBuf {
    source.with_extension("css")
}

/// Returns `true` when `compiled` must be regenerated from `source`.
///
/// That is the case when the compiled file is missing, or when the source
/// was modified after it. An unreadable source time counts as stale so the
/// compiler gets a chance to report the real problem.
pub fn needs_recompile(source: &Path, compiled: &Path) -> bool {
    let Ok(compiled_time) = Mtime::of(compiled) else {
        return true;
    };
    match Mtime::of(source) {
        Ok(source_time) => source_time > compiled_time,
        Err(_) => true,
    }
}

/// Returns the newest modification time among `paths`.
///
/// Returns `Ok(None)` for an empty list. A missing file is an error.
pub fn newest_mtime<'a>(
    paths: impl IntoIterator<Item = &'a Path>,
) -> Result<Option<Mtime>, CacheError> {
    let times = paths
        .into_iter()
        .map(|path| Mtime::of(path).map_err(CacheError::io(path)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Mtime::newest(times))
}
