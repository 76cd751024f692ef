//! Precompiling every stylesheet dialect under the static root.
//!
//! Slating compiles all sources up front and makes the generated `.css`
//! files writable for whoever compiles them on later requests, typically the
//! web server's user.

use std::path::{Path, PathBuf};

use compressor_config::{ConfigError, Settings};

use crate::compile::compile;
use crate::error::CompressError;

/// Ownership to give compiled files.
///
/// With neither set, compiled files are made world-writable instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlateOptions {
    /// New owner.
    pub uid: Option<u32>,
    /// New group.
    pub gid: Option<u32>,
}

impl SlateOptions {
    fn changes_ownership(&self) -> bool {
        self.uid.is_some() || self.gid.is_some()
    }
}

/// Result of a slate run.
#[derive(Debug, Default)]
pub struct SlateReport {
    /// The compiled `.css` files, in walk order.
    pub compiled: Vec<PathBuf>,
}

/// Compiles every file under the static root that has a configured compiler.
pub fn slate(settings: &Settings, options: SlateOptions) -> Result<SlateReport, CompressError> {
    if settings.compilers.is_empty() {
        return Err(ConfigError::ValidationError(
            "no compilers configured; add a [compilers] table to compressor.toml".to_string(),
        )
        .into());
    }

    tracing::info!(root = %settings.root.display(), "looking for slateable stylesheets");
    let mut sources = Vec::new();
    collect_sources(&settings.root, settings, &mut sources)?;
    tracing::info!(count = sources.len(), "found stylesheets to slate");

    let mut report = SlateReport::default();
    for (source, ext) in sources {
        let Some(compiler) = settings.compiler_for(&ext) else {
            continue;
        };
        tracing::debug!(source = %source.display(), "compiling");
        let css = compile(&source.with_extension(""), compiler)?;
        set_permissions(&css, options)?;
        report.compiled.push(css);
    }

    tracing::info!(compiled = report.compiled.len(), "finished slating");
    Ok(report)
}

/// Recursively collects `(path, extension)` for files with a configured compiler.
fn collect_sources(
    dir: &Path,
    settings: &Settings,
    out: &mut Vec<(PathBuf, String)>,
) -> Result<(), CompressError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(CompressError::io(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_sources(&path, settings, out)?;
            continue;
        }
        let Some(ext) = path.extension() else {
            continue;
        };
        let ext = format!(".{}", ext.to_string_lossy());
        if settings.compiler_for(&ext).is_some() {
            out.push((path, ext));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_permissions(css: &Path, options: SlateOptions) -> Result<(), CompressError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = if options.changes_ownership() {
        std::os::unix::fs::chown(css, options.uid, options.gid).map_err(CompressError::io(css))?;
        0o644
    } else {
        0o666
    };
    std::fs::set_permissions(css, std::fs::Permissions::from_mode(mode))
        .map_err(CompressError::io(css))
}

#[cfg(not(unix))]
fn set_permissions(_css: &Path, options: SlateOptions) -> Result<(), CompressError> {
    if options.changes_ownership() {
        return Err(ConfigError::ValidationError(
            "ownership changes are not supported on this platform".to_string(),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compressor_config::CompilerFormat;

    #[test]
    fn requires_compilers() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new("/media/", dir.path());
        let err = slate(&settings, SlateOptions::default()).unwrap_err();
        assert!(matches!(err, CompressError::Config(ConfigError::ValidationError(_))));
    }

    #[cfg(unix)]
    #[test]
    fn compiles_every_matching_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("css/nested")).unwrap();
        std::fs::write(root.join("top.ccss"), "a").unwrap();
        std::fs::write(root.join("css/nested/deep.ccss"), "b").unwrap();
        std::fs::write(root.join("css/plain.css"), "c").unwrap();

        let mut settings = Settings::new("/media/", root);
        settings.compilers.insert(
            ".ccss".to_string(),
            CompilerFormat {
                binary_path: "sh -c".to_string(),
                arguments: "'cp \"$0.ccss\" \"$0.css\"' *".to_string(),
            },
        );

        let report = slate(&settings, SlateOptions::default()).unwrap();
        assert_eq!(
            report.compiled,
            vec![root.join("css/nested/deep.css"), root.join("top.css")]
        );
        for css in &report.compiled {
            let mode = std::fs::metadata(css).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o666);
        }
        assert_eq!(std::fs::read_to_string(root.join("top.css")).unwrap(), "a");
    }

    #[cfg(unix)]
    #[test]
    fn compiler_failure_stops_slating() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.ccss"), "a").unwrap();
        let mut settings = Settings::new("/media/", dir.path());
        settings.compilers.insert(
            ".ccss".to_string(),
            CompilerFormat {
                binary_path: "false".to_string(),
                arguments: String::new(),
            },
        );
        let err = slate(&settings, SlateOptions::default()).unwrap_err();
        assert!(matches!(err, CompressError::CompilerFailed { .. }));
    }
}
