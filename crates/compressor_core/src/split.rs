//! Splitting an HTML block into the hunks that make up its combined output.

use std::path::{Component, Path, PathBuf};

use compressor_cache::{compiled_path, needs_recompile};
use compressor_config::Settings;

use crate::compile::{compile, compile_inline};
use crate::error::CompressError;
use crate::markup::{scan, Element};

/// Where a hunk's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkSource {
    /// A file under the static root.
    File(PathBuf),
    /// Content written inline in the block.
    Inline(String),
}

/// One source asset found in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// The content or the file it lives in.
    pub source: HunkSource,
    /// Source text of the element, as emitted when compression is disabled.
    pub element: String,
    /// The element's `media` attribute.
    pub media: Option<String>,
}

impl Hunk {
    /// Returns the file behind this hunk, if it is not inline.
    pub fn filename(&self) -> Option<&Path> {
        match &self.source {
            HunkSource::File(path) => Some(path.as_path()),
            HunkSource::Inline(_) => None,
        }
    }

    /// Returns the hunk's content, reading it from disk for file hunks.
    pub fn read(&self) -> Result<String, CompressError> {
        match &self.source {
            HunkSource::File(path) => {
                std::fs::read_to_string(path).map_err(CompressError::io(path))
            }
            HunkSource::Inline(data) => Ok(data.clone()),
        }
    }
}

/// Maps a public URL to a file under `root`.
///
/// The URL must start with `media_url`. Query strings and fragments are
/// ignored. `.` and `..` segments are resolved, and a path that would leave
/// `root` through `..` is rejected.
pub fn get_filename(url: &str, media_url: &str, root: &Path) -> Result<PathBuf, CompressError> {
    let uncompressable = || CompressError::UncompressableFile {
        url: url.to_string(),
        prefix: media_url.to_string(),
    };

    let rest = url.strip_prefix(media_url).ok_or_else(uncompressable)?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);

    let mut relative = PathBuf::new();
    for component in Path::new(rest.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => relative.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(uncompressable());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(uncompressable()),
        }
    }
    Ok(root.join(relative))
}

/// Splits a CSS block into hunks.
///
/// Linked stylesheets in a compiled dialect are recompiled when stale and
/// replaced by their `.css` output. Inline `<style>` elements in a dialect are
/// compiled through a scratch directory.
pub fn split_css(
    content: &str,
    settings: &Settings,
    media_url: &str,
) -> Result<Vec<Hunk>, CompressError> {
    let mut hunks = Vec::new();
    for elem in scan(content) {
        match elem.name.as_str() {
            "link" if is_stylesheet(&elem) => {
                let Some(href) = elem.attr("href") else {
                    continue;
                };
                let Some(filename) = resolve(href, settings, media_url)? else {
                    continue;
                };
                hunks.push(linked_stylesheet(&elem, filename, settings)?);
            }
            "style" => hunks.push(inline_stylesheet(&elem, settings)?),
            _ => {}
        }
    }
    Ok(hunks)
}

/// Splits a JavaScript block into hunks.
pub fn split_js(
    content: &str,
    settings: &Settings,
    media_url: &str,
) -> Result<Vec<Hunk>, CompressError> {
    let mut hunks = Vec::new();
    for elem in scan(content).into_iter().filter(|e| e.name == "script") {
        let source = match elem.attr("src") {
            Some(src) => match resolve(src, settings, media_url)? {
                Some(filename) => HunkSource::File(filename),
                None => continue,
            },
            None => HunkSource::Inline(elem.inner.clone().unwrap_or_default()),
        };
        hunks.push(Hunk {
            source,
            element: elem.text,
            media: None,
        });
    }
    Ok(hunks)
}

/// Resolves a linked URL. Off-site files are an error in debug mode and are
/// dropped otherwise.
fn resolve(url: &str, settings: &Settings, media_url: &str) -> Result<Option<PathBuf>, CompressError> {
    match get_filename(url, media_url, &settings.root) {
        Ok(filename) => Ok(Some(filename)),
        Err(e) if settings.debug => Err(e),
        Err(e) => {
            tracing::warn!("{e}; dropping it from the block");
            Ok(None)
        }
    }
}

fn is_stylesheet(elem: &Element) -> bool {
    elem.attr("rel").is_some_and(|rel| {
        rel.split_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

fn linked_stylesheet(
    elem: &Element,
    filename: PathBuf,
    settings: &Settings,
) -> Result<Hunk, CompressError> {
    let media = elem.attr("media").map(str::to_string);
    let ext = filename
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let Some(compiler) = settings.compiler_for(&ext) else {
        return Ok(Hunk {
            source: HunkSource::File(filename),
            element: elem.text.clone(),
            media,
        });
    };

    let compiled = compiled_path(&filename);
    if needs_recompile(&filename, &compiled) {
        tracing::info!(source = %filename.display(), "compiling stylesheet");
        compile(&filename.with_extension(""), compiler)?;
    } else {
        tracing::debug!(source = %filename.display(), "compiled stylesheet is up to date");
    }

    let basename = filename
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let element = elem
        .text
        .replace(&format!("{basename}{ext}"), &format!("{basename}.css"));
    Ok(Hunk {
        source: HunkSource::File(compiled),
        element,
        media,
    })
}

fn inline_stylesheet(elem: &Element, settings: &Settings) -> Result<Hunk, CompressError> {
    let data = elem.inner.clone().unwrap_or_default();
    let media = elem.attr("media").map(str::to_string);
    let kind = elem.attr("type").unwrap_or_default().trim().to_ascii_lowercase();

    if kind.is_empty() || kind == "text/css" {
        return Ok(Hunk {
            source: HunkSource::Inline(data),
            element: elem.text.clone(),
            media,
        });
    }

    let subtype = kind.rsplit('/').next().unwrap_or(&kind);
    let ext = format!(".{subtype}");
    let compiler = settings
        .compiler_for(&ext)
        .ok_or_else(|| CompressError::NoCompiler { ext: ext.clone() })?;
    let css = compile_inline(&data, &ext, compiler)?;
    Ok(Hunk {
        element: format!("<style type='text/css'>\n{css}\n</style>"),
        source: HunkSource::Inline(css),
        media,
    })
}
