//! Compressing one block of markup.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use compressor_cache::{CacheError, OutputCache, OutputRecord, OutputStore};
use compressor_common::{AssetKind, ContentHash, Mtime};
use compressor_config::{normalize_url, Settings};
use regex::Regex;

use crate::error::CompressError;
use crate::filters::{apply_input, apply_output, build_chain, Filter};
use crate::split::{split_css, split_js, Hunk};

static SELF_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s?/>").expect("self-closing pattern is valid"));

/// Combines the stylesheets or scripts of one block into a single file.
///
/// Intermediate results are computed on first use and kept, so asking for
/// the hash and then the output splits and filters the block only once.
pub struct Compressor<'a> {
    kind: AssetKind,
    content: String,
    settings: &'a Settings,
    media_url: String,
    xhtml: bool,
    split: Option<Vec<Hunk>>,
    hunks: Option<Vec<String>>,
    combined: Option<String>,
}

impl<'a> Compressor<'a> {
    /// Creates a compressor for the markup in `content`.
    pub fn new(kind: AssetKind, content: impl Into<String>, settings: &'a Settings) -> Self {
        Self {
            kind,
            content: content.into(),
            settings,
            media_url: settings.url.clone(),
            xhtml: false,
            split: None,
            hunks: None,
            combined: None,
        }
    }

    /// Renders XHTML-style tags (`<link ... />`).
    pub fn with_xhtml(mut self, xhtml: bool) -> Self {
        self.xhtml = xhtml;
        self
    }

    /// Uses `url` instead of the configured URL prefix for this block.
    pub fn with_media_url(mut self, url: &str) -> Self {
        self.media_url = normalize_url(url);
        self
    }

    fn filters(&self) -> Vec<Box<dyn Filter>> {
        let kinds = match self.kind {
            AssetKind::Css => &self.settings.css_filters,
            AssetKind::Js => &self.settings.js_filters,
        };
        build_chain(kinds, self.settings, &self.media_url)
    }

    /// Returns the hunks found in the block.
    pub fn split_contents(&mut self) -> Result<&[Hunk], CompressError> {
        if self.split.is_none() {
            let split = match self.kind {
                AssetKind::Css => split_css(&self.content, self.settings, &self.media_url)?,
                AssetKind::Js => split_js(&self.content, self.settings, &self.media_url)?,
            };
            self.split = Some(split);
        }
        Ok(self.split.as_deref().unwrap_or_default())
    }

    /// Returns each hunk's content with the input filters applied.
    pub fn hunks(&mut self) -> Result<&[String], CompressError> {
        if self.hunks.is_none() {
            self.split_contents()?;
            let filters = self.filters();
            let split = self.split.as_deref().unwrap_or_default();
            let mut hunks = Vec::with_capacity(split.len());
            for hunk in split {
                hunks.push(apply_input(&filters, hunk.read()?, hunk)?);
            }
            self.hunks = Some(hunks);
        }
        Ok(self.hunks.as_deref().unwrap_or_default())
    }

    /// Returns the filtered hunks joined by newlines.
    pub fn concat(&mut self) -> Result<String, CompressError> {
        Ok(self.hunks()?.join("\n"))
    }

    /// Returns the concatenated content with the output filters applied.
    pub fn combined(&mut self) -> Result<&str, CompressError> {
        if self.combined.is_none() {
            let concat = self.concat()?;
            let combined = apply_output(&self.filters(), concat)?;
            self.combined = Some(combined);
        }
        Ok(self.combined.as_deref().unwrap_or_default())
    }

    /// Fingerprint of the combined content.
    pub fn content_hash(&mut self) -> Result<ContentHash, CompressError> {
        Ok(ContentHash::from_bytes(self.combined()?.as_bytes()))
    }

    /// Short fingerprint of the combined content, as used in the file name.
    pub fn hash(&mut self) -> Result<String, CompressError> {
        Ok(self.content_hash()?.short())
    }

    /// Modification times of the block's source files, in block order.
    pub fn mtimes(&mut self) -> Result<Vec<Mtime>, CompressError> {
        self.split_contents()?
            .iter()
            .filter_map(Hunk::filename)
            .map(|path| Mtime::of(path).map_err(CompressError::io(path)))
            .collect()
    }

    /// Newest modification time among the block's source files.
    pub fn newest_mtime(&mut self) -> Result<Option<Mtime>, CompressError> {
        let split = self.split_contents()?;
        Ok(compressor_cache::newest_mtime(split.iter().filter_map(Hunk::filename))?)
    }

    /// Key identifying this block's markup together with its source times.
    pub fn cache_key(&mut self) -> Result<String, CompressError> {
        let mtimes: Vec<String> = self.mtimes()?.iter().map(Mtime::to_string).collect();
        let mut parts: Vec<&[u8]> = vec![self.content.as_bytes()];
        parts.extend(mtimes.iter().map(|m| m.as_bytes()));
        Ok(format!("compressor.{}", ContentHash::from_parts(&parts).short()))
    }

    /// Key identifying this block's markup alone, whatever its source times.
    pub fn block_key(&self) -> String {
        let parts: [&[u8]; 3] = [
            self.kind.extension().as_bytes(),
            self.media_url.as_bytes(),
            self.content.as_bytes(),
        ];
        format!("block.{}", ContentHash::from_parts(&parts).short())
    }

    /// Output path relative to the root, e.g. `CACHE/css/f7c661b7a124.css`.
    pub fn new_filepath(&mut self) -> Result<String, CompressError> {
        Ok(format!(
            "{}/{}/{}{}",
            self.settings.output_dir.trim_matches('/'),
            self.kind.output_prefix(),
            self.hash()?,
            self.kind.extension()
        ))
    }

    /// Public URL of the combined file.
    pub fn url(&mut self) -> Result<String, CompressError> {
        let filepath = self.new_filepath()?;
        Ok(format!("{}/{}", self.media_url.trim_end_matches('/'), filepath))
    }

    /// Writes the combined file. Returns `false` if it already existed.
    pub fn save_file(&mut self) -> Result<bool, CompressError> {
        let store = OutputStore::new(&self.settings.root);
        self.write_combined(|path, data| store.write_if_absent(path, data))
    }

    fn write_combined(
        &mut self,
        write: impl FnOnce(&Path, &[u8]) -> Result<bool, CacheError>,
    ) -> Result<bool, CompressError> {
        let filepath = self.new_filepath()?;
        let combined = self.combined()?;
        let written = write(Path::new(&filepath), combined.as_bytes())?;
        if written {
            tracing::info!(path = %filepath, "wrote combined {}", self.kind);
        }
        Ok(written)
    }

    /// The block as it would be served without compression.
    ///
    /// Stylesheets are the split elements, so compiled dialects still point
    /// at their `.css` output. Scripts are the block unchanged.
    pub fn uncompressed(&mut self) -> Result<String, CompressError> {
        if self.kind == AssetKind::Js {
            return Ok(self.content.clone());
        }
        let xhtml = self.xhtml;
        let elements: Vec<String> = self
            .split_contents()?
            .iter()
            .map(|hunk| {
                if xhtml {
                    hunk.element.clone()
                } else {
                    SELF_CLOSING.replace_all(&hunk.element, ">").into_owned()
                }
            })
            .collect();
        Ok(elements.join("\n"))
    }

    /// Returns the markup that replaces the block.
    ///
    /// With compression enabled the combined file is written and a single tag
    /// referencing it is returned.
    pub fn output(&mut self) -> Result<String, CompressError> {
        if !self.settings.enabled {
            return self.uncompressed();
        }
        self.save_file()?;
        let url = self.url()?;
        Ok(self.render_tag(&url))
    }

    fn render_tag(&self, url: &str) -> String {
        match self.kind {
            AssetKind::Css => {
                let close = if self.xhtml { " />" } else { ">" };
                format!("<link rel=\"stylesheet\" href=\"{url}\" type=\"text/css\"{close}")
            }
            AssetKind::Js => format!("<script type=\"text/javascript\" src=\"{url}\"></script>"),
        }
    }

    /// Like [`output`](Self::output), but answers from `cache` when the block
    /// was compressed before and none of its sources changed since.
    ///
    /// New outputs are recorded in `cache`. Saving the cache is left to the
    /// caller.
    pub fn render_cached(&mut self, cache: &mut OutputCache) -> Result<String, CompressError> {
        if !self.settings.enabled {
            return self.uncompressed();
        }

        let cache_key = self.cache_key()?;
        let newest = self.newest_mtime()?;
        if let Some(record) = cache.lookup(&cache_key, newest) {
            return Ok(record.rendered.clone());
        }

        self.write_combined(|path, data| cache.write_output(path, data))?;
        let url = self.url()?;
        let rendered = self.render_tag(&url);
        let record = OutputRecord {
            cache_key,
            block_key: self.block_key(),
            kind: self.kind,
            output_path: PathBuf::from(self.new_filepath()?),
            url,
            content_hash: self.content_hash()?,
            newest_source: newest,
            rendered: rendered.clone(),
        };
        cache.insert(record);
        Ok(rendered)
    }
}
