//! The `{% compress %}` block syntax.
//!
//! ```text
//! {% compress css %}
//! <link rel="stylesheet" href="{{ MEDIA_URL }}css/one.css" type="text/css">
//! <style type="text/css">p { border:5px solid green;}</style>
//! {% endcompress %}
//! ```
//!
//! renders as a single `<link>` to the combined file. The kind is `css` or
//! `js`. An optional second argument `xhtml` selects self-closing tags.

use std::ops::Range;
use std::sync::LazyLock;

use compressor_cache::OutputCache;
use compressor_common::AssetKind;
use compressor_config::Settings;
use regex::{NoExpand, Regex};

use crate::compressor::Compressor;
use crate::error::CompressError;

static OPEN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%-?\s*compress\b([^%]*?)\s*-?%\}").expect("open block pattern is valid")
});

static CLOSE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%-?\s*endcompress\s*-?%\}").expect("close block pattern is valid")
});

static MEDIA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*MEDIA_URL\s*\}\}").expect("media url pattern is valid")
});

/// A `{% compress %}` block found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressBlock {
    /// Byte range of the block, tags included.
    pub span: Range<usize>,
    /// What the block combines.
    pub kind: AssetKind,
    /// Whether `xhtml` was given.
    pub xhtml: bool,
    /// Markup between the tags.
    pub body: String,
}

/// Finds every compress block in `template`, in order.
pub fn parse_blocks(template: &str) -> Result<Vec<CompressBlock>, CompressError> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(caps) = OPEN_BLOCK.captures_at(template, pos) {
        let Some(open) = caps.get(0) else {
            break;
        };
        let args: Vec<&str> = caps
            .get(1)
            .map_or("", |m| m.as_str())
            .split_whitespace()
            .collect();

        if args.is_empty() || args.len() > 2 {
            return Err(CompressError::TemplateSyntax(format!(
                "'compress' tag requires one or two arguments, got {}",
                args.len()
            )));
        }
        let kind: AssetKind = args[0].parse().map_err(|_| {
            CompressError::TemplateSyntax("'compress' tag's argument must be 'js' or 'css'".to_string())
        })?;
        // Any second argument other than `xhtml` renders plain HTML.
        let xhtml = args.get(1) == Some(&"xhtml");

        let close = CLOSE_BLOCK.find_at(template, open.end()).ok_or_else(|| {
            CompressError::TemplateSyntax(format!(
                "unclosed 'compress' tag at byte {}; expected 'endcompress'",
                open.start()
            ))
        })?;

        blocks.push(CompressBlock {
            span: open.start()..close.end(),
            kind,
            xhtml,
            body: template[open.end()..close.start()].to_string(),
        });
        pos = close.end();
    }
    Ok(blocks)
}

/// Renders every compress block in `template` and returns the result.
///
/// `{{ MEDIA_URL }}` inside a block is replaced with the configured URL
/// prefix before compressing. Everything outside the blocks is copied
/// unchanged.
pub fn render_template(
    template: &str,
    settings: &Settings,
    cache: &mut OutputCache,
) -> Result<String, CompressError> {
    let blocks = parse_blocks(template)?;
    tracing::debug!(blocks = blocks.len(), "rendering template");

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for block in blocks {
        out.push_str(&template[last..block.span.start]);
        let body = MEDIA_URL.replace_all(&block.body, NoExpand(&settings.url));
        let rendered = Compressor::new(block.kind, body.into_owned(), settings)
            .with_xhtml(block.xhtml)
            .render_cached(cache)?;
        out.push_str(&rendered);
        last = block.span.end;
    }
    out.push_str(&template[last..]);
    Ok(out)
}
