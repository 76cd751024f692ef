//! Combining and minifying the stylesheets and scripts of an HTML block.
//!
//! A block of markup holding `<link>`, `<style>` and `<script>` elements is
//! split into hunks, stylesheet dialects are compiled through external
//! programs, the hunks are filtered and concatenated, and the result is
//! written once under a content-hashed name. The block is then replaced by a
//! single tag referencing that file.
//!
//! The entry points are [`Compressor`] for one block and
//! [`render_template`] for a whole template containing
//! `{% compress %}` blocks.

#![warn(missing_docs)]

pub mod compile;
pub mod compressor;
pub mod error;
pub mod filters;
pub mod markup;
pub mod slate;
pub mod split;
pub mod tag;

pub use compressor::Compressor;
pub use error::CompressError;
pub use slate::{slate, SlateOptions, SlateReport};
pub use split::{Hunk, HunkSource};
pub use tag::{parse_blocks, render_template, CompressBlock};

/// Version recorded in output manifests. A manifest from another version is discarded.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
