//! Content filters applied to hunks and to the combined output.
//!
//! Every filter may act at two points: on each hunk as it is read (`input`),
//! and on the concatenated result (`output`). A filter that does nothing at
//! one of these points returns `None` there and the content passes through
//! unchanged.

mod css_absolute;
mod css_media;
mod cssmin;
mod csstidy;
mod jsmin;

pub use css_absolute::CssAbsoluteFilter;
pub use css_media::CssMediaFilter;
pub use cssmin::{cssmin, CssMinFilter};
pub use csstidy::CssTidyFilter;
pub use jsmin::{jsmin, JsMinFilter};

use compressor_config::{FilterKind, Settings};

use crate::error::CompressError;
use crate::split::Hunk;

/// A content transformation.
pub trait Filter {
    /// Name of the filter, as used in configuration.
    fn name(&self) -> &'static str;

    /// Transforms one hunk's content.
    fn input(&self, _content: &str, _hunk: &Hunk) -> Result<Option<String>, CompressError> {
        Ok(None)
    }

    /// Transforms the combined content.
    fn output(&self, _content: &str) -> Result<Option<String>, CompressError> {
        Ok(None)
    }
}

/// Instantiates the filters named in `kinds`, in order.
///
/// `media_url` is the URL prefix in effect for the block being compressed.
pub fn build_chain(kinds: &[FilterKind], settings: &Settings, media_url: &str) -> Vec<Box<dyn Filter>> {
    kinds
        .iter()
        .map(|kind| -> Box<dyn Filter> {
            match kind {
                FilterKind::CssAbsolute => {
                    Box::new(CssAbsoluteFilter::new(&settings.root, media_url))
                }
                FilterKind::CssMedia => Box::new(CssMediaFilter),
                FilterKind::CssMin => Box::new(CssMinFilter),
                FilterKind::CssTidy => Box::new(CssTidyFilter::new(settings.csstidy.clone())),
                FilterKind::JsMin => Box::new(JsMinFilter),
            }
        })
        .collect()
}

/// Runs the `input` stage of every filter over a hunk's content.
pub fn apply_input(
    filters: &[Box<dyn Filter>],
    content: String,
    hunk: &Hunk,
) -> Result<String, CompressError> {
    let mut content = content;
    for filter in filters {
        if let Some(filtered) = filter.input(&content, hunk)? {
            content = filtered;
        }
    }
    Ok(content)
}

/// Runs the `output` stage of every filter over the combined content.
pub fn apply_output(filters: &[Box<dyn Filter>], content: String) -> Result<String, CompressError> {
    let mut content = content;
    for filter in filters {
        if let Some(filtered) = filter.output(&content)? {
            content = filtered;
        }
    }
    Ok(content)
}
