use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use super::Filter;
use crate::error::CompressError;

/// Minifies the combined stylesheet. See [`cssmin`].
pub struct CssMinFilter;

impl Filter for CssMinFilter {
    fn name(&self) -> &'static str {
        "cssmin"
    }

    fn output(&self, content: &str) -> Result<Option<String>, CompressError> {
        cssmin(content)
            .map(Some)
            .map_err(|message| CompressError::FilterFailed {
                filter: "cssmin",
                message,
            })
    }
}

/// Parses `css` and prints it back without comments or redundant whitespace.
///
/// Rules keep their order. Declarations the parser does not understand are
/// printed as written instead of failing the whole stylesheet.
pub fn cssmin(css: &str) -> Result<String, String> {
    let sheet = StyleSheet::parse(
        css,
        ParserOptions {
            error_recovery: true,
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(printed.code)
}
