//! The two kinds of asset a compress block can hold.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a block holds stylesheets or scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// `<link rel="stylesheet">` and `<style>` elements.
    Css,
    /// `<script>` elements.
    Js,
}

impl AssetKind {
    /// The block argument naming this kind (`css` or `js`).
    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
        }
    }

    /// Extension of combined output files, dot included.
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Css => ".css",
            AssetKind::Js => ".js",
        }
    }

    /// Subdirectory of the output directory holding files of this kind.
    pub fn output_prefix(self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names neither `css` nor `js`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAssetKindError(pub String);

impl fmt::Display for ParseAssetKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected 'css' or 'js', got '{}'", self.0)
    }
}

impl std::error::Error for ParseAssetKindError {}

impl FromStr for AssetKind {
    type Err = ParseAssetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "css" => Ok(AssetKind::Css),
            "js" => Ok(AssetKind::Js),
            other => Err(ParseAssetKindError(other.to_string())),
        }
    }
}
