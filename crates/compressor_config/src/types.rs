//! Configuration types deserialized from `compressor.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Default name of the directory, under the static root, that receives output files.
pub const DEFAULT_OUTPUT_DIR: &str = "CACHE";

/// The raw configuration file as written by the user.
///
/// Turned into [`Settings`] by the loader, which applies defaults that depend
/// on other fields and resolves paths.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    /// The `[compress]` section.
    pub compress: CompressSection,
    /// Stylesheet compilers keyed by source extension (e.g. `".ccss"`).
    #[serde(default)]
    pub compilers: BTreeMap<String, CompilerFormat>,
    /// Settings for filters that call out to external programs.
    #[serde(default)]
    pub filters: FilterSection,
}

/// The `[compress]` section.
#[derive(Debug, Deserialize)]
pub struct CompressSection {
    /// Whether compression is on. Defaults to `!debug`.
    pub enabled: Option<bool>,
    /// Debug mode: off-site assets become hard errors instead of being dropped.
    #[serde(default)]
    pub debug: bool,
    /// Public URL prefix under which `root` is served.
    #[serde(default)]
    pub url: String,
    /// Static root directory, relative to the configuration file.
    #[serde(default)]
    pub root: String,
    /// Output directory name under the root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Rewrite relative `url()` references in CSS to absolute URLs.
    #[serde(default = "default_true")]
    pub absolute_css_urls: bool,
    /// Filter chain applied to CSS.
    #[serde(default)]
    pub css_filters: Vec<String>,
    /// Filter chain applied to JavaScript.
    #[serde(default = "default_js_filters")]
    pub js_filters: Vec<String>,
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_js_filters() -> Vec<String> {
    vec![FilterKind::JsMin.name().to_string()]
}

/// An external compiler that turns a stylesheet dialect into plain CSS.
///
/// The compiler is expected to write `<path>.css` next to its input.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CompilerFormat {
    /// Program to run, possibly with leading arguments (e.g. `"python clevercss.py"`).
    #[serde(default)]
    pub binary_path: String,
    /// Argument template. Every `*` is replaced by the input path without its extension.
    #[serde(default)]
    pub arguments: String,
}

/// The `[filters]` section.
#[derive(Debug, Default, Deserialize)]
pub struct FilterSection {
    /// Settings for the `csstidy` filter.
    #[serde(default)]
    pub csstidy: CssTidyConfig,
}

/// How the `csstidy` filter invokes its binary.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CssTidyConfig {
    /// The csstidy executable.
    #[serde(default = "default_csstidy_binary")]
    pub binary: String,
    /// Extra arguments after the `-` that selects stdin input.
    #[serde(default = "default_csstidy_arguments")]
    pub arguments: String,
}

fn default_csstidy_binary() -> String {
    "csstidy".to_string()
}

fn default_csstidy_arguments() -> String {
    "--template=highest --silent=true".to_string()
}

impl Default for CssTidyConfig {
    fn default() -> Self {
        Self {
            binary: default_csstidy_binary(),
            arguments: default_csstidy_arguments(),
        }
    }
}

/// The filters that can appear in a filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Rewrites relative `url()` references to absolute URLs.
    CssAbsolute,
    /// Wraps hunks carrying a `media` attribute in an `@media` block.
    CssMedia,
    /// Minifies CSS.
    CssMin,
    /// Pipes CSS through the external `csstidy` program.
    CssTidy,
    /// Minifies JavaScript with the JSMin algorithm.
    JsMin,
}

impl FilterKind {
    /// All filters, in declaration order.
    pub const ALL: [FilterKind; 5] = [
        FilterKind::CssAbsolute,
        FilterKind::CssMedia,
        FilterKind::CssMin,
        FilterKind::CssTidy,
        FilterKind::JsMin,
    ];

    /// The name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::CssAbsolute => "css_absolute",
            FilterKind::CssMedia => "css_media",
            FilterKind::CssMin => "cssmin",
            FilterKind::CssTidy => "csstidy",
            FilterKind::JsMin => "jsmin",
        }
    }

    /// Looks up a filter by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully resolved settings used by the rest of the workspace.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Whether blocks are compressed at all.
    pub enabled: bool,
    /// Debug mode.
    pub debug: bool,
    /// Public URL prefix of `root`, always ending in `/`.
    pub url: String,
    /// Absolute or config-relative static root.
    pub root: PathBuf,
    /// Output directory name under `root`, without surrounding slashes.
    pub output_dir: String,
    /// CSS filter chain, already including `css_absolute` when requested.
    pub css_filters: Vec<FilterKind>,
    /// JavaScript filter chain.
    pub js_filters: Vec<FilterKind>,
    /// Stylesheet compilers keyed by extension, dot included.
    pub compilers: BTreeMap<String, CompilerFormat>,
    /// csstidy invocation.
    pub csstidy: CssTidyConfig,
}

impl Settings {
    /// Creates settings with defaults for everything except the URL prefix and root.
    ///
    /// Compression is enabled, `css_absolute` leads the CSS chain and `jsmin`
    /// is the JavaScript chain.
    pub fn new(url: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            debug: false,
            url: normalize_url(&url.into()),
            root: root.into(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            css_filters: vec![FilterKind::CssAbsolute],
            js_filters: vec![FilterKind::JsMin],
            compilers: BTreeMap::new(),
            csstidy: CssTidyConfig::default(),
        }
    }

    /// Returns the directory that receives output files and the manifest.
    pub fn output_root(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Returns the compiler registered for `ext` (dot included), if any.
    pub fn compiler_for(&self, ext: &str) -> Option<&CompilerFormat> {
        self.compilers.get(ext)
    }
}

/// Ensures a URL prefix ends with exactly one `/`.
pub fn normalize_url(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}
