//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{normalize_url, ConfigFile, FilterKind, Settings};
use std::path::Path;

/// File name looked up in the project directory.
pub const CONFIG_FILE: &str = "compressor.toml";

/// Loads and validates `compressor.toml` from a project directory.
///
/// The static root is resolved relative to `project_dir`.
pub fn load_settings(project_dir: &Path) -> Result<Settings, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_settings_from_str(&content, project_dir)
}

/// Parses and validates a configuration from a string.
///
/// `base_dir` anchors a relative `root`. Useful for testing without
/// filesystem dependencies.
pub fn load_settings_from_str(content: &str, base_dir: &Path) -> Result<Settings, ConfigError> {
    let config: ConfigFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    resolve(config, base_dir)
}

/// Validates that required fields are present and compilers are usable.
fn validate_config(config: &ConfigFile) -> Result<(), ConfigError> {
    if config.compress.url.is_empty() {
        return Err(ConfigError::MissingField("compress.url".to_string()));
    }
    if config.compress.root.is_empty() {
        return Err(ConfigError::MissingField("compress.root".to_string()));
    }
    if config.compress.output_dir.trim_matches('/').is_empty() {
        return Err(ConfigError::ValidationError(
            "compress.output_dir must not be empty".to_string(),
        ));
    }
    for (ext, compiler) in &config.compilers {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "compiler key '{ext}' must be an extension starting with '.'"
            )));
        }
        if compiler.binary_path.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "compilers.\"{ext}\".binary_path"
            )));
        }
    }
    Ok(())
}

/// Applies cross-field defaults and turns the raw file into [`Settings`].
fn resolve(config: ConfigFile, base_dir: &Path) -> Result<Settings, ConfigError> {
    let compress = config.compress;

    let mut css_filters = parse_chain(&compress.css_filters)?;
    if compress.absolute_css_urls && !css_filters.contains(&FilterKind::CssAbsolute) {
        css_filters.insert(0, FilterKind::CssAbsolute);
    }
    let js_filters = parse_chain(&compress.js_filters)?;

    Ok(Settings {
        enabled: compress.enabled.unwrap_or(!compress.debug),
        debug: compress.debug,
        url: normalize_url(&compress.url),
        root: base_dir.join(&compress.root),
        output_dir: compress.output_dir.trim_matches('/').to_string(),
        css_filters,
        js_filters,
        compilers: config.compilers,
        csstidy: config.filters.csstidy,
    })
}

fn parse_chain(names: &[String]) -> Result<Vec<FilterKind>, ConfigError> {
    names
        .iter()
        .map(|name| {
            FilterKind::from_name(name).ok_or_else(|| ConfigError::UnknownFilter(name.clone()))
        })
        .collect()
}
