//! Parsing and validation of `compressor.toml` configuration files.
//!
//! This crate reads the configuration file and produces strongly-typed
//! [`Settings`] with defaults applied, the static root resolved, and the
//! filter chains normalized.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_settings, load_settings_from_str, CONFIG_FILE};
pub use types::*;
