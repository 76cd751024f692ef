//! Shared foundational types used across the compressor workspace.
//!
//! This crate provides the asset kinds, the content fingerprint used for
//! cache-busted filenames and cache keys, and the modification-time type used
//! for staleness checks.

#![warn(missing_docs)]

pub mod hash;
pub mod kind;
pub mod mtime;

pub use hash::ContentHash;
pub use kind::{AssetKind, ParseAssetKindError};
pub use mtime::Mtime;
