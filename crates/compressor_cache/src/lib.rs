//! Output caching and staleness detection.
//!
//! This crate records every combined file the compressor writes, together with
//! the newest modification time of the sources it was built from, so later
//! renders can serve the previous output instead of rebuilding it. It also
//! decides when a compiled stylesheet is older than its source.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod manifest;
pub mod staleness;
pub mod store;

pub use cache::OutputCache;
pub use error::CacheError;
pub use manifest::{OutputManifest, OutputRecord};
pub use staleness::{compiled_path, needs_recompile, newest_mtime};
pub use store::OutputStore;
