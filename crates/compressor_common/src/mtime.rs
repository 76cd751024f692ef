//! File modification times for staleness checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// A file modification time, in nanoseconds since the Unix epoch.
///
/// Times before the epoch clamp to zero.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mtime(u128);

impl Mtime {
    /// Wraps a raw nanosecond count.
    pub fn from_nanos(nanos: u128) -> Self {
        Self(nanos)
    }

    /// Converts a [`SystemTime`] into an `Mtime`.
    pub fn from_system_time(time: SystemTime) -> Self {
        let nanos = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self(nanos)
    }

    /// Reads the modification time of the file at `path`.
    pub fn of(path: &Path) -> std::io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self::from_system_time(modified))
    }

    /// Returns the newest of the given times, or `None` for an empty input.
    pub fn newest(times: impl IntoIterator<Item = Mtime>) -> Option<Self> {
        times.into_iter().max()
    }

    /// Returns the raw nanosecond count.
    pub fn as_nanos(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Mtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Mtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mtime({})", self.0)
    }
}
