use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic snapshot version within a canvas lineage.
///
/// Committed snapshots are numbered from 1. `Version::UNCOMMITTED` (zero)
/// marks a freshly-initialized empty state that has never been persisted;
/// it never appears in the version catalog.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// The version carried by a never-persisted empty state.
    pub const UNCOMMITTED: Self = Self(0);

    /// Wrap a raw version number.
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// The first committed version of any canvas.
    pub const fn first() -> Self {
        Self(1)
    }

    /// The successor version.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns `true` if this version refers to a committed snapshot.
    pub const fn is_committed(&self) -> bool {
        self.0 > 0
    }

    /// The raw version number.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(version: u64) -> Self {
        Self(version)
    }
}
