use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::CanvasId;
use crate::version::Version;

/// Storage key for a blob in the object store.
///
/// Snapshot keys are a deterministic function of canvas and version, so a
/// snapshot can be located without consulting the catalog. Legacy document
/// blobs live under caller-chosen keys recorded on the canvas row.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
    /// Wrap an arbitrary storage key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The canonical key for a canvas snapshot at the given version.
    pub fn state(canvas_id: &CanvasId, version: Version) -> Self {
        Self(format!("canvas-state/{canvas_id}/{version}"))
    }

    /// The raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlobKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for BlobKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
