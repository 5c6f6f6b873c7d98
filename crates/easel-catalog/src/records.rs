use chrono::{DateTime, Utc};
use easel_types::{BlobKey, CanvasId, Version};
use serde::{Deserialize, Serialize};

/// The mutable row for one canvas.
///
/// `head_version` is the single piece of shared mutable state in the
/// system; it moves only through [`crate::Catalog::commit_version`] under
/// the per-canvas write lock. Deletion is soft: the row survives with
/// `deleted_at` set until purged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasRecord {
    pub canvas_id: CanvasId,
    pub owner_id: String,
    /// The version the canvas currently points at as "current".
    /// `None` until the first snapshot is committed.
    pub head_version: Option<Version>,
    /// Pointer at a pre-versioning document blob, if this canvas predates
    /// the versioned snapshot model.
    pub legacy_state_key: Option<BlobKey>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CanvasRecord {
    /// A new canvas row with no head and no legacy pointer.
    pub fn new(canvas_id: CanvasId, owner_id: impl Into<String>) -> Self {
        Self {
            canvas_id,
            owner_id: owner_id.into(),
            head_version: None,
            legacy_state_key: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Builder-style legacy pointer.
    pub fn with_legacy_key(mut self, key: BlobKey) -> Self {
        self.legacy_state_key = Some(key);
        self
    }

    /// Returns `true` if the canvas has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// One immutable row per committed snapshot.
///
/// Created exactly once, at commit time; never updated; removed only by
/// whole-canvas teardown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub canvas_id: CanvasId,
    pub version: Version,
    /// Where the snapshot payload lives in the blob store.
    pub blob_key: BlobKey,
    /// Integrity marker over the serialized snapshot (blake3, hex).
    /// Empty string when the committer did not compute one.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl VersionRecord {
    pub fn new(
        canvas_id: CanvasId,
        version: Version,
        blob_key: BlobKey,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            canvas_id,
            version,
            blob_key,
            content_hash: content_hash.into(),
            created_at: Utc::now(),
        }
    }
}
