use easel_catalog::CatalogError;
use easel_lock::LockError;
use easel_store::StoreError;
use easel_types::{BlobKey, CanvasId, TypeError, Version};
use thiserror::Error;

/// Errors from synchronizer operations.
///
/// Lookup failures are surfaced immediately: they indicate an identifier
/// error, not transient contention. Lock contention is retried with
/// bounded backoff before surfacing [`SyncError::OperationTooFrequent`];
/// it is the only automatically-retried failure. Collaborator errors
/// propagate unwrapped.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The canvas identifier does not resolve (unknown or soft-deleted).
    #[error("canvas not found: {canvas_id}")]
    CanvasNotFound { canvas_id: CanvasId },

    /// No version resolves: an explicit version is absent from the
    /// catalog (`version` is `Some`), or the canvas has no head yet
    /// (`version` is `None`).
    #[error("no version resolves for canvas {canvas_id}")]
    VersionNotFound {
        canvas_id: CanvasId,
        version: Option<Version>,
    },

    /// The per-canvas lock stayed contended through the full retry budget.
    #[error("canvas {canvas_id} is locked by another writer (gave up after {attempts} attempts)")]
    OperationTooFrequent { canvas_id: CanvasId, attempts: u32 },

    /// A cataloged version's snapshot blob is gone from the store.
    #[error("snapshot blob {blob_key} missing for canvas {canvas_id} version {version}")]
    SnapshotMissing {
        canvas_id: CanvasId,
        version: Version,
        blob_key: BlobKey,
    },

    /// Attempted to persist a state carrying the uncommitted sentinel
    /// version.
    #[error("state for canvas {canvas_id} carries no committed version")]
    UncommittedState { canvas_id: CanvasId },

    /// Blob store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Version catalog failure.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Lock provider failure other than contention.
    #[error("lock error: {0}")]
    Lock(LockError),

    /// Snapshot encode/decode failure.
    #[error("codec error: {0}")]
    Codec(#[from] TypeError),
}

impl SyncError {
    /// Map a lock failure onto the synchronizer taxonomy: exhausted
    /// contention becomes `OperationTooFrequent`, everything else passes
    /// through.
    pub(crate) fn lock_failure(canvas_id: &CanvasId, err: LockError) -> Self {
        match err {
            LockError::Contended { attempts, .. } => Self::OperationTooFrequent {
                canvas_id: canvas_id.clone(),
                attempts,
            },
            other => Self::Lock(other),
        }
    }
}

/// Result alias for synchronizer operations.
pub type SyncResult<T> = Result<T, SyncError>;
