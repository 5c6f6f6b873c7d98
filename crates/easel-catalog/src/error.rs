use easel_types::{CanvasId, Version};
use thiserror::Error;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No canvas row exists for this identifier.
    #[error("canvas not found: {canvas_id}")]
    CanvasNotFound { canvas_id: CanvasId },

    /// A canvas row already exists for this identifier.
    #[error("canvas already exists: {canvas_id}")]
    CanvasExists { canvas_id: CanvasId },

    /// A version row already exists at this `(canvas, version)` identity.
    /// Version rows are immutable; this is a lost commit race, not a
    /// corruption.
    #[error("version {version} already recorded for canvas {canvas_id}")]
    VersionExists {
        canvas_id: CanvasId,
        version: Version,
    },

    /// Attempted to record the uncommitted sentinel version.
    #[error("cannot record uncommitted version for canvas {canvas_id}")]
    UncommittedVersion { canvas_id: CanvasId },

    /// Backend failure (poisoned lock, driver error).
    #[error("catalog backend error: {0}")]
    Internal(String),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
