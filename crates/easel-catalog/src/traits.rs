//! The [`Catalog`] trait defining the version-catalog storage interface.
//!
//! Any backend (in-memory, SQL) implements this trait to provide canvas
//! rows and append-only version rows to the synchronizer.

use async_trait::async_trait;
use easel_types::{CanvasId, Version};

use crate::error::CatalogResult;
use crate::records::{CanvasRecord, VersionRecord};

/// Storage backend for canvas metadata and version lineage.
///
/// Implementations must be thread-safe (`Send + Sync`). The one compound
/// operation is [`commit_version`](Catalog::commit_version): version-row
/// insert and head-pointer advance must be atomic, so a version blob is
/// never discoverable without its row or vice versa.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Create a canvas row.
    ///
    /// Fails with `CanvasExists` if the identifier is already taken.
    async fn insert_canvas(&self, record: &CanvasRecord) -> CatalogResult<()>;

    /// Read a canvas row, soft-deleted rows included.
    ///
    /// Returns `Ok(None)` if no row exists.
    async fn canvas(&self, canvas_id: &CanvasId) -> CatalogResult<Option<CanvasRecord>>;

    /// The canvas's current head version, if any snapshot was committed.
    ///
    /// Fails with `CanvasNotFound` if the canvas row does not exist.
    async fn head(&self, canvas_id: &CanvasId) -> CatalogResult<Option<Version>>;

    /// Read one version row.
    ///
    /// Returns `Ok(None)` if no snapshot was committed at that version.
    async fn version(
        &self,
        canvas_id: &CanvasId,
        version: Version,
    ) -> CatalogResult<Option<VersionRecord>>;

    /// All version rows of a canvas, ascending by version.
    async fn versions(&self, canvas_id: &CanvasId) -> CatalogResult<Vec<VersionRecord>>;

    /// The next free version of a canvas: one past the highest committed
    /// version, or the first version if none exists.
    ///
    /// Fails with `CanvasNotFound` if the canvas row does not exist.
    async fn next_version(&self, canvas_id: &CanvasId) -> CatalogResult<Version>;

    /// Record a committed snapshot: insert the version row and advance the
    /// head pointer, atomically.
    ///
    /// The head advance is monotonic: committing a version below the
    /// current head records the row without moving the pointer backwards.
    /// Fails with `VersionExists` if the `(canvas, version)` row already
    /// exists (version rows are immutable), `CanvasNotFound` if the canvas
    /// row is missing, `UncommittedVersion` for the zero sentinel.
    async fn commit_version(&self, record: &VersionRecord) -> CatalogResult<()>;

    /// Soft-delete a canvas. Returns `true` if the row existed and was not
    /// already deleted.
    async fn soft_delete(&self, canvas_id: &CanvasId) -> CatalogResult<bool>;

    /// Tear down a canvas: remove its row and all version rows.
    ///
    /// Returns the removed version rows so the caller can delete the
    /// corresponding blobs.
    async fn purge(&self, canvas_id: &CanvasId) -> CatalogResult<Vec<VersionRecord>>;
}
