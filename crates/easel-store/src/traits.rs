use async_trait::async_trait;
use easel_types::BlobKey;

use crate::error::StoreResult;

/// String-keyed object storage.
///
/// All implementations must satisfy these invariants:
/// - `put` is all-or-nothing: a concurrent `get` returns either the
///   previous blob or the complete new one, never a torn mixture.
/// - Concurrent reads are always safe.
/// - The store never interprets blob contents; it is a pure key-value store.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a blob at `key`, replacing any existing blob.
    async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> StoreResult<()>;

    /// Read the blob at `key`.
    ///
    /// Returns `Ok(None)` if no blob exists at the key.
    /// Returns `Err` on I/O failure.
    async fn get(&self, key: &BlobKey) -> StoreResult<Option<Vec<u8>>>;

    /// Delete the blob at `key`. Returns `true` if a blob existed.
    ///
    /// Intended for whole-canvas teardown. Removing a blob still referenced
    /// by the version catalog corrupts that version.
    async fn remove(&self, key: &BlobKey) -> StoreResult<bool>;

    /// Check whether a blob exists at `key`.
    ///
    /// Default implementation reads the blob. Backends may override to
    /// avoid transferring the payload.
    async fn exists(&self, key: &BlobKey) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
