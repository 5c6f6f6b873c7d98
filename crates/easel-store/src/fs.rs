//! Directory-backed blob store.
//!
//! Keys map onto a directory tree under a root path: each `/`-separated
//! key segment becomes a path component. Writes land in a temporary file
//! in the final directory and are renamed into place, so a concurrent
//! reader sees either the previous blob or the complete new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use easel_types::BlobKey;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// A filesystem implementation of [`BlobStore`].
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path under the root.
    ///
    /// Rejects keys that would escape the root (absolute keys, empty
    /// segments, `.` or `..` components).
    fn path_for(&self, key: &BlobKey) -> StoreResult<PathBuf> {
        let raw = key.as_str();
        if raw.is_empty() || raw.starts_with('/') {
            return Err(StoreError::InvalidKey {
                key: raw.to_string(),
                reason: "key must be a non-empty relative path".to_string(),
            });
        }
        let mut path = self.root.clone();
        for segment in raw.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StoreError::InvalidKey {
                    key: raw.to_string(),
                    reason: format!("illegal path segment {segment:?}"),
                });
            }
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let parent = path.parent().expect("key paths always have a parent");
        tokio::fs::create_dir_all(parent).await?;

        // Write-then-rename keeps the blob at `path` complete at all times.
        let tmp = parent.join(format!(".tmp-{}", Uuid::now_v7()));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(key = %key, bytes = bytes.len(), "wrote blob");
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &BlobKey) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &BlobKey) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
