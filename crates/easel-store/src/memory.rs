use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use easel_types::BlobKey;

use crate::error::StoreResult;
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. All blobs are held in memory behind a
/// `RwLock` for safe concurrent access. Blobs are cloned on read.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobKey, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    /// Remove all blobs from the store.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all keys in the store.
    pub fn keys(&self) -> Vec<BlobKey> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut keys: Vec<BlobKey> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(key.clone(), bytes);
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn remove(&self, key: &BlobKey) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    async fn exists(&self, key: &BlobKey) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> BlobKey {
        BlobKey::new(raw)
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryBlobStore::new();
        store.put(&key("a"), b"hello".to_vec()).await.unwrap();

        let read_back = store.get(&key("a")).await.unwrap().expect("should exist");
        assert_eq!(read_back, b"hello");
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.get(&key("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_existing() {
        let store = InMemoryBlobStore::new();
        store.put(&key("a"), b"old".to_vec()).await.unwrap();
        store.put(&key("a"), b"new".to_vec()).await.unwrap();

        let read_back = store.get(&key("a")).await.unwrap().unwrap();
        assert_eq!(read_back, b"new");
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Exists / Remove
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn exists_for_present_and_missing() {
        let store = InMemoryBlobStore::new();
        store.put(&key("present"), b"x".to_vec()).await.unwrap();
        assert!(store.exists(&key("present")).await.unwrap());
        assert!(!store.exists(&key("absent")).await.unwrap());
    }

    #[tokio::test]
    async fn remove_present_blob() {
        let store = InMemoryBlobStore::new();
        store.put(&key("a"), b"x".to_vec()).await.unwrap();
        assert!(store.remove(&key("a")).await.unwrap()); // was present
        assert!(!store.exists(&key("a")).await.unwrap()); // now gone
        assert!(!store.remove(&key("a")).await.unwrap()); // second remove = false
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn len_and_total_bytes() {
        let store = InMemoryBlobStore::new();
        assert!(store.is_empty());

        store.put(&key("a"), b"12345".to_vec()).await.unwrap();
        store.put(&key("b"), b"123456789".to_vec()).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_bytes(), 14);
    }

    #[tokio::test]
    async fn clear_removes_all() {
        let store = InMemoryBlobStore::new();
        store.put(&key("a"), b"x".to_vec()).await.unwrap();
        store.put(&key("b"), b"y".to_vec()).await.unwrap();
        store.clear();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn keys_are_sorted() {
        let store = InMemoryBlobStore::new();
        store.put(&key("b"), vec![]).await.unwrap();
        store.put(&key("a"), vec![]).await.unwrap();
        store.put(&key("c"), vec![]).await.unwrap();

        let keys = store.keys();
        assert_eq!(keys, vec![key("a"), key("b"), key("c")]);
    }

    // -----------------------------------------------------------------------
    // Concurrent read safety
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn concurrent_reads_are_safe() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryBlobStore::new());
        store.put(&key("shared"), b"data".to_vec()).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let blob = store.get(&BlobKey::new("shared")).await.unwrap();
                    assert_eq!(blob.unwrap(), b"data");
                })
            })
            .collect();

        for h in handles {
            h.await.expect("task should not panic");
        }
    }

    #[tokio::test]
    async fn debug_format() {
        let store = InMemoryBlobStore::new();
        store.put(&key("x"), vec![1]).await.unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlobStore"));
        assert!(debug.contains("blob_count"));
    }
}
