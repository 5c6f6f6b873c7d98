//! In-memory lock provider for testing and single-process use.
//!
//! [`InMemoryLockProvider`] keeps held locks in a table behind a `Mutex`.
//! Each acquisition gets a fresh token; release only clears the table entry
//! carrying that token, so a handle outliving its TTL cannot release a
//! successor's lock. Expired entries are overwritten on the next acquire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{LockError, LockResult};
use crate::provider::{LockGuard, LockProvider};

#[derive(Debug)]
struct Holder {
    token: u64,
    expires_at: Instant,
}

type Table = Arc<Mutex<HashMap<String, Holder>>>;

/// An in-memory implementation of [`LockProvider`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryLockProvider {
    table: Table,
    next_token: Arc<AtomicU64>,
}

impl InMemoryLockProvider {
    /// Create a new provider with no held locks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `key` is currently held and unexpired.
    pub fn is_held(&self, key: &str) -> bool {
        let table = self.table.lock().expect("lock table poisoned");
        table
            .get(key)
            .map(|holder| holder.expires_at > Instant::now())
            .unwrap_or(false)
    }
}

#[async_trait]
impl LockProvider for InMemoryLockProvider {
    async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> LockResult<Option<Box<dyn LockGuard>>> {
        let mut table = self
            .table
            .lock()
            .map_err(|e| LockError::Internal(format!("lock table poisoned: {e}")))?;

        let now = Instant::now();
        if let Some(holder) = table.get(key) {
            if holder.expires_at > now {
                return Ok(None);
            }
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        table.insert(
            key.to_string(),
            Holder {
                token,
                expires_at: now + ttl,
            },
        );

        Ok(Some(Box::new(MemoryGuard {
            key: key.to_string(),
            token,
            table: Arc::clone(&self.table),
            released: AtomicBool::new(false),
        })))
    }
}

struct MemoryGuard {
    key: String,
    token: u64,
    table: Table,
    released: AtomicBool,
}

#[async_trait]
impl LockGuard for MemoryGuard {
    fn key(&self) -> &str {
        &self.key
    }

    async fn release(&self) -> LockResult<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut table = self
            .table
            .lock()
            .map_err(|e| LockError::Internal(format!("lock table poisoned: {e}")))?;
        // Fenced removal: only clear the entry this guard acquired.
        if table.get(&self.key).map(|h| h.token) == Some(self.token) {
            table.remove(&self.key);
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGuard")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish()
    }
}
