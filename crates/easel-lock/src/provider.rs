use std::time::Duration;

use async_trait::async_trait;

use crate::error::LockResult;

/// Distributed mutual-exclusion provider keyed by string.
///
/// Implementations must be thread-safe. Acquisition is non-blocking:
/// a held lock yields `Ok(None)` immediately, never a wait. Retry policy
/// lives above the provider, in [`crate::LockManager`].
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Attempt to take the lock at `key` with the given time-to-live.
    ///
    /// Returns `Ok(Some(guard))` on success, `Ok(None)` if the lock is
    /// currently held by someone else.
    async fn try_acquire(&self, key: &str, ttl: Duration)
        -> LockResult<Option<Box<dyn LockGuard>>>;
}

/// Release handle for one successful acquisition.
///
/// `release` is idempotent: calling it twice is a no-op, and a handle
/// whose lock has expired and been re-acquired by another holder must not
/// release the successor's lock.
#[async_trait]
pub trait LockGuard: Send + Sync + std::fmt::Debug {
    /// The key this guard was acquired for.
    fn key(&self) -> &str;

    /// Release the lock.
    async fn release(&self) -> LockResult<()>;
}
