use std::sync::Arc;

use easel_types::CanvasId;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{LockConfig, RetryConfig};
use crate::error::{LockError, LockResult};
use crate::provider::{LockGuard, LockProvider};

/// The lock key guarding all commits against one canvas.
pub fn lock_key(canvas_id: &CanvasId) -> String {
    format!("canvas-lock/{canvas_id}")
}

/// Bounded-backoff acquisition on top of a [`LockProvider`].
///
/// Every failed attempt doubles the sleep before the next one; exhausting
/// the budget surfaces [`LockError::Contended`]. Lookups never retry here;
/// contention is the only transient failure this layer absorbs.
pub struct LockManager {
    provider: Arc<dyn LockProvider>,
    config: LockConfig,
}

impl LockManager {
    /// Create a manager with the default TTL and retry policy.
    pub fn new(provider: Arc<dyn LockProvider>) -> Self {
        Self::with_config(provider, LockConfig::default())
    }

    /// Create a manager with an explicit configuration.
    pub fn with_config(provider: Arc<dyn LockProvider>, config: LockConfig) -> Self {
        Self { provider, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Acquire the per-canvas write lock with the configured retry policy.
    pub async fn lock_state(&self, canvas_id: &CanvasId) -> LockResult<Box<dyn LockGuard>> {
        self.lock_state_with(canvas_id, &self.config.retry).await
    }

    /// Acquire with an explicit retry policy.
    pub async fn lock_state_with(
        &self,
        canvas_id: &CanvasId,
        retry: &RetryConfig,
    ) -> LockResult<Box<dyn LockGuard>> {
        let key = lock_key(canvas_id);
        let mut delay = retry.initial_delay;

        for attempt in 0..=retry.max_retries {
            if let Some(guard) = self.provider.try_acquire(&key, self.config.ttl).await? {
                if attempt > 0 {
                    debug!(%key, attempt, "lock acquired after backoff");
                }
                return Ok(guard);
            }
            if attempt < retry.max_retries {
                debug!(%key, attempt, ?delay, "lock held, backing off");
                sleep(delay).await;
                delay *= 2;
            }
        }

        warn!(%key, attempts = retry.max_retries + 1, "lock retries exhausted");
        Err(LockError::Contended {
            key,
            attempts: retry.max_retries + 1,
        })
    }
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("config", &self.config)
            .finish()
    }
}
