use easel_lock::LockConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the [`crate::Synchronizer`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// TTL and backoff policy for the per-canvas write lock.
    pub lock: LockConfig,
}
