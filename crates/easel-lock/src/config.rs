use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for lock acquisition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt before giving up.
    pub max_retries: u32,
    /// Sleep before the first retry; doubles after every failed attempt.
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
        }
    }
}

/// Configuration for the [`crate::LockManager`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockConfig {
    /// Provider-side time-to-live on every acquisition. A holder that
    /// crashes without releasing frees its canvas after this long.
    pub ttl: Duration,
    /// Backoff policy applied when the lock is held.
    pub retry: RetryConfig,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_budget() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.initial_delay, Duration::from_millis(100));
    }

    #[test]
    fn default_ttl_is_seconds() {
        let config = LockConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(5));
    }
}
