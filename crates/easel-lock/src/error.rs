use thiserror::Error;

/// Errors from lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock was still held after the full retry budget.
    #[error("lock {key} still held after {attempts} attempts")]
    Contended { key: String, attempts: u32 },

    /// Backend failure (poisoned table, provider transport error).
    #[error("lock backend error: {0}")]
    Internal(String),
}

/// Result alias for lock operations.
pub type LockResult<T> = Result<T, LockError>;
