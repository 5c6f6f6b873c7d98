use thiserror::Error;

/// Errors from blob store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key cannot be mapped onto the backend's namespace.
    #[error("invalid blob key {key}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
