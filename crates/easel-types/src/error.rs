use thiserror::Error;

/// Errors from type construction and state encoding.
#[derive(Debug, Error)]
pub enum TypeError {
    /// The string is not a valid transaction id.
    #[error("invalid transaction id: {0}")]
    InvalidTxId(String),

    /// Serialization or deserialization of a snapshot failed.
    #[error("state serialization error: {0}")]
    Serialization(String),
}
