use crate::traits::ReplicaId;

/// Errors from replica storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The replica could not be replaced (temporary write or atomic rename).
    #[error("write to replica {replica} failed during {stage}: {reason}")]
    WriteFailure {
        replica: ReplicaId,
        stage: &'static str,
        reason: String,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
