use certchain_crypto::{HasherError, ProofError};
use certchain_store::{ReplicaId, StoreError};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no work proof found within 0..={ceiling} at difficulty {difficulty}")]
    ProofOfWorkExhausted { ceiling: u64, difficulty: usize },

    #[error("invalid block at index {index}: {reason}")]
    InvalidBlock { index: u64, reason: String },

    #[error("write to replica {replica} failed: {reason}")]
    ReplicaWriteFailure { replica: ReplicaId, reason: String },

    #[error("replica {replica} is corrupt: {reason}")]
    ReplicaCorrupt { replica: ReplicaId, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("append lock poisoned by a panicked writer")]
    LockPoisoned,

    #[error("ledger has no replicas")]
    NoReplicas,
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<HasherError> for LedgerError {
    fn from(e: HasherError) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<ProofError> for LedgerError {
    fn from(e: ProofError) -> Self {
        match e {
            ProofError::Exhausted {
                ceiling,
                difficulty,
            } => Self::ProofOfWorkExhausted {
                ceiling,
                difficulty,
            },
        }
    }
}

impl LedgerError {
    /// Attribute a store error to the replica it came from.
    pub(crate) fn replica_write(replica: &ReplicaId, err: StoreError) -> Self {
        let reason = match err {
            StoreError::WriteFailure { stage, reason, .. } => format!("{stage}: {reason}"),
            other => other.to_string(),
        };
        Self::ReplicaWriteFailure {
            replica: replica.clone(),
            reason,
        }
    }
}
