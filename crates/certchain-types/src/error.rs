use thiserror::Error;

/// Errors produced by type operations and attribute validation.
#[derive(Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("score must be between 0 and 10, got {0}")]
    InvalidScore(f64),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid certificate payload: {0}")]
    InvalidPayload(String),
}
