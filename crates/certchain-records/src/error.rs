use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A record with the same unique key already exists.
    #[error("duplicate key in {collection}: {key}")]
    DuplicateKey {
        collection: &'static str,
        key: String,
    },

    /// The record targeted by an update was not found.
    #[error("{collection} record not found: {key}")]
    NotFound {
        collection: &'static str,
        key: String,
    },

    /// The store could not serve the request.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for record store operations.
pub type RecordResult<T> = std::result::Result<T, RecordError>;
