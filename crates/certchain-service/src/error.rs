use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid certificate input: {0}")]
    InvalidInput(#[from] certchain_types::TypeError),

    #[error("certificate could not be stored: {0}")]
    InsertFailure(#[source] certchain_records::RecordError),

    #[error("certificate could not be sealed into the ledger: {0}")]
    LedgerFailure(#[source] certchain_ledger::LedgerError),

    #[error("company not found: {0}")]
    UnknownCompany(String),

    #[error("institution not found: {0}")]
    UnknownInstitution(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("record store error: {0}")]
    Record(#[from] certchain_records::RecordError),
}

impl From<certchain_crypto::HasherError> for ServiceError {
    fn from(e: certchain_crypto::HasherError) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
