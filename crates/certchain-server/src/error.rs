use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use certchain_records::RecordError;
use certchain_service::ServiceError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("ledger error: {0}")]
    Ledger(#[from] certchain_ledger::LedgerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_)
            | Self::Service(
                ServiceError::UnknownCompany(_) | ServiceError::UnknownInstitution(_),
            ) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::InvalidInput(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Service(ServiceError::Record(RecordError::DuplicateKey { .. })) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
