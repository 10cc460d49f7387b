use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use certchain_records::RecordStore;
use certchain_service::CertificateService;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Shared handler state.
pub struct AppState<S: RecordStore> {
    pub service: Arc<CertificateService<S>>,
}

impl<S: RecordStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: RecordStore> AppState<S> {
    pub fn new(service: Arc<CertificateService<S>>) -> Self {
        Self { service }
    }
}

/// Build the axum router with all certchain endpoints.
pub fn build_router<S: RecordStore + 'static>(state: AppState<S>, body_limit: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler::<S>))
        .route("/verify/:digest", get(handler::verify_handler::<S>))
        .route(
            "/v1/ledger/consistency",
            get(handler::consistency_handler::<S>),
        )
        .route("/v1/certificates", post(handler::issue_handler::<S>))
        .route(
            "/v1/certificates/search",
            get(handler::search_handler::<S>),
        )
        .route(
            "/v1/certificates/:digest",
            get(handler::certificate_handler::<S>),
        )
        .route(
            "/v1/certificates/:digest/file",
            get(handler::certificate_file_handler::<S>),
        )
        .route(
            "/v1/institutions",
            post(handler::register_institution_handler::<S>),
        )
        .route(
            "/v1/institutions/:institution_id",
            get(handler::institution_handler::<S>),
        )
        .route(
            "/v1/institutions/:institution_id/students",
            get(handler::institution_students_handler::<S>).post(handler::add_student_handler::<S>),
        )
        .route(
            "/v1/institutions/:institution_id/access",
            put(handler::company_access_handler::<S>),
        )
        .route("/v1/students/:student_id", get(handler::student_handler::<S>))
        .route("/v1/companies", post(handler::register_company_handler::<S>))
        .route(
            "/v1/companies/:company_id/students",
            get(handler::company_students_handler::<S>),
        )
        .route(
            "/v1/companies/:company_id/verify",
            post(handler::company_verify_handler::<S>),
        )
        .route("/v1/access-logs", get(handler::access_log_handler::<S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
