use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use certchain_records::{
    AccessChange, AccessLogQuery, ActorKind, Company, Institution, RecordStore, SearchField,
    Student,
};
use certchain_service::{CompanyQuery, InstitutionSummary, StudentProfile, VerificationOutcome};
use certchain_types::{CertificateRecord, NewCertificate};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ServerError, ServerResult};
use crate::router::AppState;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<serde_json::Value> {
    let ledger = state.service.ledger();
    let replicas: Vec<String> = ledger.replicas().iter().map(|r| r.id().to_string()).collect();
    Json(json!({
        "name": "certchain-server",
        "version": env!("CARGO_PKG_VERSION"),
        "replicas": replicas,
        "difficulty": ledger.difficulty(),
    }))
}

/// Public verification: 200 with the certificate, or 404 `{"verified": false}`.
pub async fn verify_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(digest): Path<String>,
) -> ServerResult<Response> {
    Ok(match state.service.verify_public(&digest)? {
        VerificationOutcome::Verified(record) => {
            Json(json!({ "verified": true, "certificate": record })).into_response()
        }
        VerificationOutcome::NotVerified => {
            (StatusCode::NOT_FOUND, Json(json!({ "verified": false }))).into_response()
        }
    })
}

/// Cross-replica consistency report.
pub async fn consistency_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
) -> ServerResult<Response> {
    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || service.consistency_report())
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Json(report).into_response())
}

/// Issue a certificate. Runs on the blocking pool: the work proof is CPU-bound.
pub async fn issue_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Json(input): Json<NewCertificate>,
) -> ServerResult<Response> {
    let service = state.service.clone();
    let digest = tokio::task::spawn_blocking(move || service.add_certificate(input))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    let body = json!({
        "digest": digest,
        "verification_url": state.service.verification_url(&digest),
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub field: SearchField,
    pub institution: Option<String>,
}

/// Case-insensitive certificate search.
pub async fn search_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<SearchParams>,
) -> ServerResult<Json<Vec<CertificateRecord>>> {
    let results = state
        .service
        .search(&params.q, params.field, params.institution.as_deref())?;
    Ok(Json(results))
}

/// Certificate record by digest.
pub async fn certificate_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(digest): Path<String>,
) -> ServerResult<Json<CertificateRecord>> {
    state
        .service
        .certificate_by_digest(&digest)?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("certificate {digest}")))
}

/// Download the stored certificate PDF.
pub async fn certificate_file_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(digest): Path<String>,
) -> ServerResult<Response> {
    let record = state
        .service
        .certificate_by_digest(&digest)?
        .filter(|r| !r.data.certificate_file.is_empty())
        .ok_or_else(|| ServerError::NotFound(format!("certificate file {digest}")))?;
    let disposition = format!(
        "attachment; filename=\"certificate_{}.pdf\"",
        record.student_id()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        record.data.certificate_file,
    )
        .into_response())
}

/// Company-scoped verification.
pub async fn company_verify_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<String>,
    Json(query): Json<CompanyQuery>,
) -> ServerResult<Json<Vec<CertificateRecord>>> {
    let results = state.service.verify_for_company(&company_id, &query)?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
pub struct InstitutionRegistration {
    pub institution_id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Register an institution.
pub async fn register_institution_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Json(body): Json<InstitutionRegistration>,
) -> ServerResult<Response> {
    let mut institution = Institution::new(&body.institution_id, body.name);
    institution.email = body.email;
    institution.phone = body.phone;
    institution.address = body.address;
    state.service.register_institution(&institution)?;
    Ok((StatusCode::CREATED, Json(institution)).into_response())
}

/// Institution overview with student and certificate counts.
pub async fn institution_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(institution_id): Path<String>,
) -> ServerResult<Json<InstitutionSummary>> {
    Ok(Json(state.service.institution_summary(&institution_id)?))
}

#[derive(Debug, Deserialize)]
pub struct StudentRegistration {
    pub student_id: String,
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Enroll a student at the institution in the path.
pub async fn add_student_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(institution_id): Path<String>,
    Json(body): Json<StudentRegistration>,
) -> ServerResult<Response> {
    let mut student = Student::new(&body.student_id, body.name, body.department, &institution_id);
    student.email = body.email;
    student.phone = body.phone;
    let student = state.service.add_student(&institution_id, student)?;
    Ok((StatusCode::CREATED, Json(student)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct DepartmentParams {
    pub department: Option<String>,
}

/// An institution's students, optionally one department.
pub async fn institution_students_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(institution_id): Path<String>,
    Query(params): Query<DepartmentParams>,
) -> ServerResult<Json<Vec<Student>>> {
    let students = state
        .service
        .students_of(&institution_id, params.department.as_deref())?;
    Ok(Json(students))
}

#[derive(Debug, Deserialize)]
pub struct AccessUpdate {
    pub company_id: String,
    pub action: AccessChange,
}

/// Grant or revoke a company's access to the institution in the path.
pub async fn company_access_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(institution_id): Path<String>,
    Json(update): Json<AccessUpdate>,
) -> ServerResult<StatusCode> {
    state
        .service
        .set_company_access(&institution_id, &update.company_id, update.action)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Student account with their certificates.
pub async fn student_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(student_id): Path<String>,
) -> ServerResult<Json<StudentProfile>> {
    state
        .service
        .student_profile(&student_id)?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("student {student_id}")))
}

#[derive(Debug, Deserialize)]
pub struct CompanyRegistration {
    pub company_id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub industry: String,
}

/// Register a company. It starts with access to no institution.
pub async fn register_company_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Json(body): Json<CompanyRegistration>,
) -> ServerResult<Response> {
    let mut company = Company::new(&body.company_id, body.name);
    company.email = body.email;
    company.phone = body.phone;
    company.industry = body.industry;
    state.service.register_company(&company)?;
    Ok((StatusCode::CREATED, Json(company)).into_response())
}

/// Students of every institution the company may access.
pub async fn company_students_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<String>,
) -> ServerResult<Json<Vec<Student>>> {
    Ok(Json(state.service.students_for_company(&company_id)?))
}

#[derive(Debug, Deserialize)]
pub struct AccessLogParams {
    pub actor_id: Option<String>,
    pub actor_kind: Option<ActorKind>,
    pub limit: Option<usize>,
}

/// Access log, newest first.
pub async fn access_log_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<AccessLogParams>,
) -> ServerResult<Response> {
    let mut query = AccessLogQuery {
        actor_id: params.actor_id.as_deref().map(certchain_types::normalize_id),
        actor_kind: params.actor_kind,
        ..AccessLogQuery::default()
    };
    if let Some(limit) = params.limit {
        query.limit = limit;
    }
    Ok(Json(state.service.access_logs(&query)?).into_response())
}
