//! Certificate service for certchain.
//!
//! The entry point for applications issuing and checking certificates. It
//! ties the record store, the ledger, and QR rendering together:
//!
//! - [`CertificateService::add_certificate`] validates, hashes, stores, seals
//!   into the ledger (rolling the store back on failure), and renders a QR
//!   code for the verification URL
//! - lookups by digest, student, institution, and free-text search
//! - public and company-scoped verification
//! - institution, company, and student accounts with company access grants
//! - [`QrGenerator`] / [`SvgQrGenerator`] for the QR side effect

pub mod error;
pub mod qr;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use qr::{qr_file_name, render_svg, QrError, QrGenerator, SvgQrGenerator};
pub use service::{
    CertificateService, CompanyQuery, InstitutionSummary, StudentProfile, VerificationOutcome,
    DEFAULT_VERIFICATION_BASE_URL,
};

// Re-export key types
pub use certchain_ledger::{ConsistencyReport, LedgerConfig, LedgerEngine};
pub use certchain_records::{
    AccessChange, AccessLogQuery, Company, InMemoryRecordStore, Institution, RecordStore,
    SearchField, Student,
};
pub use certchain_types::{CertificateRecord, Digest, NewCertificate};
