use certchain_types::CertificateRecord;

use crate::error::RecordResult;
use crate::filter::{AccessLogQuery, CertificateFilter, CertificateSort};
use crate::types::{AccessChange, AccessLogEntry, Company, Institution, Student};

/// Storage backend for certificates, accounts, and the access log.
///
/// Implementations must be thread-safe (`Send + Sync`). Unique keys:
/// certificate digest, student id, institution id, company id. Inserting a
/// second record with an existing key fails with
/// [`RecordError::DuplicateKey`](crate::RecordError::DuplicateKey).
pub trait RecordStore: Send + Sync {
    /// Insert a sealed certificate.
    fn insert_certificate(&self, record: &CertificateRecord) -> RecordResult<()>;

    /// First certificate matching `filter`, if any.
    fn find_certificate(&self, filter: &CertificateFilter) -> RecordResult<Option<CertificateRecord>>;

    /// Every certificate matching `filter`, ordered by `sort`.
    fn find_certificates(
        &self,
        filter: &CertificateFilter,
        sort: CertificateSort,
    ) -> RecordResult<Vec<CertificateRecord>>;

    /// Number of certificates matching `filter`.
    fn count_certificates(&self, filter: &CertificateFilter) -> RecordResult<usize>;

    /// Delete every certificate matching `filter`, returning how many went.
    fn delete_certificates(&self, filter: &CertificateFilter) -> RecordResult<usize>;

    fn insert_student(&self, student: &Student) -> RecordResult<()>;

    fn find_student(&self, student_id: &str) -> RecordResult<Option<Student>>;

    /// Students of an institution, optionally one department, sorted by name.
    fn students_of(
        &self,
        institution_id: &str,
        department: Option<&str>,
    ) -> RecordResult<Vec<Student>>;

    fn insert_institution(&self, institution: &Institution) -> RecordResult<()>;

    fn find_institution(&self, institution_id: &str) -> RecordResult<Option<Institution>>;

    fn insert_company(&self, company: &Company) -> RecordResult<()>;

    fn find_company(&self, company_id: &str) -> RecordResult<Option<Company>>;

    /// Add or remove `institution_id` from a company's accessible set.
    ///
    /// Granting twice or revoking an absent grant is a no-op. Fails with
    /// [`RecordError::NotFound`](crate::RecordError::NotFound) for an unknown
    /// company.
    fn update_company_access(
        &self,
        company_id: &str,
        institution_id: &str,
        change: AccessChange,
    ) -> RecordResult<()>;

    /// Append to the access log.
    fn append_access_log(&self, entry: &AccessLogEntry) -> RecordResult<()>;

    /// Access log entries matching `query`, newest first, at most `query.limit`.
    fn access_logs(&self, query: &AccessLogQuery) -> RecordResult<Vec<AccessLogEntry>>;

    /// Certificate by its digest.
    fn certificate_by_digest(&self, digest: &str) -> RecordResult<Option<CertificateRecord>> {
        self.find_certificate(&CertificateFilter::by_digest(digest))
    }
}
