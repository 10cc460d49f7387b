use std::collections::BTreeMap;
use std::sync::Arc;

use certchain_crypto::CanonicalHasher;
use certchain_ledger::{ConsistencyReport, LedgerEngine};
use certchain_records::{
    AccessChange, AccessLogEntry, AccessLogQuery, ActorKind, CertificateFilter, CertificateSort,
    Company, Institution, RecordError, RecordStore, SearchField, Student,
};
use certchain_types::{
    normalize_id, CertificateRecord, Digest, NewCertificate, Timestamp, TypeError,
    MAX_CERTIFICATE_BYTES,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::qr::{qr_file_name, QrGenerator};

/// Base of the public verification URL encoded into QR codes.
pub const DEFAULT_VERIFICATION_BASE_URL: &str = "http://127.0.0.1:5000/verify/";

/// Result of a public verification lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum VerificationOutcome {
    Verified(Box<CertificateRecord>),
    NotVerified,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// How a company looks a certificate up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum CompanyQuery {
    StudentId(String),
    Digest(String),
}

impl CompanyQuery {
    fn value(&self) -> &str {
        match self {
            Self::StudentId(v) | Self::Digest(v) => v,
        }
    }
}

/// An institution with its student and certificate counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstitutionSummary {
    pub institution: Institution,
    pub student_count: usize,
    pub certificate_count: usize,
    /// Students per department.
    pub departments: BTreeMap<String, usize>,
}

/// A student with their certificates, newest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StudentProfile {
    pub student: Student,
    pub certificates: Vec<CertificateRecord>,
}

fn require(value: &str, field: &'static str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(TypeError::MissingField(field).into());
    }
    Ok(())
}

/// Issues and looks up certificates.
///
/// Issuance writes the record store first, then seals the record into the
/// ledger. A ledger failure removes the record again. QR generation and the
/// access log are best-effort side effects.
pub struct CertificateService<S: RecordStore> {
    records: Arc<S>,
    ledger: Arc<LedgerEngine>,
    qr: Arc<dyn QrGenerator>,
    verification_base_url: String,
    max_payload_bytes: usize,
}

impl<S: RecordStore> CertificateService<S> {
    pub fn new(records: Arc<S>, ledger: Arc<LedgerEngine>, qr: Arc<dyn QrGenerator>) -> Self {
        Self {
            records,
            ledger,
            qr,
            verification_base_url: DEFAULT_VERIFICATION_BASE_URL.to_string(),
            max_payload_bytes: MAX_CERTIFICATE_BYTES,
        }
    }

    pub fn with_verification_base_url(mut self, base: impl Into<String>) -> Self {
        self.verification_base_url = base.into();
        self
    }

    pub fn with_max_payload_bytes(mut self, max: usize) -> Self {
        self.max_payload_bytes = max;
        self
    }

    pub fn records(&self) -> &Arc<S> {
        &self.records
    }

    pub fn ledger(&self) -> &Arc<LedgerEngine> {
        &self.ledger
    }

    /// Public URL at which `digest` can be verified.
    pub fn verification_url(&self, digest: &Digest) -> String {
        format!("{}{}", self.verification_base_url, digest)
    }

    // ---- Issuance ----

    /// Issue a certificate and return its digest.
    ///
    /// Blocks for the duration of the work proof.
    pub fn add_certificate(&self, input: NewCertificate) -> ServiceResult<Digest> {
        input.validate(self.max_payload_bytes)?;

        let data = input.into_data(Timestamp::now());
        let digest = CanonicalHasher::digest(&data)?;
        let record = CertificateRecord::seal(data, digest);

        self.records.insert_certificate(&record).map_err(|e| {
            error!(%digest, error = %e, "certificate insert failed");
            ServiceError::InsertFailure(e)
        })?;

        if let Err(e) = self.ledger.append_certificate_block(&record) {
            error!(%digest, error = %e, "ledger append failed, rolling back record");
            self.roll_back(&digest);
            return Err(ServiceError::LedgerFailure(e));
        }

        let url = self.verification_url(&digest);
        let file_name = qr_file_name(&record.data.student_name, &Timestamp::now());
        match self.qr.generate(&url, &file_name) {
            Ok(path) => info!(%digest, path = %path.display(), "QR code generated"),
            Err(e) => warn!(%digest, error = %e, "QR generation failed"),
        }

        self.log_access(
            AccessLogEntry::new(
                ActorKind::Institution,
                record.institution_id(),
                format!("Added certificate for {}", record.student_id()),
            )
            .with_details(digest.to_hex()),
        );

        info!(%digest, student = record.student_id(), %url, "certificate issued");
        Ok(digest)
    }

    fn roll_back(&self, digest: &Digest) {
        match self
            .records
            .delete_certificates(&CertificateFilter::by_digest(&digest.to_hex()))
        {
            Ok(0) => warn!(%digest, "rollback found no record to delete"),
            Ok(_) => info!(%digest, "record rolled back"),
            Err(e) => error!(%digest, error = %e, "rollback delete failed"),
        }
    }

    fn log_access(&self, entry: AccessLogEntry) {
        if let Err(e) = self.records.append_access_log(&entry) {
            warn!(actor = %entry.actor_id, error = %e, "access log write failed");
        }
    }

    // ---- Lookup ----

    pub fn certificate_by_digest(&self, digest: &str) -> ServiceResult<Option<CertificateRecord>> {
        Ok(self.records.certificate_by_digest(digest)?)
    }

    /// A student's certificates, newest first.
    pub fn certificates_by_student(&self, student_id: &str) -> ServiceResult<Vec<CertificateRecord>> {
        Ok(self.records.find_certificates(
            &CertificateFilter::by_student(student_id),
            CertificateSort::NewestFirst,
        )?)
    }

    /// An institution's certificates, optionally one department, newest first.
    pub fn certificates_by_institution(
        &self,
        institution_id: &str,
        department: Option<&str>,
    ) -> ServiceResult<Vec<CertificateRecord>> {
        let mut filter = CertificateFilter::by_institution(institution_id);
        if let Some(department) = department {
            filter = filter.in_department(department);
        }
        Ok(self
            .records
            .find_certificates(&filter, CertificateSort::NewestFirst)?)
    }

    /// Case-insensitive substring search, newest first.
    pub fn search(
        &self,
        term: &str,
        field: SearchField,
        institution_id: Option<&str>,
    ) -> ServiceResult<Vec<CertificateRecord>> {
        let mut filter = CertificateFilter::all().matching(term, field);
        if let Some(institution_id) = institution_id {
            filter = filter.in_institution(institution_id);
        }
        Ok(self
            .records
            .find_certificates(&filter, CertificateSort::NewestFirst)?)
    }

    /// Stored payload of a certificate, for download.
    pub fn certificate_file(&self, digest: &str) -> ServiceResult<Option<Vec<u8>>> {
        Ok(self
            .certificate_by_digest(digest)?
            .map(|record| record.data.certificate_file)
            .filter(|bytes| !bytes.is_empty()))
    }

    // ---- Verification ----

    /// Anonymous lookup by digest.
    ///
    /// A stored record whose data no longer hashes to its digest is reported
    /// as not verified.
    pub fn verify_public(&self, digest: &str) -> ServiceResult<VerificationOutcome> {
        let Some(record) = self.certificate_by_digest(digest)? else {
            return Ok(VerificationOutcome::NotVerified);
        };
        if !CanonicalHasher::verify(&record.data, &record.digest)? {
            warn!(digest = %record.digest, "stored certificate does not match its digest");
            return Ok(VerificationOutcome::NotVerified);
        }
        Ok(VerificationOutcome::Verified(Box::new(record)))
    }

    /// Lookup on behalf of a company, limited to institutions that granted it access.
    pub fn verify_for_company(
        &self,
        company_id: &str,
        query: &CompanyQuery,
    ) -> ServiceResult<Vec<CertificateRecord>> {
        let company = self.company(company_id)?;

        let base = match query {
            CompanyQuery::StudentId(id) => CertificateFilter::by_student(id),
            CompanyQuery::Digest(d) => CertificateFilter::by_digest(d),
        };
        let filter = base.in_any_institution(company.accessible_institutions.iter().map(String::as_str));
        let results = self
            .records
            .find_certificates(&filter, CertificateSort::NewestFirst)?;

        if !results.is_empty() {
            self.log_access(AccessLogEntry::new(
                ActorKind::Company,
                company.company_id.as_str(),
                format!("Verified student {}", query.value()),
            ));
        }
        Ok(results)
    }

    /// Grant or revoke a company's access to an institution's certificates.
    ///
    /// Both accounts must be registered.
    pub fn set_company_access(
        &self,
        institution_id: &str,
        company_id: &str,
        change: AccessChange,
    ) -> ServiceResult<()> {
        self.institution(institution_id)?;
        self.records
            .update_company_access(company_id, institution_id, change)
            .map_err(|e| match e {
                RecordError::NotFound { key, .. } => ServiceError::UnknownCompany(key),
                other => ServiceError::Record(other),
            })?;
        let company_id = normalize_id(company_id);
        let action = match change {
            AccessChange::Grant => format!("Granted access to company {company_id}"),
            AccessChange::Revoke => format!("Revoked access from company {company_id}"),
        };
        info!(
            institution = %normalize_id(institution_id),
            company = %company_id,
            ?change,
            "company access updated"
        );
        self.log_access(AccessLogEntry::new(
            ActorKind::Institution,
            normalize_id(institution_id),
            action,
        ));
        Ok(())
    }

    /// Students of every institution the company may access, sorted by name.
    pub fn students_for_company(&self, company_id: &str) -> ServiceResult<Vec<Student>> {
        let company = self.company(company_id)?;
        let mut students = Vec::new();
        for institution_id in &company.accessible_institutions {
            students.extend(self.records.students_of(institution_id, None)?);
        }
        students.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.student_id.cmp(&b.student_id)));
        Ok(students)
    }

    // ---- Accounts ----

    pub fn register_institution(&self, institution: &Institution) -> ServiceResult<()> {
        require(&institution.institution_id, "institution_id")?;
        require(&institution.name, "name")?;
        self.records.insert_institution(institution)?;
        info!(institution = %institution.institution_id, "institution registered");
        self.log_access(AccessLogEntry::new(
            ActorKind::System,
            "SYSTEM",
            format!("Registered institution {}", institution.institution_id),
        ));
        Ok(())
    }

    pub fn register_company(&self, company: &Company) -> ServiceResult<()> {
        require(&company.company_id, "company_id")?;
        require(&company.name, "name")?;
        self.records.insert_company(company)?;
        info!(company = %company.company_id, "company registered");
        self.log_access(AccessLogEntry::new(
            ActorKind::System,
            "SYSTEM",
            format!("Registered company {}", company.company_id),
        ));
        Ok(())
    }

    /// Enroll a student at a registered institution.
    ///
    /// The student's institution is always `institution_id`, whatever the
    /// input carried.
    pub fn add_student(&self, institution_id: &str, mut student: Student) -> ServiceResult<Student> {
        let institution = self.institution(institution_id)?;
        require(&student.student_id, "student_id")?;
        require(&student.name, "name")?;
        require(&student.department, "department")?;
        student.student_id = normalize_id(&student.student_id);
        student.institution_id = institution.institution_id;

        self.records.insert_student(&student)?;
        self.log_access(AccessLogEntry::new(
            ActorKind::Institution,
            student.institution_id.as_str(),
            format!("Added student {}", student.student_id),
        ));
        Ok(student)
    }

    pub fn student_profile(&self, student_id: &str) -> ServiceResult<Option<StudentProfile>> {
        let Some(student) = self.records.find_student(student_id)? else {
            return Ok(None);
        };
        let certificates = self.certificates_by_student(&student.student_id)?;
        Ok(Some(StudentProfile {
            student,
            certificates,
        }))
    }

    /// An institution's students, optionally one department, sorted by name.
    pub fn students_of(
        &self,
        institution_id: &str,
        department: Option<&str>,
    ) -> ServiceResult<Vec<Student>> {
        self.institution(institution_id)?;
        Ok(self.records.students_of(institution_id, department)?)
    }

    pub fn institution_summary(&self, institution_id: &str) -> ServiceResult<InstitutionSummary> {
        let institution = self.institution(institution_id)?;
        let students = self.records.students_of(&institution.institution_id, None)?;
        let certificate_count = self
            .records
            .count_certificates(&CertificateFilter::by_institution(&institution.institution_id))?;

        let mut departments = BTreeMap::new();
        for student in &students {
            *departments.entry(student.department.clone()).or_insert(0) += 1;
        }
        Ok(InstitutionSummary {
            institution,
            student_count: students.len(),
            certificate_count,
            departments,
        })
    }

    /// Access log entries, newest first.
    pub fn access_logs(&self, query: &AccessLogQuery) -> ServiceResult<Vec<AccessLogEntry>> {
        Ok(self.records.access_logs(query)?)
    }

    fn institution(&self, institution_id: &str) -> ServiceResult<Institution> {
        self.records
            .find_institution(institution_id)?
            .ok_or_else(|| ServiceError::UnknownInstitution(normalize_id(institution_id)))
    }

    fn company(&self, company_id: &str) -> ServiceResult<Company> {
        self.records
            .find_company(company_id)?
            .ok_or_else(|| ServiceError::UnknownCompany(normalize_id(company_id)))
    }

    // ---- Ledger ----

    /// `true` iff every ledger replica holds the identical chain.
    pub fn ledger_consistent(&self) -> bool {
        self.ledger.is_consistent()
    }

    pub fn consistency_report(&self) -> ConsistencyReport {
        self.ledger.consistency_report()
    }
}
