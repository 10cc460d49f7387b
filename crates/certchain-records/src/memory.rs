use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use certchain_types::{normalize_id, CertificateRecord};
use tracing::debug;

use crate::error::{RecordError, RecordResult};
use crate::filter::{AccessLogQuery, CertificateFilter, CertificateSort};
use crate::traits::RecordStore;
use crate::types::{AccessChange, AccessLogEntry, Company, Institution, Student};

#[derive(Debug, Default)]
struct Collections {
    /// Insertion order is preserved; the digest index enforces uniqueness.
    certificates: Vec<CertificateRecord>,
    certificate_digests: HashMap<String, usize>,
    students: BTreeMap<String, Student>,
    institutions: BTreeMap<String, Institution>,
    companies: BTreeMap<String, Company>,
    access_log: Vec<AccessLogEntry>,
}

impl Collections {
    fn reindex(&mut self) {
        self.certificate_digests = self
            .certificates
            .iter()
            .enumerate()
            .map(|(i, r)| (r.digest.to_hex(), i))
            .collect();
    }
}

/// An in-memory implementation of [`RecordStore`].
///
/// Inserts and deletes can be made to fail on demand so callers' error
/// handling can be exercised.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<Collections>,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryRecordStore {
    /// Create a new empty record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make certificate inserts fail (or succeed again).
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make certificate deletes fail (or succeed again).
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored certificates.
    pub fn certificate_count(&self) -> usize {
        self.read().map(|c| c.certificates.len()).unwrap_or(0)
    }

    fn read(&self) -> RecordResult<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|e| RecordError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> RecordResult<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|e| RecordError::Unavailable(format!("lock poisoned: {e}")))
    }
}

fn insert_unique<T: Clone>(
    map: &mut BTreeMap<String, T>,
    collection: &'static str,
    key: &str,
    value: &T,
) -> RecordResult<()> {
    if map.contains_key(key) {
        return Err(RecordError::DuplicateKey {
            collection,
            key: key.to_string(),
        });
    }
    map.insert(key.to_string(), value.clone());
    Ok(())
}

impl RecordStore for InMemoryRecordStore {
    fn insert_certificate(&self, record: &CertificateRecord) -> RecordResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RecordError::Unavailable("inserts disabled".into()));
        }
        let mut inner = self.write()?;
        let key = record.digest.to_hex();
        if inner.certificate_digests.contains_key(&key) {
            return Err(RecordError::DuplicateKey {
                collection: "certificates",
                key,
            });
        }
        let position = inner.certificates.len();
        inner.certificates.push(record.clone());
        inner.certificate_digests.insert(key, position);
        debug!(digest = %record.digest, "certificate inserted");
        Ok(())
    }

    fn find_certificate(&self, filter: &CertificateFilter) -> RecordResult<Option<CertificateRecord>> {
        let inner = self.read()?;
        if let (Some(digest), true) = (filter.digest.as_deref(), filter.text.is_none()) {
            return Ok(inner
                .certificate_digests
                .get(digest)
                .map(|&i| &inner.certificates[i])
                .filter(|r| filter.matches(r))
                .cloned());
        }
        Ok(inner.certificates.iter().find(|r| filter.matches(r)).cloned())
    }

    fn find_certificates(
        &self,
        filter: &CertificateFilter,
        sort: CertificateSort,
    ) -> RecordResult<Vec<CertificateRecord>> {
        let inner = self.read()?;
        let mut found: Vec<CertificateRecord> = inner
            .certificates
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort.apply(&mut found);
        Ok(found)
    }

    fn count_certificates(&self, filter: &CertificateFilter) -> RecordResult<usize> {
        let inner = self.read()?;
        Ok(inner.certificates.iter().filter(|r| filter.matches(r)).count())
    }

    fn delete_certificates(&self, filter: &CertificateFilter) -> RecordResult<usize> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RecordError::Unavailable("deletes disabled".into()));
        }
        let mut inner = self.write()?;
        let before = inner.certificates.len();
        inner.certificates.retain(|r| !filter.matches(r));
        let removed = before - inner.certificates.len();
        if removed > 0 {
            inner.reindex();
        }
        Ok(removed)
    }

    fn insert_student(&self, student: &Student) -> RecordResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.students, "students", &student.student_id, student)
    }

    fn find_student(&self, student_id: &str) -> RecordResult<Option<Student>> {
        Ok(self.read()?.students.get(&normalize_id(student_id)).cloned())
    }

    fn students_of(
        &self,
        institution_id: &str,
        department: Option<&str>,
    ) -> RecordResult<Vec<Student>> {
        let institution_id = normalize_id(institution_id);
        let inner = self.read()?;
        let mut students: Vec<Student> = inner
            .students
            .values()
            .filter(|s| s.institution_id == institution_id)
            .filter(|s| department.map_or(true, |d| s.department == d))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    fn insert_institution(&self, institution: &Institution) -> RecordResult<()> {
        let mut inner = self.write()?;
        insert_unique(
            &mut inner.institutions,
            "institutions",
            &institution.institution_id,
            institution,
        )
    }

    fn find_institution(&self, institution_id: &str) -> RecordResult<Option<Institution>> {
        Ok(self
            .read()?
            .institutions
            .get(&normalize_id(institution_id))
            .cloned())
    }

    fn insert_company(&self, company: &Company) -> RecordResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.companies, "companies", &company.company_id, company)
    }

    fn find_company(&self, company_id: &str) -> RecordResult<Option<Company>> {
        Ok(self.read()?.companies.get(&normalize_id(company_id)).cloned())
    }

    fn update_company_access(
        &self,
        company_id: &str,
        institution_id: &str,
        change: AccessChange,
    ) -> RecordResult<()> {
        let key = normalize_id(company_id);
        let institution_id = normalize_id(institution_id);
        let mut inner = self.write()?;
        let company = inner
            .companies
            .get_mut(&key)
            .ok_or_else(|| RecordError::NotFound {
                collection: "companies",
                key: key.clone(),
            })?;
        match change {
            AccessChange::Grant => {
                company.accessible_institutions.insert(institution_id);
            }
            AccessChange::Revoke => {
                company.accessible_institutions.remove(&institution_id);
            }
        }
        Ok(())
    }

    fn append_access_log(&self, entry: &AccessLogEntry) -> RecordResult<()> {
        self.write()?.access_log.push(entry.clone());
        Ok(())
    }

    fn access_logs(&self, query: &AccessLogQuery) -> RecordResult<Vec<AccessLogEntry>> {
        let inner = self.read()?;
        let mut entries: Vec<AccessLogEntry> = inner
            .access_log
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        // Stable sort keeps later appends ahead of earlier ones on equal timestamps.
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(query.limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use certchain_types::{CertificateData, Digest, Timestamp};

    use super::*;
    use crate::filter::SearchField;
    use crate::types::ActorKind;

    fn record(seed: u8, usn: &str, inst: &str, created_at: &str) -> CertificateRecord {
        CertificateRecord::seal(
            CertificateData {
                student_id: usn.into(),
                student_name: format!("Student {seed}"),
                department: "CSE".into(),
                institution_id: inst.into(),
                academic_year: "2024".into(),
                joining_date: "2020-08-01".into(),
                end_date: "2024-06-30".into(),
                score: 7.5,
                certificate_file: b"%PDF-1.4".to_vec(),
                personality: "Calm".into(),
                skills: None,
                created_at: Timestamp::from_raw(created_at),
            },
            Digest::from_hash([seed; 32]),
        )
    }

    #[test]
    fn insert_and_find_by_digest() {
        let store = InMemoryRecordStore::new();
        let r = record(1, "U1", "C1", "2025-01-01 00:00:00.000000");
        store.insert_certificate(&r).unwrap();

        let found = store.certificate_by_digest(&r.digest.to_hex()).unwrap();
        assert_eq!(found, Some(r));
        assert!(store.certificate_by_digest(&"0".repeat(64)).unwrap().is_none());
    }

    #[test]
    fn duplicate_digest_rejected() {
        let store = InMemoryRecordStore::new();
        let r = record(1, "U1", "C1", "2025-01-01 00:00:00.000000");
        store.insert_certificate(&r).unwrap();
        let err = store.insert_certificate(&r).unwrap_err();
        assert!(matches!(err, RecordError::DuplicateKey { collection: "certificates", .. }));
        assert_eq!(store.certificate_count(), 1);
    }

    #[test]
    fn newest_first_ordering() {
        let store = InMemoryRecordStore::new();
        store.insert_certificate(&record(1, "U1", "C1", "2025-01-01 00:00:00.000000")).unwrap();
        store.insert_certificate(&record(2, "U1", "C1", "2025-03-01 00:00:00.000000")).unwrap();
        store.insert_certificate(&record(3, "U1", "C1", "2025-02-01 00:00:00.000000")).unwrap();

        let found = store
            .find_certificates(&CertificateFilter::by_student("u1"), CertificateSort::NewestFirst)
            .unwrap();
        let seeds: Vec<u8> = found.iter().map(|r| r.digest.as_bytes()[0]).collect();
        assert_eq!(seeds, vec![2, 3, 1]);
    }

    #[test]
    fn delete_by_digest_reindexes() {
        let store = InMemoryRecordStore::new();
        let a = record(1, "U1", "C1", "2025-01-01 00:00:00.000000");
        let b = record(2, "U2", "C1", "2025-01-02 00:00:00.000000");
        store.insert_certificate(&a).unwrap();
        store.insert_certificate(&b).unwrap();

        let removed = store
            .delete_certificates(&CertificateFilter::by_digest(&a.digest.to_hex()))
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.certificate_by_digest(&a.digest.to_hex()).unwrap().is_none());
        assert_eq!(store.certificate_by_digest(&b.digest.to_hex()).unwrap(), Some(b));
    }

    #[test]
    fn count_and_search() {
        let store = InMemoryRecordStore::new();
        store.insert_certificate(&record(1, "U1", "C1", "2025-01-01 00:00:00.000000")).unwrap();
        store.insert_certificate(&record(2, "U2", "C2", "2025-01-01 00:00:00.000000")).unwrap();
        assert_eq!(store.count_certificates(&CertificateFilter::all()).unwrap(), 2);
        assert_eq!(
            store
                .count_certificates(&CertificateFilter::by_institution("c2").matching("student", SearchField::Name))
                .unwrap(),
            1
        );
    }

    #[test]
    fn failure_switches() {
        let store = InMemoryRecordStore::new();
        let r = record(1, "U1", "C1", "2025-01-01 00:00:00.000000");
        store.set_fail_inserts(true);
        assert!(store.insert_certificate(&r).is_err());
        store.set_fail_inserts(false);
        store.insert_certificate(&r).unwrap();

        store.set_fail_deletes(true);
        assert!(store.delete_certificates(&CertificateFilter::all()).is_err());
        assert_eq!(store.certificate_count(), 1);
    }

    #[test]
    fn students_sorted_by_name() {
        let store = InMemoryRecordStore::new();
        store.insert_student(&Student::new("u2", "Zed", "CSE", "c1")).unwrap();
        store.insert_student(&Student::new("u1", "Amy", "ECE", "c1")).unwrap();
        store.insert_student(&Student::new("u3", "Bob", "CSE", "c2")).unwrap();

        let names: Vec<String> = store
            .students_of("C1", None)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
        assert_eq!(store.students_of("c1", Some("CSE")).unwrap().len(), 1);
        assert!(store.find_student("U1").unwrap().is_some());
        assert!(matches!(
            store.insert_student(&Student::new("U1", "Dup", "CSE", "c1")),
            Err(RecordError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn grant_and_revoke_access() {
        let store = InMemoryRecordStore::new();
        store.insert_company(&Company::new("acme", "Acme")).unwrap();
        store.insert_institution(&Institution::new("c1", "College One")).unwrap();

        store.update_company_access("ACME", "c1", AccessChange::Grant).unwrap();
        store.update_company_access("ACME", "c1", AccessChange::Grant).unwrap();
        let company = store.find_company("acme").unwrap().unwrap();
        assert_eq!(company.accessible_institutions.len(), 1);
        assert!(company.can_access("C1"));

        store.update_company_access("acme", "C1", AccessChange::Revoke).unwrap();
        assert!(!store.find_company("acme").unwrap().unwrap().can_access("C1"));

        assert!(matches!(
            store.update_company_access("nobody", "C1", AccessChange::Grant),
            Err(RecordError::NotFound { .. })
        ));
        assert!(store.find_institution("C1").unwrap().is_some());
    }

    #[test]
    fn access_log_newest_first_with_limit() {
        let store = InMemoryRecordStore::new();
        for i in 0..5 {
            let mut entry = AccessLogEntry::new(ActorKind::Institution, "C1", format!("action {i}"));
            entry.timestamp = Timestamp::from_raw(format!("2025-01-0{} 00:00:00.000000", i + 1));
            store.append_access_log(&entry).unwrap();
        }
        store
            .append_access_log(&AccessLogEntry::new(ActorKind::Company, "ACME", "verify"))
            .unwrap();

        let query = AccessLogQuery {
            limit: 2,
            ..AccessLogQuery::for_actor("C1")
        };
        let actions: Vec<String> = store
            .access_logs(&query)
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["action 4", "action 3"]);
    }
}
