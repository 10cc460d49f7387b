use certchain_types::{normalize_id, CertificateRecord};
use serde::{Deserialize, Serialize};

/// Which certificate fields a text search looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Name,
    StudentId,
    Department,
    #[default]
    All,
}

impl std::str::FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "usn" | "student_id" => Ok(Self::StudentId),
            "department" => Ok(Self::Department),
            "all" => Ok(Self::All),
            other => Err(format!("unknown search field: {other}")),
        }
    }
}

/// Case-insensitive substring match over one or more fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextQuery {
    term: String,
    field: SearchField,
}

impl TextQuery {
    pub fn new(term: &str, field: SearchField) -> Self {
        Self {
            term: term.to_lowercase(),
            field,
        }
    }

    pub fn matches(&self, record: &CertificateRecord) -> bool {
        let hit = |value: &str| value.to_lowercase().contains(&self.term);
        let data = &record.data;
        match self.field {
            SearchField::Name => hit(&data.student_name),
            SearchField::StudentId => hit(&data.student_id),
            SearchField::Department => hit(&data.department),
            SearchField::All => {
                hit(&data.student_name) || hit(&data.student_id) || hit(&data.department)
            }
        }
    }
}

/// Conjunction of optional certificate predicates. The empty filter matches
/// everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateFilter {
    pub digest: Option<String>,
    pub student_id: Option<String>,
    pub institution_id: Option<String>,
    /// Restrict to any of these institutions.
    pub institutions: Option<Vec<String>>,
    pub department: Option<String>,
    pub text: Option<TextQuery>,
}

impl CertificateFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_digest(digest: &str) -> Self {
        Self {
            digest: Some(digest.trim().to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn by_student(student_id: &str) -> Self {
        Self {
            student_id: Some(normalize_id(student_id)),
            ..Self::default()
        }
    }

    pub fn by_institution(institution_id: &str) -> Self {
        Self {
            institution_id: Some(normalize_id(institution_id)),
            ..Self::default()
        }
    }

    pub fn in_institution(mut self, institution_id: &str) -> Self {
        self.institution_id = Some(normalize_id(institution_id));
        self
    }

    pub fn in_any_institution<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.institutions = Some(ids.into_iter().map(normalize_id).collect());
        self
    }

    pub fn in_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn matching(mut self, term: &str, field: SearchField) -> Self {
        self.text = Some(TextQuery::new(term, field));
        self
    }

    pub fn matches(&self, record: &CertificateRecord) -> bool {
        let data = &record.data;
        self.digest
            .as_deref()
            .map_or(true, |d| record.digest.to_hex() == d)
            && self
                .student_id
                .as_deref()
                .map_or(true, |s| data.student_id == s)
            && self
                .institution_id
                .as_deref()
                .map_or(true, |i| data.institution_id == i)
            && self
                .institutions
                .as_ref()
                .map_or(true, |set| set.iter().any(|i| *i == data.institution_id))
            && self
                .department
                .as_deref()
                .map_or(true, |d| data.department == d)
            && self.text.as_ref().map_or(true, |t| t.matches(record))
    }
}

/// Order of certificate query results, by creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CertificateSort {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl CertificateSort {
    pub fn apply(self, records: &mut [CertificateRecord]) {
        match self {
            Self::NewestFirst => records.sort_by(|a, b| b.created_at().cmp(a.created_at())),
            Self::OldestFirst => records.sort_by(|a, b| a.created_at().cmp(b.created_at())),
        }
    }
}

/// Access log query. Results are newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessLogQuery {
    pub actor_id: Option<String>,
    pub actor_kind: Option<crate::types::ActorKind>,
    pub limit: usize,
}

impl Default for AccessLogQuery {
    fn default() -> Self {
        Self {
            actor_id: None,
            actor_kind: None,
            limit: 100,
        }
    }
}

impl AccessLogQuery {
    pub fn for_actor(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &crate::types::AccessLogEntry) -> bool {
        self.actor_id
            .as_deref()
            .map_or(true, |id| entry.actor_id == id)
            && self.actor_kind.map_or(true, |k| entry.actor_kind == k)
    }
}

#[cfg(test)]
mod tests {
    use certchain_types::{CertificateData, Digest, Timestamp};

    use super::*;

    fn record(name: &str, usn: &str, dept: &str, inst: &str) -> CertificateRecord {
        CertificateRecord::seal(
            CertificateData {
                student_id: usn.into(),
                student_name: name.into(),
                department: dept.into(),
                institution_id: inst.into(),
                academic_year: "2024".into(),
                joining_date: "2020".into(),
                end_date: "2024".into(),
                score: 9.0,
                certificate_file: b"%PDF".to_vec(),
                personality: String::new(),
                skills: None,
                created_at: Timestamp::from_raw("2025-01-02 00:00:00.000000"),
            },
            Digest::from_hash([7; 32]),
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(CertificateFilter::all().matches(&record("A", "U1", "CSE", "C1")));
    }

    #[test]
    fn digest_filter_is_case_insensitive() {
        let r = record("A", "U1", "CSE", "C1");
        let hex = r.digest.to_hex().to_uppercase();
        assert!(CertificateFilter::by_digest(&hex).matches(&r));
        assert!(!CertificateFilter::by_digest("00").matches(&r));
    }

    #[test]
    fn student_filter_normalizes() {
        let r = record("A", "1ABC", "CSE", "C1");
        assert!(CertificateFilter::by_student("1abc").matches(&r));
    }

    #[test]
    fn text_search_fields() {
        let r = record("Asha Rao", "1ABC21CS001", "Computer Science", "C1");
        assert!(CertificateFilter::all().matching("rao", SearchField::Name).matches(&r));
        assert!(!CertificateFilter::all().matching("rao", SearchField::Department).matches(&r));
        assert!(CertificateFilter::all().matching("cs001", SearchField::StudentId).matches(&r));
        assert!(CertificateFilter::all().matching("SCIENCE", SearchField::All).matches(&r));
    }

    #[test]
    fn institution_set_filter() {
        let r = record("A", "U1", "CSE", "C2");
        assert!(CertificateFilter::all().in_any_institution(["c1", "c2"]).matches(&r));
        assert!(!CertificateFilter::all().in_any_institution(["c1"]).matches(&r));
        assert!(!CertificateFilter::all()
            .in_any_institution(std::iter::empty::<&str>())
            .matches(&r));
    }

    #[test]
    fn search_field_parses() {
        assert_eq!("usn".parse::<SearchField>().unwrap(), SearchField::StudentId);
        assert_eq!("All".parse::<SearchField>().unwrap(), SearchField::All);
        assert!("phone".parse::<SearchField>().is_err());
    }
}
