use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;
use crate::timestamp::Timestamp;

/// Largest certificate payload accepted at issuance (10 MiB).
pub const MAX_CERTIFICATE_BYTES: usize = 10 * 1024 * 1024;

/// Inclusive score bounds.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Magic prefix every certificate document must carry.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// Attributes submitted by an institution to issue a certificate.
///
/// Nothing here is trusted: [`NewCertificate::validate`] must pass before the
/// attributes are turned into hashed [`CertificateData`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCertificate {
    pub student_id: String,
    pub student_name: String,
    pub department: String,
    pub institution_id: String,
    pub academic_year: String,
    pub joining_date: String,
    pub end_date: String,
    pub score: f64,
    #[serde(with = "base64_bytes")]
    pub certificate_file: Vec<u8>,
    pub personality: String,
    #[serde(default)]
    pub skills: Option<String>,
}

impl NewCertificate {
    /// Check field presence, score range, and payload shape.
    pub fn validate(&self, max_payload_bytes: usize) -> Result<(), TypeError> {
        let required = [
            ("student_id", &self.student_id),
            ("student_name", &self.student_name),
            ("department", &self.department),
            ("institution_id", &self.institution_id),
            ("academic_year", &self.academic_year),
            ("joining_date", &self.joining_date),
            ("end_date", &self.end_date),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(TypeError::MissingField(name));
            }
        }

        if !self.score.is_finite() || self.score < MIN_SCORE || self.score > MAX_SCORE {
            return Err(TypeError::InvalidScore(self.score));
        }

        if self.certificate_file.is_empty() {
            return Err(TypeError::InvalidPayload("file is empty".into()));
        }
        if self.certificate_file.len() > max_payload_bytes {
            return Err(TypeError::InvalidPayload(format!(
                "file is {} bytes, limit is {max_payload_bytes}",
                self.certificate_file.len()
            )));
        }
        if !self.certificate_file.starts_with(PDF_MAGIC) {
            return Err(TypeError::InvalidPayload("not a PDF document".into()));
        }
        Ok(())
    }

    /// Normalize identifiers and stamp the creation time.
    pub fn into_data(self, created_at: Timestamp) -> CertificateData {
        CertificateData {
            student_id: normalize_id(&self.student_id),
            student_name: self.student_name,
            department: self.department,
            institution_id: normalize_id(&self.institution_id),
            academic_year: self.academic_year,
            joining_date: self.joining_date,
            end_date: self.end_date,
            score: self.score,
            certificate_file: self.certificate_file,
            personality: self.personality,
            skills: self.skills.filter(|s| !s.trim().is_empty()),
            created_at,
        }
    }
}

/// Identifiers are compared case-insensitively by storing them uppercased.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// The hashed portion of a certificate: every field except the digest itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertificateData {
    pub student_id: String,
    pub student_name: String,
    pub department: String,
    pub institution_id: String,
    pub academic_year: String,
    pub joining_date: String,
    pub end_date: String,
    pub score: f64,
    #[serde(with = "base64_bytes")]
    pub certificate_file: Vec<u8>,
    pub personality: String,
    #[serde(default)]
    pub skills: Option<String>,
    pub created_at: Timestamp,
}

/// A sealed certificate: its data plus the digest computed over that data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    #[serde(flatten)]
    pub data: CertificateData,
    pub digest: Digest,
}

impl CertificateRecord {
    /// Attach a digest that was computed over `data`.
    pub fn seal(data: CertificateData, digest: Digest) -> Self {
        Self { data, digest }
    }

    pub fn student_id(&self) -> &str {
        &self.data.student_id
    }

    pub fn institution_id(&self) -> &str {
        &self.data.institution_id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.data.created_at
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> NewCertificate {
        NewCertificate {
            student_id: "1abc21cs001".into(),
            student_name: "John Doe".into(),
            department: "Computer Science".into(),
            institution_id: "abc001".into(),
            academic_year: "2021-2025".into(),
            joining_date: "2021-08-01".into(),
            end_date: "2025-06-30".into(),
            score: 8.7,
            certificate_file: b"%PDF-1.7 minimal".to_vec(),
            personality: "Diligent".into(),
            skills: Some("Rust, SQL".into()),
        }
    }

    #[test]
    fn valid_attributes_pass() {
        assert!(attrs().validate(MAX_CERTIFICATE_BYTES).is_ok());
    }

    #[test]
    fn score_above_ten_rejected() {
        let mut a = attrs();
        a.score = 11.0;
        assert_eq!(a.validate(MAX_CERTIFICATE_BYTES), Err(TypeError::InvalidScore(11.0)));
    }

    #[test]
    fn negative_and_nan_scores_rejected() {
        let mut a = attrs();
        a.score = -0.5;
        assert!(a.validate(MAX_CERTIFICATE_BYTES).is_err());
        a.score = f64::NAN;
        assert!(a.validate(MAX_CERTIFICATE_BYTES).is_err());
    }

    #[test]
    fn score_bounds_inclusive() {
        let mut a = attrs();
        a.score = 0.0;
        assert!(a.validate(MAX_CERTIFICATE_BYTES).is_ok());
        a.score = 10.0;
        assert!(a.validate(MAX_CERTIFICATE_BYTES).is_ok());
    }

    #[test]
    fn blank_required_field_rejected() {
        let mut a = attrs();
        a.department = "   ".into();
        assert_eq!(
            a.validate(MAX_CERTIFICATE_BYTES),
            Err(TypeError::MissingField("department"))
        );
    }

    #[test]
    fn payload_checks() {
        let mut a = attrs();
        a.certificate_file = vec![];
        assert!(matches!(
            a.validate(MAX_CERTIFICATE_BYTES),
            Err(TypeError::InvalidPayload(_))
        ));

        a.certificate_file = b"PK\x03\x04 zip".to_vec();
        assert!(matches!(
            a.validate(MAX_CERTIFICATE_BYTES),
            Err(TypeError::InvalidPayload(_))
        ));

        a.certificate_file = b"%PDF-too-long".to_vec();
        assert!(a.validate(8).is_err());
    }

    #[test]
    fn into_data_uppercases_identifiers() {
        let data = attrs().into_data(Timestamp::from_raw("2025-01-01 00:00:00.000000"));
        assert_eq!(data.student_id, "1ABC21CS001");
        assert_eq!(data.institution_id, "ABC001");
        assert_eq!(data.student_name, "John Doe");
    }

    #[test]
    fn blank_skills_become_absent() {
        let mut a = attrs();
        a.skills = Some("  ".into());
        let data = a.into_data(Timestamp::now());
        assert_eq!(data.skills, None);
    }

    #[test]
    fn record_flattens_data_and_digest() {
        let data = attrs().into_data(Timestamp::from_raw("2025-01-01 00:00:00.000000"));
        let record = CertificateRecord::seal(data, Digest::from_hash([7; 32]));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["student_id"], "1ABC21CS001");
        assert_eq!(value["digest"], Digest::from_hash([7; 32]).to_hex());
        assert_eq!(value["certificate_file"], "JVBERi0xLjcgbWluaW1hbA==");

        let decoded: CertificateRecord = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, record);
    }
}
