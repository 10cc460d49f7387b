use std::collections::BTreeSet;

use certchain_types::{normalize_id, Timestamp};
use serde::{Deserialize, Serialize};

/// Whether an account may act.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

/// A student account. `student_id` is the USN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub department: String,
    pub institution_id: String,
    pub email: String,
    pub phone: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub status: AccountStatus,
}

impl Student {
    pub fn new(
        student_id: &str,
        name: impl Into<String>,
        department: impl Into<String>,
        institution_id: &str,
    ) -> Self {
        Self {
            student_id: normalize_id(student_id),
            name: name.into(),
            department: department.into(),
            institution_id: normalize_id(institution_id),
            email: String::new(),
            phone: String::new(),
            created_at: Timestamp::now(),
            status: AccountStatus::Active,
        }
    }
}

/// An issuing institution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub institution_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub status: AccountStatus,
}

impl Institution {
    pub fn new(institution_id: &str, name: impl Into<String>) -> Self {
        Self {
            institution_id: normalize_id(institution_id),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            created_at: Timestamp::now(),
            status: AccountStatus::Active,
        }
    }
}

/// A verifying company and the institutions whose records it may see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub company_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub industry: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub accessible_institutions: BTreeSet<String>,
}

impl Company {
    pub fn new(company_id: &str, name: impl Into<String>) -> Self {
        Self {
            company_id: normalize_id(company_id),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            industry: String::new(),
            created_at: Timestamp::now(),
            status: AccountStatus::Active,
            accessible_institutions: BTreeSet::new(),
        }
    }

    /// Returns `true` if the company has been granted access to `institution_id`.
    pub fn can_access(&self, institution_id: &str) -> bool {
        self.accessible_institutions
            .contains(&normalize_id(institution_id))
    }
}

/// Grant or revoke a company's access to an institution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessChange {
    Grant,
    Revoke,
}

/// Who performed a logged action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Student,
    Institution,
    Company,
    System,
}

/// One entry in the append-only access log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub actor_kind: ActorKind,
    pub actor_id: String,
    pub action: String,
    #[serde(default)]
    pub details: String,
    pub timestamp: Timestamp,
}

impl AccessLogEntry {
    pub fn new(actor_kind: ActorKind, actor_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            actor_kind,
            actor_id: actor_id.into(),
            action: action.into(),
            details: String::new(),
            timestamp: Timestamp::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}
