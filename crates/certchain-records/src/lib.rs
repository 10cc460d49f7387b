//! Record store for certchain.
//!
//! Certificates and the accounts around them (students, institutions,
//! companies) live here, next to an append-only access log. The ledger only
//! references certificates; this store is where they are looked up.
//!
//! # Modules
//!
//! - [`error`]: Error types for record operations
//! - [`types`]: Account and audit records: [`Student`], [`Institution`], [`Company`], [`AccessLogEntry`]
//! - [`filter`]: [`CertificateFilter`], [`SearchField`], [`CertificateSort`]
//! - [`traits`]: The [`RecordStore`] trait defining the storage interface
//! - [`memory`]: In-memory [`InMemoryRecordStore`]

pub mod error;
pub mod filter;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{RecordError, RecordResult};
pub use filter::{AccessLogQuery, CertificateFilter, CertificateSort, SearchField, TextQuery};
pub use memory::InMemoryRecordStore;
pub use traits::RecordStore;
pub use types::{AccessChange, AccessLogEntry, AccountStatus, ActorKind, Company, Institution, Student};
