//! Foundation types for certchain.
//!
//! This crate provides the data model shared by every other certchain crate.
//!
//! # Key Types
//!
//! - [`Digest`]: SHA-256 digest rendered as lowercase hex; a certificate's public identifier
//! - [`NewCertificate`]: unvalidated issuance attributes
//! - [`CertificateData`]: the hashed portion of a certificate
//! - [`CertificateRecord`]: sealed certificate (data + digest)
//! - [`Block`]: one hash-linked ledger entry
//! - [`Timestamp`]: fixed-format UTC timestamp carried inside hashed data

pub mod block;
pub mod certificate;
pub mod digest;
pub mod error;
pub mod timestamp;

pub use block::{Block, GENESIS_DATA, GENESIS_TIMESTAMP, NO_PREVIOUS_HASH};
pub use certificate::{
    normalize_id, CertificateData, CertificateRecord, NewCertificate, MAX_CERTIFICATE_BYTES,
    MAX_SCORE, MIN_SCORE,
};
pub use digest::Digest;
pub use error::TypeError;
pub use timestamp::Timestamp;
