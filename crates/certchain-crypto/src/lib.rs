//! Cryptographic primitives for certchain.
//!
//! Provides canonical SHA-256 hashing of structured records, the
//! difficulty-bounded work proof used when sealing blocks, and the local
//! two-block link check.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod chain;
pub mod hasher;
pub mod pow;

pub use chain::{block_digest, check_link, is_valid_block, LinkCheck};
pub use hasher::{canonical_json, CanonicalHasher, HasherError};
pub use pow::{ProofError, ProofOfWork, DEFAULT_DIFFICULTY, DEFAULT_MAX_PROOF};
