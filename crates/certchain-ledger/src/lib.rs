//! Hash-linked certificate ledger for certchain.
//!
//! This crate is the heart of certchain. It provides:
//! - [`LedgerEngine`]: the single writer, appending sealed blocks under an
//!   engine-owned lock and writing them to every replica
//! - [`seed_genesis`]: idempotent genesis seeding of empty replicas
//! - [`consistency_report`] / [`is_ledger_consistent`]: cross-replica digest
//!   comparison
//! - [`ChainValidator`]: full-chain validation (genesis, indices, links, proofs)
//! - [`LedgerConfig`]: replica layout and work-proof settings

pub mod config;
pub mod engine;
pub mod error;
pub mod genesis;
pub mod integrity;
pub mod validation;

pub use config::LedgerConfig;
pub use engine::LedgerEngine;
pub use error::{LedgerError, LedgerResult};
pub use genesis::{seed_genesis, SeedReport};
pub use integrity::{consistency_report, is_ledger_consistent, ConsistencyReport, ReplicaStatus};
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
