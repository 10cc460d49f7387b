//! Replica storage for certchain.
//!
//! A replica is one durable copy of the ledger: an ordered sequence of
//! [`Block`](certchain_types::Block)s stored as a pretty-printed JSON array.
//! The ledger keeps several replicas and rewrites each of them in full on
//! every append.
//!
//! # Storage Backends
//!
//! All backends implement the [`ReplicaStore`] trait:
//!
//! - [`FileReplica`] -- one JSON file per replica, `<root>/N{i}/blockchain.json`
//! - [`InMemoryReplica`] -- byte buffer with failure injection, for tests
//!
//! # Design Rules
//!
//! 1. A write replaces the whole sequence atomically (temp file + rename).
//! 2. A failed write leaves no temporary artifact.
//! 3. Reads never mutate storage.
//! 4. Missing, empty, and malformed contents are reported distinctly by
//!    [`ReplicaStore::load`]; [`ReplicaStore::read_replica`] collapses them
//!    to an empty chain.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{open_file_replicas, FileReplica, DEFAULT_REPLICA_FILE};
pub use memory::InMemoryReplica;
pub use traits::{decode_blocks, encode_blocks, ReplicaContents, ReplicaId, ReplicaStore};
