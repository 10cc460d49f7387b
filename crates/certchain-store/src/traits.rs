use std::fmt;

use certchain_types::Block;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};

/// Label of one replica (`N1`, `N2`, ...).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaId(String);

impl ReplicaId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// One-based replica label, matching the on-disk directory name.
    pub fn numbered(n: usize) -> Self {
        Self(format!("N{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReplicaId({})", self.0)
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a replica's storage location currently holds.
///
/// "No chain yet" and "storage is broken" are separate variants so callers
/// that care (the integrity checker, genesis seeding) can tell them apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicaContents {
    /// The location does not exist or is empty.
    Absent,
    /// A decoded block sequence.
    Chain(Vec<Block>),
    /// The location holds bytes that do not decode as a block sequence.
    Malformed { reason: String },
}

impl ReplicaContents {
    /// Collapse to a block sequence: absent and malformed become empty.
    pub fn into_blocks(self) -> Vec<Block> {
        match self {
            Self::Chain(blocks) => blocks,
            Self::Absent | Self::Malformed { .. } => Vec::new(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Durable storage of one ledger replica.
///
/// Implementations must satisfy these invariants:
/// - `write_replica` replaces the whole sequence atomically: a concurrent
///   `load` sees either the old sequence or the new one, never a mix.
/// - A failed write leaves no temporary artifact behind.
/// - Reads never mutate storage.
pub trait ReplicaStore: Send + Sync {
    /// The replica's label.
    fn id(&self) -> &ReplicaId;

    /// Load and classify the replica's contents.
    ///
    /// Returns `Err` only on I/O failure; undecodable content is
    /// `Ok(ReplicaContents::Malformed)`.
    fn load(&self) -> StoreResult<ReplicaContents>;

    /// Replace the replica's contents with `blocks`.
    fn write_replica(&self, blocks: &[Block]) -> StoreResult<()>;

    /// Read the block sequence, treating anything unreadable as "no chain yet".
    ///
    /// Never fails. Malformed content and I/O errors are logged and reported
    /// as an empty sequence.
    fn read_replica(&self) -> Vec<Block> {
        match self.load() {
            Ok(ReplicaContents::Chain(blocks)) => blocks,
            Ok(ReplicaContents::Absent) => Vec::new(),
            Ok(ReplicaContents::Malformed { reason }) => {
                warn!(replica = %self.id(), %reason, "malformed replica read as empty chain");
                Vec::new()
            }
            Err(e) => {
                warn!(replica = %self.id(), error = %e, "unreadable replica read as empty chain");
                Vec::new()
            }
        }
    }
}

/// Serialize a block sequence the way replicas store it (pretty JSON array).
pub fn encode_blocks(blocks: &[Block]) -> StoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(blocks).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Classify raw replica bytes.
pub fn decode_blocks(bytes: &[u8]) -> ReplicaContents {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return ReplicaContents::Absent;
    }
    match serde_json::from_slice::<Vec<Block>>(bytes) {
        Ok(blocks) => ReplicaContents::Chain(blocks),
        Err(e) => ReplicaContents::Malformed {
            reason: e.to_string(),
        },
    }
}
