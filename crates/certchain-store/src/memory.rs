use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use certchain_types::Block;

use crate::error::{StoreError, StoreResult};
use crate::traits::{decode_blocks, encode_blocks, ReplicaContents, ReplicaId, ReplicaStore};

/// In-memory replica.
///
/// Holds the encoded bytes exactly as a file replica would, so truncation and
/// corruption can be simulated with [`set_raw`](Self::set_raw). Writes can be
/// made to fail on demand.
pub struct InMemoryReplica {
    id: ReplicaId,
    bytes: RwLock<Option<Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl InMemoryReplica {
    /// Create an empty (absent) replica.
    pub fn new(id: ReplicaId) -> Self {
        Self {
            id,
            bytes: RwLock::new(None),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Create a replica already holding `blocks`.
    pub fn with_blocks(id: ReplicaId, blocks: &[Block]) -> StoreResult<Self> {
        let replica = Self::new(id);
        replica.write_replica(blocks)?;
        Ok(replica)
    }

    /// Overwrite the stored bytes directly, bypassing encoding.
    pub fn set_raw(&self, bytes: impl Into<Vec<u8>>) {
        *self.bytes.write().expect("lock poisoned") = Some(bytes.into());
    }

    /// Current stored bytes, if any.
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.bytes.read().expect("lock poisoned").clone()
    }

    /// Truncate the replica to zero bytes.
    pub fn truncate(&self) {
        self.set_raw(Vec::new());
    }

    /// Remove the replica entirely.
    pub fn clear(&self) {
        *self.bytes.write().expect("lock poisoned") = None;
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ReplicaStore for InMemoryReplica {
    fn id(&self) -> &ReplicaId {
        &self.id
    }

    fn load(&self) -> StoreResult<ReplicaContents> {
        let guard = self.bytes.read().expect("lock poisoned");
        Ok(match guard.as_deref() {
            None => ReplicaContents::Absent,
            Some(bytes) => decode_blocks(bytes),
        })
    }

    fn write_replica(&self, blocks: &[Block]) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailure {
                replica: self.id.clone(),
                stage: "temporary write",
                reason: "writes disabled".into(),
            });
        }
        let bytes = encode_blocks(blocks)?;
        *self.bytes.write().expect("lock poisoned") = Some(bytes);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryReplica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryReplica")
            .field("id", &self.id)
            .field("fail_writes", &self.fail_writes.load(Ordering::SeqCst))
            .finish()
    }
}
