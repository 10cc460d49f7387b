use std::sync::{Arc, Mutex};

use certchain_crypto::{block_digest, canonical_json, check_link, LinkCheck, ProofOfWork};
use certchain_store::ReplicaStore;
use certchain_types::{Block, CertificateRecord, Timestamp, NO_PREVIOUS_HASH};
use tracing::{debug, error, info, warn};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::integrity::{consistency_report, ConsistencyReport};

/// The only writer of replica storage.
///
/// Appends are serialized by an engine-owned mutex held across the whole
/// read, work proof, validation and write sequence. Readers never take it.
/// Share the engine as `Arc<LedgerEngine>`.
pub struct LedgerEngine {
    replicas: Vec<Arc<dyn ReplicaStore>>,
    pow: ProofOfWork,
    append_lock: Mutex<()>,
}

impl LedgerEngine {
    /// Build an engine over `replicas`. The first replica is the reference copy.
    pub fn new(
        replicas: Vec<Arc<dyn ReplicaStore>>,
        difficulty: usize,
        max_proof: u64,
    ) -> LedgerResult<Self> {
        if replicas.is_empty() {
            return Err(LedgerError::NoReplicas);
        }
        Ok(Self {
            replicas,
            pow: ProofOfWork::new(difficulty, max_proof),
            append_lock: Mutex::new(()),
        })
    }

    /// Engine over the file replicas described by `config`.
    pub fn from_config(config: &LedgerConfig) -> LedgerResult<Self> {
        Self::new(config.open_replicas(), config.difficulty, config.max_proof)
    }

    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.pow.difficulty = difficulty;
        self
    }

    pub fn replicas(&self) -> &[Arc<dyn ReplicaStore>] {
        &self.replicas
    }

    pub fn difficulty(&self) -> usize {
        self.pow.difficulty
    }

    pub fn max_proof(&self) -> u64 {
        self.pow.max_proof
    }

    /// Chain held by the reference replica (`N1`).
    pub fn reference_chain(&self) -> Vec<Block> {
        self.replicas[0].read_replica()
    }

    /// Compare every replica's contents.
    pub fn consistency_report(&self) -> ConsistencyReport {
        consistency_report(&self.replicas)
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency_report().is_consistent()
    }

    /// Seal `record` into a new block and write it to every replica.
    ///
    /// The block's `data` is the canonical JSON of the whole record. Replicas
    /// are written in order and the first failure aborts; replicas already
    /// written keep the new block.
    pub fn append_certificate_block(&self, record: &CertificateRecord) -> LedgerResult<Block> {
        let data = canonical_json(record)?;
        let block = self.append_data(data)?;
        info!(
            index = block.index,
            proof = block.proof,
            digest = %record.digest,
            "certificate block appended"
        );
        Ok(block)
    }

    fn append_data(&self, data: String) -> LedgerResult<Block> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| LedgerError::LockPoisoned)?;

        let mut chain = self.reference_chain();
        let (index, previous_hash) = match chain.last() {
            Some(last) => {
                let index = last.index.checked_add(1).ok_or_else(|| {
                    warn!(index = last.index, "reference chain tip is at the maximum index");
                    LedgerError::InvalidBlock {
                        index: last.index,
                        reason: "index overflow".into(),
                    }
                })?;
                (index, block_digest(last)?.to_hex())
            }
            None => (1, NO_PREVIOUS_HASH.to_string()),
        };

        let proof = self.pow.solve(&previous_hash, &data).map_err(|e| {
            error!(index, difficulty = self.pow.difficulty, error = %e, "work proof search exhausted");
            LedgerError::from(e)
        })?;

        let block = Block {
            index,
            proof,
            previous_hash,
            timestamp: Timestamp::now(),
            data,
        };

        match check_link(&block, chain.last())? {
            LinkCheck::Valid | LinkCheck::NoPredecessor => {}
            invalid => {
                return Err(LedgerError::InvalidBlock {
                    index,
                    reason: format!("{invalid:?}"),
                })
            }
        }

        chain.push(block.clone());
        for replica in &self.replicas {
            replica.write_replica(&chain).map_err(|e| {
                warn!(replica = %replica.id(), index, error = %e, "replica write failed");
                LedgerError::replica_write(replica.id(), e)
            })?;
            debug!(replica = %replica.id(), index, "replica updated");
        }

        Ok(block)
    }
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.replicas.iter().map(|r| r.id().to_string()).collect();
        f.debug_struct("LedgerEngine")
            .field("replicas", &ids)
            .field("pow", &self.pow)
            .finish()
    }
}
