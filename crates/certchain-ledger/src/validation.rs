use std::sync::Arc;

use certchain_crypto::{check_link, LinkCheck, ProofOfWork};
use certchain_store::{ReplicaContents, ReplicaId, ReplicaStore};
use certchain_types::Block;
use serde::Serialize;

/// Result of validating one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub replica: Option<ReplicaId>,
    pub block_count: u64,
    pub genesis_valid: bool,
    pub indices_contiguous: bool,
    pub links_valid: bool,
    pub proofs_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub index: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    GenesisMismatch,
    SequenceGap,
    LinkMismatch,
    ProofInvalid,
    Unreadable,
}

/// Whole-chain validator.
///
/// Walks every adjacent pair, unlike the two-block check the engine runs on
/// append.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate a block sequence for genesis shape, index continuity, digest
    /// links, and work proofs at `difficulty`.
    pub fn validate(blocks: &[Block], difficulty: usize) -> ValidationReport {
        let pow = ProofOfWork::new(difficulty, 0);
        let mut violations = Vec::new();
        let mut genesis_valid = true;
        let mut indices_contiguous = true;
        let mut links_valid = true;
        let mut proofs_valid = true;

        if let Some(first) = blocks.first() {
            if !first.is_genesis() {
                genesis_valid = false;
                violations.push(Violation {
                    index: first.index,
                    kind: ViolationKind::GenesisMismatch,
                    description: format!(
                        "first block has index {} and previous hash {:?}",
                        first.index, first.previous_hash
                    ),
                });
            }
        }

        for (position, block) in blocks.iter().enumerate() {
            if position > 0 {
                let previous = &blocks[position - 1];
                match check_link(block, Some(previous)) {
                    Ok(LinkCheck::Valid | LinkCheck::NoPredecessor) => {}
                    Ok(LinkCheck::IndexGap { expected, found }) => {
                        indices_contiguous = false;
                        violations.push(Violation {
                            index: block.index,
                            kind: ViolationKind::SequenceGap,
                            description: format!("expected index {expected}, got {found}"),
                        });
                    }
                    Ok(LinkCheck::IndexOverflow { previous }) => {
                        indices_contiguous = false;
                        violations.push(Violation {
                            index: block.index,
                            kind: ViolationKind::SequenceGap,
                            description: format!("predecessor index {previous} has no successor"),
                        });
                    }
                    Ok(LinkCheck::DigestMismatch { expected, found }) => {
                        links_valid = false;
                        violations.push(Violation {
                            index: block.index,
                            kind: ViolationKind::LinkMismatch,
                            description: format!(
                                "previous hash {found} does not match {}",
                                expected.short_hex()
                            ),
                        });
                    }
                    Err(e) => {
                        links_valid = false;
                        violations.push(Violation {
                            index: block.index,
                            kind: ViolationKind::LinkMismatch,
                            description: e.to_string(),
                        });
                    }
                }
            }

            if !block.is_genesis() && !pow.is_valid(&block.previous_hash, &block.data, block.proof) {
                proofs_valid = false;
                violations.push(Violation {
                    index: block.index,
                    kind: ViolationKind::ProofInvalid,
                    description: format!("proof {} does not meet difficulty {difficulty}", block.proof),
                });
            }
        }

        ValidationReport {
            replica: None,
            block_count: blocks.len() as u64,
            genesis_valid,
            indices_contiguous,
            links_valid,
            proofs_valid,
            violations,
        }
    }

    /// Validate every replica independently.
    ///
    /// A replica that cannot be read or decoded yields a single
    /// [`ViolationKind::Unreadable`] violation.
    pub fn validate_replicas(
        replicas: &[Arc<dyn ReplicaStore>],
        difficulty: usize,
    ) -> Vec<ValidationReport> {
        replicas
            .iter()
            .map(|replica| {
                let unreadable = |description: String| ValidationReport {
                    replica: Some(replica.id().clone()),
                    block_count: 0,
                    genesis_valid: false,
                    indices_contiguous: false,
                    links_valid: false,
                    proofs_valid: false,
                    violations: vec![Violation {
                        index: 0,
                        kind: ViolationKind::Unreadable,
                        description,
                    }],
                };
                match replica.load() {
                    Ok(ReplicaContents::Chain(blocks)) => {
                        let mut report = Self::validate(&blocks, difficulty);
                        report.replica = Some(replica.id().clone());
                        report
                    }
                    Ok(ReplicaContents::Absent) => {
                        let mut report = Self::validate(&[], difficulty);
                        report.replica = Some(replica.id().clone());
                        report
                    }
                    Ok(ReplicaContents::Malformed { reason }) => unreadable(reason),
                    Err(e) => unreadable(e.to_string()),
                }
            })
            .collect()
    }
}
