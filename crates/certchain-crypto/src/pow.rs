use certchain_types::Digest;
use tracing::debug;

use crate::hasher::CanonicalHasher;

/// Default number of leading zero hex characters a proof must produce.
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Largest candidate tried before the search gives up.
pub const DEFAULT_MAX_PROOF: u64 = 1_000_000;

/// Difficulty-bounded work proof over a block's link and payload.
///
/// A candidate `p` is accepted when
/// `sha256(previous_hash ‖ data ‖ decimal(p))` starts with `difficulty` `'0'`
/// hex characters. This is a tunable delay, not a security control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    pub difficulty: usize,
    pub max_proof: u64,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_proof: DEFAULT_MAX_PROOF,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize, max_proof: u64) -> Self {
        Self {
            difficulty,
            max_proof,
        }
    }

    /// Digest a candidate proof is judged by.
    pub fn attempt_digest(previous_hash: &str, data: &str, candidate: u64) -> Digest {
        CanonicalHasher::digest_concat(&[
            previous_hash.as_bytes(),
            data.as_bytes(),
            candidate.to_string().as_bytes(),
        ])
    }

    /// Returns `true` if `candidate` satisfies this difficulty.
    pub fn is_valid(&self, previous_hash: &str, data: &str, candidate: u64) -> bool {
        Self::attempt_digest(previous_hash, data, candidate).has_leading_zero_nibbles(self.difficulty)
    }

    /// Smallest accepted candidate in `0..=max_proof`, searched in ascending order.
    pub fn solve(&self, previous_hash: &str, data: &str) -> Result<u64, ProofError> {
        for candidate in 0..=self.max_proof {
            if self.is_valid(previous_hash, data, candidate) {
                debug!(candidate, difficulty = self.difficulty, "work proof found");
                return Ok(candidate);
            }
        }
        Err(ProofError::Exhausted {
            ceiling: self.max_proof,
            difficulty: self.difficulty,
        })
    }
}

/// Errors from the work-proof search.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("no work proof at difficulty {difficulty} within 0..={ceiling}")]
    Exhausted { ceiling: u64, difficulty: usize },
}
