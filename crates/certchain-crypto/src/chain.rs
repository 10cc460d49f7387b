use certchain_types::{Block, Digest};

use crate::hasher::{CanonicalHasher, HasherError};

/// Outcome of checking one block against its immediate predecessor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkCheck {
    /// Index and previous-digest both line up.
    Valid,
    /// No predecessor was supplied; accepted without checks.
    NoPredecessor,
    /// `block.index` is not `previous.index + 1`.
    IndexGap { expected: u64, found: u64 },
    /// `block.previous_hash` is not the digest of the predecessor.
    DigestMismatch { expected: Digest, found: String },
    /// The predecessor's index is `u64::MAX`; nothing can follow it.
    IndexOverflow { previous: u64 },
}

impl LinkCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid | Self::NoPredecessor)
    }
}

/// Canonical digest of a whole block, as referenced by its successor.
pub fn block_digest(block: &Block) -> Result<Digest, HasherError> {
    CanonicalHasher::digest(block)
}

/// Local two-block link check.
///
/// Only the new link is verified: the predecessor's own history is not
/// re-walked. With no predecessor any block is accepted, since genesis is
/// seeded outside the append path.
pub fn check_link(block: &Block, previous: Option<&Block>) -> Result<LinkCheck, HasherError> {
    let Some(previous) = previous else {
        return Ok(LinkCheck::NoPredecessor);
    };

    let Some(expected_index) = previous.index.checked_add(1) else {
        return Ok(LinkCheck::IndexOverflow {
            previous: previous.index,
        });
    };
    if block.index != expected_index {
        return Ok(LinkCheck::IndexGap {
            expected: expected_index,
            found: block.index,
        });
    }

    let expected = block_digest(previous)?;
    if block.previous_hash != expected.to_hex() {
        return Ok(LinkCheck::DigestMismatch {
            expected,
            found: block.previous_hash.clone(),
        });
    }

    Ok(LinkCheck::Valid)
}

/// Boolean form of [`check_link`].
pub fn is_valid_block(block: &Block, previous: Option<&Block>) -> Result<bool, HasherError> {
    Ok(check_link(block, previous)?.is_valid())
}

#[cfg(test)]
mod tests {
    use certchain_types::Timestamp;

    use super::*;

    fn next_block(previous: &Block) -> Block {
        Block {
            index: previous.index + 1,
            proof: 7,
            previous_hash: block_digest(previous).unwrap().to_hex(),
            timestamp: Timestamp::from_raw("2025-02-01 10:00:00.000000"),
            data: "{\"digest\":\"x\"}".into(),
        }
    }

    #[test]
    fn first_block_without_predecessor_is_accepted() {
        let mut block = next_block(&Block::genesis());
        block.index = 99;
        block.previous_hash = "garbage".into();
        assert_eq!(check_link(&block, None).unwrap(), LinkCheck::NoPredecessor);
        assert!(is_valid_block(&block, None).unwrap());
    }

    #[test]
    fn correct_link_is_valid() {
        let genesis = Block::genesis();
        let block = next_block(&genesis);
        assert_eq!(check_link(&block, Some(&genesis)).unwrap(), LinkCheck::Valid);
    }

    #[test]
    fn index_gap_detected() {
        let genesis = Block::genesis();
        let mut block = next_block(&genesis);
        block.index = 2;
        assert_eq!(
            check_link(&block, Some(&genesis)).unwrap(),
            LinkCheck::IndexGap {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn wrong_previous_digest_detected() {
        let genesis = Block::genesis();
        let mut block = next_block(&genesis);
        block.previous_hash = "0".into();
        let check = check_link(&block, Some(&genesis)).unwrap();
        assert!(matches!(check, LinkCheck::DigestMismatch { .. }));
        assert!(!is_valid_block(&block, Some(&genesis)).unwrap());
    }

    #[test]
    fn tampered_predecessor_breaks_link() {
        let genesis = Block::genesis();
        let block = next_block(&genesis);
        let mut tampered = genesis.clone();
        tampered.data = "Forged Genesis".into();
        assert!(!is_valid_block(&block, Some(&tampered)).unwrap());
    }

    #[test]
    fn predecessor_at_max_index_overflows() {
        let mut previous = Block::genesis();
        previous.index = u64::MAX;
        let block = next_block(&Block::genesis());
        assert_eq!(
            check_link(&block, Some(&previous)).unwrap(),
            LinkCheck::IndexOverflow { previous: u64::MAX }
        );
        assert!(!is_valid_block(&block, Some(&previous)).unwrap());
    }

    #[test]
    fn block_digest_is_stable() {
        let a = block_digest(&Block::genesis()).unwrap();
        let b = block_digest(&Block::genesis()).unwrap();
        assert_eq!(a, b);
    }
}
