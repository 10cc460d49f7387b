use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::timestamp::Timestamp;

/// Link value stored in the first real block when the chain was empty.
pub const NO_PREVIOUS_HASH: &str = "0";

/// Payload of the pre-seeded genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

/// Fixed timestamp of the pre-seeded genesis block.
pub const GENESIS_TIMESTAMP: &str = "2025-01-01 00:00:00";

/// One append-only ledger entry.
///
/// `data` holds the canonical JSON of the sealed certificate record; the block
/// itself is hashed as a whole when the next block links to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub proof: u64,
    pub previous_hash: String,
    pub timestamp: Timestamp,
    pub data: String,
}

impl Block {
    /// The index-0 block seeded into every replica before the first append.
    pub fn genesis() -> Self {
        Self {
            index: 0,
            proof: 0,
            previous_hash: NO_PREVIOUS_HASH.to_string(),
            timestamp: Timestamp::from_raw(GENESIS_TIMESTAMP),
            data: GENESIS_DATA.to_string(),
        }
    }

    /// Returns `true` if this block has the genesis shape.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == NO_PREVIOUS_HASH
    }

    /// The previous-block digest, or `None` for the `"0"` sentinel.
    ///
    /// Also `None` when the stored link is not valid hex; callers that need to
    /// tell those apart compare `previous_hash` directly.
    pub fn previous_digest(&self) -> Option<Digest> {
        if self.previous_hash == NO_PREVIOUS_HASH {
            return None;
        }
        Digest::from_hex(&self.previous_hash).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_shape() {
        let g = Block::genesis();
        assert!(g.is_genesis());
        assert_eq!(g.proof, 0);
        assert_eq!(g.data, GENESIS_DATA);
        assert_eq!(g.previous_digest(), None);
    }

    #[test]
    fn json_field_names() {
        let value = serde_json::to_value(Block::genesis()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "index": 0,
                "proof": 0,
                "previous_hash": "0",
                "timestamp": "2025-01-01 00:00:00",
                "data": "Genesis Block",
            })
        );
    }

    #[test]
    fn previous_digest_parses_hex_link() {
        let d = Digest::from_hash([3; 32]);
        let block = Block {
            index: 1,
            proof: 42,
            previous_hash: d.to_hex(),
            timestamp: Timestamp::now(),
            data: "{}".into(),
        };
        assert_eq!(block.previous_digest(), Some(d));
        assert!(!block.is_genesis());
    }
}
