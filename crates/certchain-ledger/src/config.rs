use std::path::PathBuf;
use std::sync::Arc;

use certchain_crypto::{DEFAULT_DIFFICULTY, DEFAULT_MAX_PROOF};
use certchain_store::{open_file_replicas, ReplicaStore, DEFAULT_REPLICA_FILE};
use serde::{Deserialize, Serialize};

/// Where the ledger replicas live and how hard blocks are to seal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding one `N{i}` subdirectory per replica.
    pub replica_root: PathBuf,
    /// Number of replicas (`N1..=N{replica_count}`).
    pub replica_count: usize,
    /// File name of each replica inside its directory.
    pub file_name: String,
    /// Leading zero hex characters required of a work proof.
    pub difficulty: usize,
    /// Largest work-proof candidate tried.
    pub max_proof: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            replica_root: PathBuf::from("NODES"),
            replica_count: 4,
            file_name: DEFAULT_REPLICA_FILE.to_string(),
            difficulty: DEFAULT_DIFFICULTY,
            max_proof: DEFAULT_MAX_PROOF,
        }
    }
}

impl LedgerConfig {
    /// Config rooted at `replica_root`, other settings default.
    pub fn at(replica_root: impl Into<PathBuf>) -> Self {
        Self {
            replica_root: replica_root.into(),
            ..Self::default()
        }
    }

    /// Open the configured file replicas, in order.
    pub fn open_replicas(&self) -> Vec<Arc<dyn ReplicaStore>> {
        open_file_replicas(&self.replica_root, self.replica_count, &self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.replica_root, PathBuf::from("NODES"));
        assert_eq!(config.replica_count, 4);
        assert_eq!(config.file_name, "blockchain.json");
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.max_proof, 1_000_000);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"replica_root":"/tmp/ledger","difficulty":2}"#).unwrap();
        assert_eq!(config.replica_root, PathBuf::from("/tmp/ledger"));
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.replica_count, 4);
    }

    #[test]
    fn open_replicas_uses_layout() {
        let config = LedgerConfig {
            replica_count: 2,
            ..LedgerConfig::at("/data")
        };
        let ids: Vec<String> = config
            .open_replicas()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["N1", "N2"]);
    }
}
