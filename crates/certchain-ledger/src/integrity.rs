use std::collections::BTreeSet;
use std::sync::Arc;

use certchain_crypto::CanonicalHasher;
use certchain_store::{ReplicaContents, ReplicaId, ReplicaStore};
use certchain_types::{Block, Digest};
use serde::Serialize;
use tracing::{info, warn};

/// State of one replica as seen by the integrity check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplicaStatus {
    pub replica: ReplicaId,
    pub block_count: usize,
    /// Canonical digest of the whole chain, when it could be read.
    pub digest: Option<Digest>,
    /// Why the replica could not be read, when it could not.
    pub problem: Option<String>,
}

/// Cross-replica comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub replicas: Vec<ReplicaStatus>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Distinct chain digests across readable replicas.
    pub fn distinct_digests(&self) -> BTreeSet<Digest> {
        self.replicas.iter().filter_map(|r| r.digest).collect()
    }
}

/// Inspect every replica and compare the digests of their full contents.
///
/// A missing replica counts as an empty chain. A replica that cannot be read
/// or decoded is a problem and makes the ledger inconsistent, even if it
/// would otherwise collapse to the same empty chain as its peers.
pub fn consistency_report(replicas: &[Arc<dyn ReplicaStore>]) -> ConsistencyReport {
    let statuses: Vec<ReplicaStatus> = replicas.iter().map(|r| inspect(r.as_ref())).collect();

    let problems = statuses.iter().any(|s| s.problem.is_some());
    let digests: BTreeSet<Digest> = statuses.iter().filter_map(|s| s.digest).collect();
    let consistent = !problems && digests.len() == 1;

    if consistent {
        info!(replicas = statuses.len(), "ledger replicas consistent");
    } else {
        warn!(
            replicas = statuses.len(),
            distinct = digests.len(),
            problems,
            "ledger replicas diverge"
        );
    }

    ConsistencyReport {
        consistent,
        replicas: statuses,
    }
}

/// `true` iff every replica holds the identical chain.
///
/// Never fails: read problems are folded into a `false` answer.
pub fn is_ledger_consistent(replicas: &[Arc<dyn ReplicaStore>]) -> bool {
    consistency_report(replicas).is_consistent()
}

fn inspect(replica: &dyn ReplicaStore) -> ReplicaStatus {
    let chain = match replica.load() {
        Ok(ReplicaContents::Chain(blocks)) => blocks,
        Ok(ReplicaContents::Absent) => Vec::new(),
        Ok(ReplicaContents::Malformed { reason }) => {
            return problem(replica, format!("malformed: {reason}"))
        }
        Err(e) => return problem(replica, format!("unreadable: {e}")),
    };

    match CanonicalHasher::digest(&chain) {
        Ok(digest) => ReplicaStatus {
            replica: replica.id().clone(),
            block_count: chain.len(),
            digest: Some(digest),
            problem: None,
        },
        Err(e) => problem(replica, e.to_string()),
    }
}

fn problem(replica: &dyn ReplicaStore, reason: String) -> ReplicaStatus {
    ReplicaStatus {
        replica: replica.id().clone(),
        block_count: 0,
        digest: None,
        problem: Some(reason),
    }
}
