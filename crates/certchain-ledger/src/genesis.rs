use std::sync::Arc;

use certchain_store::{ReplicaContents, ReplicaId, ReplicaStore};
use certchain_types::Block;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};

/// What [`seed_genesis`] did to each replica.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Replicas that were empty and now hold the genesis block.
    pub seeded: Vec<ReplicaId>,
    /// Replicas that already held a chain and were left alone.
    pub untouched: Vec<ReplicaId>,
    /// Corrupt replicas replaced with the genesis block (only with `force`).
    pub overwritten: Vec<ReplicaId>,
}

impl SeedReport {
    pub fn changed(&self) -> bool {
        !self.seeded.is_empty() || !self.overwritten.is_empty()
    }
}

/// Write `[genesis]` to every replica that has no chain yet.
///
/// Replicas that already hold blocks are never modified, so seeding twice is
/// a no-op. A replica that cannot be read or decoded is refused with
/// [`LedgerError::ReplicaCorrupt`] unless `force` is set, in which case it is
/// replaced. Replicas are checked before any are written.
pub fn seed_genesis(replicas: &[Arc<dyn ReplicaStore>], force: bool) -> LedgerResult<SeedReport> {
    if replicas.is_empty() {
        return Err(LedgerError::NoReplicas);
    }

    enum Plan {
        Seed,
        Keep,
        Overwrite,
    }

    let mut plans = Vec::with_capacity(replicas.len());
    for replica in replicas {
        let problem = match replica.load() {
            Ok(ReplicaContents::Absent) => None,
            Ok(ReplicaContents::Chain(blocks)) if blocks.is_empty() => None,
            Ok(ReplicaContents::Chain(_)) => {
                plans.push(Plan::Keep);
                continue;
            }
            Ok(ReplicaContents::Malformed { reason }) => Some(reason),
            Err(e) => Some(e.to_string()),
        };
        match problem {
            None => plans.push(Plan::Seed),
            Some(reason) if force => {
                warn!(replica = %replica.id(), %reason, "overwriting corrupt replica with genesis");
                plans.push(Plan::Overwrite);
            }
            Some(reason) => {
                return Err(LedgerError::ReplicaCorrupt {
                    replica: replica.id().clone(),
                    reason,
                })
            }
        }
    }

    let genesis = [Block::genesis()];
    let mut report = SeedReport::default();
    for (replica, plan) in replicas.iter().zip(plans) {
        match plan {
            Plan::Keep => report.untouched.push(replica.id().clone()),
            Plan::Seed => {
                write_genesis(replica.as_ref(), &genesis)?;
                report.seeded.push(replica.id().clone());
            }
            Plan::Overwrite => {
                write_genesis(replica.as_ref(), &genesis)?;
                report.overwritten.push(replica.id().clone());
            }
        }
    }

    info!(
        seeded = report.seeded.len(),
        untouched = report.untouched.len(),
        overwritten = report.overwritten.len(),
        "genesis seeding complete"
    );
    Ok(report)
}

fn write_genesis(replica: &dyn ReplicaStore, genesis: &[Block]) -> LedgerResult<()> {
    replica
        .write_replica(genesis)
        .map_err(|e| LedgerError::replica_write(replica.id(), e))
}

#[cfg(test)]
mod tests {
    use certchain_store::InMemoryReplica;
    use certchain_types::Timestamp;

    use super::*;

    fn replicas(n: usize) -> Vec<Arc<InMemoryReplica>> {
        (1..=n)
            .map(|i| Arc::new(InMemoryReplica::new(ReplicaId::numbered(i))))
            .collect()
    }

    fn stores(replicas: &[Arc<InMemoryReplica>]) -> Vec<Arc<dyn ReplicaStore>> {
        replicas
            .iter()
            .map(|r| r.clone() as Arc<dyn ReplicaStore>)
            .collect()
    }

    #[test]
    fn seeds_every_empty_replica() {
        let replicas = replicas(4);
        let report = seed_genesis(&stores(&replicas), false).unwrap();
        assert_eq!(report.seeded.len(), 4);
        for r in &replicas {
            assert_eq!(r.read_replica(), vec![Block::genesis()]);
        }
    }

    #[test]
    fn seeding_is_idempotent() {
        let replicas = replicas(2);
        seed_genesis(&stores(&replicas), false).unwrap();
        let before: Vec<_> = replicas.iter().map(|r| r.raw()).collect();

        let report = seed_genesis(&stores(&replicas), false).unwrap();
        assert!(!report.changed());
        assert_eq!(report.untouched.len(), 2);
        let after: Vec<_> = replicas.iter().map(|r| r.raw()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn existing_chain_is_left_alone() {
        let replicas = replicas(2);
        let mut block = Block::genesis();
        block.timestamp = Timestamp::from_raw("2024-12-31 23:59:59");
        replicas[0].write_replica(&[block.clone()]).unwrap();

        let report = seed_genesis(&stores(&replicas), false).unwrap();
        assert_eq!(report.untouched, vec![ReplicaId::numbered(1)]);
        assert_eq!(report.seeded, vec![ReplicaId::numbered(2)]);
        assert_eq!(replicas[0].read_replica(), vec![block]);
    }

    #[test]
    fn corrupt_replica_refused_without_force() {
        let replicas = replicas(3);
        replicas[1].set_raw("[{");
        let err = seed_genesis(&stores(&replicas), false).unwrap_err();
        assert!(matches!(err, LedgerError::ReplicaCorrupt { ref replica, .. } if *replica == ReplicaId::numbered(2)));
        // Nothing was written.
        assert!(replicas[0].raw().is_none());
    }

    #[test]
    fn force_overwrites_corrupt_replica() {
        let replicas = replicas(2);
        replicas[1].set_raw("[{");
        let report = seed_genesis(&stores(&replicas), true).unwrap();
        assert_eq!(report.overwritten, vec![ReplicaId::numbered(2)]);
        assert_eq!(replicas[1].read_replica(), vec![Block::genesis()]);
    }

    #[test]
    fn no_replicas_is_an_error() {
        assert_eq!(seed_genesis(&[], false).unwrap_err(), LedgerError::NoReplicas);
    }
}
