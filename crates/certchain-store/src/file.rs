use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use certchain_types::Block;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{decode_blocks, encode_blocks, ReplicaContents, ReplicaId, ReplicaStore};

/// Default file name of a replica inside its directory.
pub const DEFAULT_REPLICA_FILE: &str = "blockchain.json";

/// Replica stored as one JSON file.
///
/// Writes go to a temporary file in the same directory, are synced, and are
/// then renamed over the target. Rename within one directory is atomic, so
/// readers never observe a partially written chain.
pub struct FileReplica {
    id: ReplicaId,
    path: PathBuf,
}

impl FileReplica {
    pub fn new(id: ReplicaId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Replica `N{n}` laid out as `<root>/N{n}/<file_name>`.
    pub fn in_root(root: &Path, n: usize, file_name: &str) -> Self {
        let id = ReplicaId::numbered(n);
        let path = root.join(id.as_str()).join(file_name);
        Self { id, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_failure(&self, stage: &'static str, err: impl ToString) -> StoreError {
        StoreError::WriteFailure {
            replica: self.id.clone(),
            stage,
            reason: err.to_string(),
        }
    }
}

impl ReplicaStore for FileReplica {
    fn id(&self) -> &ReplicaId {
        &self.id
    }

    fn load(&self) -> StoreResult<ReplicaContents> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(decode_blocks(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ReplicaContents::Absent),
            Err(e) => Err(e.into()),
        }
    }

    fn write_replica(&self, blocks: &[Block]) -> StoreResult<()> {
        let bytes = encode_blocks(blocks)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.write_failure("create directory", e))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_REPLICA_FILE.to_string());

        // The temporary file is deleted when dropped, so every early return
        // below cleans up after itself.
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| self.write_failure("temporary write", e))?;
        tmp.write_all(&bytes)
            .map_err(|e| self.write_failure("temporary write", e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| self.write_failure("temporary write", e))?;

        tmp.persist(&self.path)
            .map_err(|e| self.write_failure("atomic rename", e.error))?;

        debug!(replica = %self.id, blocks = blocks.len(), path = %self.path.display(), "replica written");
        Ok(())
    }
}

impl std::fmt::Debug for FileReplica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReplica")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

/// Open `count` file replicas `N1..=N{count}` under `root`.
pub fn open_file_replicas(root: &Path, count: usize, file_name: &str) -> Vec<Arc<dyn ReplicaStore>> {
    (1..=count)
        .map(|n| Arc::new(FileReplica::in_root(root, n, file_name)) as Arc<dyn ReplicaStore>)
        .collect()
}
