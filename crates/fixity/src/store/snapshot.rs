use super::{Record, RecordStore, StoreLock};
use crate::error::{FixityError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    records: &'a [Record],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotOwned {
    version: u32,
    records: Vec<Record>,
}

/// Durable location of a record store snapshot.
///
/// The snapshot is always replaced as a whole: `save` writes a temporary file
/// next to the target and renames it over the previous snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Takes the single-writer lock for this snapshot.
    pub fn lock(&self, timeout: Duration) -> Result<StoreLock> {
        StoreLock::acquire(&self.lock_path(), timeout)
    }

    /// Reads the current snapshot. A snapshot that does not exist yet is an
    /// empty store; anything unparseable is `StoreCorrupted`.
    pub fn load(&self) -> Result<RecordStore> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No snapshot at {}, starting empty", self.path.display());
                return Ok(RecordStore::new());
            }
            Err(e) => return Err(FixityError::from_io(&self.path, e)),
        };

        let snapshot: SnapshotOwned =
            serde_json::from_str(&contents).map_err(|e| self.corrupted(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(self.corrupted(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        if let Some(bad) = snapshot.records.iter().find(|r| !r.has_valid_digest()) {
            return Err(self.corrupted(format!(
                "{} digest for {} is not {} hex characters",
                bad.algorithm,
                bad.path.display(),
                bad.algorithm.hex_len()
            )));
        }

        RecordStore::from_records(snapshot.records)
            .map_err(|dup| self.corrupted(format!("duplicate record for {}", dup.display())))
    }

    /// Atomically replaces the snapshot with `store`.
    pub fn save(&self, store: &RecordStore) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            records: store.all(),
        };

        let mut temp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut temp, &snapshot)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| FixityError::Io(e.error))?;

        log::info!(
            "Saved {} records to {}",
            store.len(),
            self.path.display()
        );
        Ok(())
    }

    fn corrupted(&self, reason: String) -> FixityError {
        FixityError::StoreCorrupted {
            path: self.path.clone(),
            reason,
        }
    }
}
