pub mod lock;
pub mod snapshot;

use crate::error::{FixityError, Result};
use crate::index::hasher::{digest_file, Algorithm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub use lock::StoreLock;
pub use snapshot::SnapshotFile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Unchanged,
    Modified,
    Missing,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::Unchanged => "unchanged",
            Status::Modified => "modified",
            Status::Missing => "missing",
            Status::Error => "error",
        }
    }

    /// Modified, missing and unreadable files are integrity violations.
    pub fn is_violation(&self) -> bool {
        matches!(self, Status::Modified | Status::Missing | Status::Error)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Status::New => "Baseline recorded, not yet verified",
            Status::Unchanged => "File integrity verified",
            Status::Modified => "File has been modified",
            Status::Missing => "File is missing",
            Status::Error => "Could not calculate current digest",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-known state of one tracked path.
///
/// `digest`, `size` and `modified_at` form the baseline captured at add time.
/// Only `digest` is trusted; size and mtime are kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub path: PathBuf,
    pub algorithm: Algorithm,
    pub digest: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
    pub last_checked_at: DateTime<Utc>,
    pub status: Status,
}

impl Record {
    /// Hashes `path` and captures a fresh baseline with status `New`.
    pub fn capture(path: &Path, algorithm: Algorithm) -> Result<Self> {
        // Snapshots key records by UTF-8 path strings.
        if path.to_str().is_none() {
            return Err(FixityError::InvalidPath(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| FixityError::from_io(path, e))?;
        if metadata.is_dir() {
            return Err(FixityError::Config(format!(
                "{} is a directory; add its files instead",
                path.display()
            )));
        }

        let digest = digest_file(path, algorithm)?;
        let now = Utc::now();

        Ok(Self {
            path: path.to_path_buf(),
            algorithm,
            digest,
            size: metadata.len(),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            added_at: now,
            last_checked_at: now,
            status: Status::New,
        })
    }

    /// The stored digest is hex of the length its algorithm produces.
    pub fn has_valid_digest(&self) -> bool {
        self.digest.len() == self.algorithm.hex_len()
            && self.digest.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

/// Ordered mapping from tracked path to its record.
///
/// Iteration follows insertion order; replacing a record keeps its slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<Record>,
    index: HashMap<PathBuf, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from snapshot order, rejecting duplicate paths.
    pub fn from_records(records: Vec<Record>) -> std::result::Result<Self, PathBuf> {
        let mut store = Self::new();
        for record in records {
            if store.index.contains_key(&record.path) {
                return Err(record.path);
            }
            store.upsert(record);
        }
        Ok(store)
    }

    /// Tracks `path`, replacing any existing record with a fresh `New` baseline.
    ///
    /// Nothing is mutated when the file cannot be hashed.
    pub fn add(&mut self, path: &Path, algorithm: Algorithm) -> Result<&Record> {
        let record = Record::capture(path, algorithm)?;
        let replaced = self.index.contains_key(path);
        self.upsert(record);

        if replaced {
            log::info!("Re-baselined {} ({})", path.display(), algorithm);
        } else {
            log::info!("Added file to monitoring: {} ({})", path.display(), algorithm);
        }

        self.get(path)
            .ok_or_else(|| FixityError::NotTracked(path.to_path_buf()))
    }

    pub fn get(&self, path: &Path) -> Option<&Record> {
        self.index.get(path).map(|&i| &self.records[i])
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Records in insertion order.
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts a new record at the end or replaces an existing one in place.
    pub fn upsert(&mut self, record: Record) {
        match self.index.get(&record.path) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.path.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Stops tracking `path`, returning its last record.
    pub fn remove(&mut self, path: &Path) -> Option<Record> {
        let i = self.index.remove(path)?;
        let record = self.records.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        log::info!("Removed file from monitoring: {}", path.display());
        Some(record)
    }
}
