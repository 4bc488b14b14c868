use crate::error::{FixityError, Result};
use crate::index::hasher::{digest_file, digests_match, Algorithm};
use crate::index::tree::name_matches;
use crate::store::{Record, RecordStore, Status};
use chrono::{DateTime, Utc};
use globset::GlobMatcher;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of comparing one tracked file against its record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub path: PathBuf,
    pub algorithm: Algorithm,
    pub previous_status: Status,
    pub new_status: Status,
    pub previous_digest: String,
    pub current_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_delta: Option<i64>,
    pub error: Option<String>,
}

impl Verdict {
    /// Verdict restating a record's stored status without touching the file.
    pub fn from_stored(record: &Record) -> Self {
        Self {
            path: record.path.clone(),
            algorithm: record.algorithm,
            previous_status: record.status,
            new_status: record.status,
            previous_digest: record.digest.clone(),
            current_digest: None,
            size_delta: None,
            error: None,
        }
    }

    pub fn is_violation(&self) -> bool {
        self.new_status.is_violation()
    }

    pub fn message(&self) -> String {
        match &self.error {
            Some(cause) => format!("{}: {}", self.new_status.describe(), cause),
            None => self.new_status.describe().to_string(),
        }
    }
}

/// A verdict together with the record it should be persisted as.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub record: Record,
}

/// Options for scanning the tracked files under a directory
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub recursive: bool,
    pub pattern: Option<GlobMatcher>,
    pub workers: usize,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            pattern: None,
            workers: 1,
            cancel: None,
        }
    }
}

impl ScanOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

/// Result of evaluating a batch of records.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub evaluations: Vec<Evaluation>,
    /// Records selected but never evaluated because the scan was cancelled.
    pub skipped: usize,
}

impl ScanOutcome {
    pub fn cancelled(&self) -> bool {
        self.skipped > 0
    }

    pub fn verdicts(&self) -> Vec<Verdict> {
        self.evaluations.iter().map(|e| e.verdict.clone()).collect()
    }
}

pub type ProgressCallback<'a> = &'a (dyn Fn(&Verdict) + Sync);

/// Re-examines the file behind `record` and classifies it.
///
/// Digest equality always yields `Unchanged`. The baseline digest, size and
/// mtime are never overwritten here; only status and check time move.
pub fn evaluate(record: &Record, checked_at: DateTime<Utc>) -> Evaluation {
    let (new_status, current_digest, size_delta, error) = match fs::metadata(&record.path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Status::Missing, None, None, None),
        Err(e) => (
            Status::Error,
            None,
            None,
            Some(FixityError::from_io(&record.path, e).to_string()),
        ),
        Ok(metadata) if metadata.is_dir() => (
            Status::Error,
            None,
            None,
            Some("path is now a directory".to_string()),
        ),
        Ok(metadata) => match digest_file(&record.path, record.algorithm) {
            Ok(digest) if digests_match(&digest, &record.digest) => {
                (Status::Unchanged, Some(digest), None, None)
            }
            Ok(digest) => {
                let delta = metadata.len() as i64 - record.size as i64;
                (Status::Modified, Some(digest), Some(delta), None)
            }
            // Removed between stat and read.
            Err(FixityError::PathNotFound(_)) => (Status::Missing, None, None, None),
            Err(e) => (Status::Error, None, None, Some(e.to_string())),
        },
    };

    match new_status {
        Status::Modified => log::warn!("INTEGRITY VIOLATION: {}", record.path.display()),
        Status::Missing => log::warn!("Tracked file missing: {}", record.path.display()),
        Status::Error => log::error!(
            "Check failed for {}: {}",
            record.path.display(),
            error.as_deref().unwrap_or("unknown error")
        ),
        Status::New | Status::Unchanged => {}
    }

    let verdict = Verdict {
        path: record.path.clone(),
        algorithm: record.algorithm,
        previous_status: record.status,
        new_status,
        previous_digest: record.digest.clone(),
        current_digest,
        size_delta,
        error,
    };

    let mut updated = record.clone();
    updated.status = new_status;
    updated.last_checked_at = checked_at;

    Evaluation {
        verdict,
        record: updated,
    }
}

/// Checks one tracked path and writes the updated record back into `store`.
///
/// An untracked path is `NotTracked` and leaves the store untouched.
pub fn check(store: &mut RecordStore, path: &Path) -> Result<Verdict> {
    let record = store
        .get(path)
        .ok_or_else(|| FixityError::NotTracked(path.to_path_buf()))?;

    let evaluation = evaluate(record, Utc::now());
    store.upsert(evaluation.record);
    Ok(evaluation.verdict)
}

/// Tracked records under `root`, ordered by the byte order of their path.
///
/// Non-recursive selection keeps only direct children of `root`. A tracked
/// file passed as `root` selects itself.
pub fn select_tracked(store: &RecordStore, root: &Path, options: &ScanOptions) -> Vec<Record> {
    let mut selected: Vec<Record> = store
        .all()
        .iter()
        .filter(|r| {
            let under_root = if r.path == root {
                true
            } else if options.recursive {
                r.path.starts_with(root)
            } else {
                r.path.parent() == Some(root)
            };
            under_root && name_matches(&r.path, options.pattern.as_ref())
        })
        .cloned()
        .collect();

    selected.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
    selected
}

/// Evaluates `records` on a bounded worker pool, preserving input order.
///
/// Cancellation is observed before each file; files already being hashed
/// finish, the rest are counted as skipped.
pub fn evaluate_all(
    records: &[Record],
    options: &ScanOptions,
    progress: Option<ProgressCallback<'_>>,
) -> Result<ScanOutcome> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()?;
    let checked_at = Utc::now();

    let results: Vec<Option<Evaluation>> = pool.install(|| {
        records
            .par_iter()
            .map(|record| {
                if options.is_cancelled() {
                    return None;
                }
                let evaluation = evaluate(record, checked_at);
                if let Some(callback) = progress {
                    callback(&evaluation.verdict);
                }
                Some(evaluation)
            })
            .collect()
    });

    let total = results.len();
    let evaluations: Vec<Evaluation> = results.into_iter().flatten().collect();
    let skipped = total - evaluations.len();

    if skipped > 0 {
        log::warn!("Scan cancelled: {} of {} files not checked", skipped, total);
    }

    Ok(ScanOutcome {
        evaluations,
        skipped,
    })
}

/// Writes every evaluated record back into `store` as one batch.
pub fn apply(store: &mut RecordStore, outcome: &ScanOutcome) {
    for evaluation in &outcome.evaluations {
        store.upsert(evaluation.record.clone());
    }
}
