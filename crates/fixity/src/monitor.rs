use crate::config::Settings;
use crate::error::{FixityError, Result};
use crate::index::hasher::Algorithm;
use crate::index::scanner::{self, ProgressCallback, ScanOptions, ScanOutcome, Verdict};
use crate::index::tree::{compile_pattern, list_files};
use crate::report::Report;
use crate::store::{Record, RecordStore, SnapshotFile};
use crate::util::normalize_path;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Files registered by a directory add, plus the ones that could not be read.
#[derive(Debug, Default)]
pub struct AddSummary {
    pub added: Vec<Record>,
    pub failed: Vec<(PathBuf, FixityError)>,
}

/// Engine operations against one record store location.
///
/// Every mutating operation runs load -> mutate -> atomic save while holding
/// the store's writer lock, and saves at most once. Readers load without the
/// lock and may see a snapshot that is superseded right after.
#[derive(Debug, Clone)]
pub struct Monitor {
    snapshot: SnapshotFile,
    lock_timeout: Duration,
    workers: usize,
}

impl Monitor {
    pub fn new<P: AsRef<Path>>(store_path: P) -> Self {
        Self::with_settings(store_path, &Settings::default())
    }

    pub fn with_settings<P: AsRef<Path>>(store_path: P, settings: &Settings) -> Self {
        Self {
            snapshot: SnapshotFile::new(store_path),
            lock_timeout: settings.lock_timeout(),
            workers: settings.workers.max(1),
        }
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn snapshot(&self) -> &SnapshotFile {
        &self.snapshot
    }

    /// Reads the current store without taking the writer lock.
    pub fn load(&self) -> Result<RecordStore> {
        self.snapshot.load()
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut RecordStore) -> Result<(T, bool)>) -> Result<T> {
        let _lock = self.snapshot.lock(self.lock_timeout)?;
        let mut store = self.snapshot.load()?;
        let (value, dirty) = f(&mut store)?;
        if dirty {
            self.snapshot.save(&store)?;
        }
        Ok(value)
    }

    /// Tracks a single file, replacing any previous baseline.
    pub fn add(&self, path: &Path, algorithm: Algorithm) -> Result<Record> {
        let path = normalize_path(path)?;
        self.mutate(|store| {
            let record = store.add(&path, algorithm)?.clone();
            Ok((record, true))
        })
    }

    /// Tracks the regular files currently under `root`.
    ///
    /// Unreadable files are reported in the summary and skipped; the rest are
    /// committed together in one save.
    pub fn add_tree(
        &self,
        root: &Path,
        algorithm: Algorithm,
        recursive: bool,
        pattern: Option<&str>,
    ) -> Result<AddSummary> {
        let root = normalize_path(root)?;
        let matcher = compile_pattern(pattern)?;

        self.mutate(|store| {
            let mut summary = AddSummary::default();
            for path in list_files(&root, recursive, matcher.as_ref())? {
                match store.add(&path, algorithm) {
                    Ok(record) => summary.added.push(record.clone()),
                    Err(e) => {
                        log::warn!("Skipping {}: {}", path.display(), e);
                        summary.failed.push((path, e));
                    }
                }
            }
            let dirty = !summary.added.is_empty();
            Ok((summary, dirty))
        })
    }

    /// Verifies one tracked file and records the outcome.
    pub fn check(&self, path: &Path) -> Result<Verdict> {
        let path = normalize_path(path)?;
        self.mutate(|store| {
            let verdict = scanner::check(store, &path)?;
            Ok((verdict, true))
        })
    }

    /// Verifies the tracked files under `root`, in path order.
    ///
    /// Never adds files. Verdicts computed before a cancellation are still
    /// committed, in the same single save.
    pub fn scan(
        &self,
        root: &Path,
        options: &ScanOptions,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ScanOutcome> {
        let root = normalize_path(root)?;
        let options = ScanOptions {
            workers: self.workers,
            ..options.clone()
        };

        self.mutate(|store| {
            let selected = scanner::select_tracked(store, &root, &options);
            let outcome = scanner::evaluate_all(&selected, &options, progress)?;
            scanner::apply(store, &outcome);
            let dirty = !outcome.evaluations.is_empty();
            Ok((outcome, dirty))
        })
    }

    /// Verifies every tracked file, in store order.
    pub fn scan_all(
        &self,
        options: &ScanOptions,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ScanOutcome> {
        let options = ScanOptions {
            workers: self.workers,
            ..options.clone()
        };

        self.mutate(|store| {
            let records = store.all().to_vec();
            let outcome = scanner::evaluate_all(&records, &options, progress)?;
            scanner::apply(store, &outcome);
            let dirty = !outcome.evaluations.is_empty();
            Ok((outcome, dirty))
        })
    }

    /// Summarises the statuses stored by previous checks. Read-only.
    pub fn report(&self) -> Result<Report> {
        Ok(Report::from_store(&self.load()?))
    }

    /// Re-verifies every tracked file, then reports those verdicts.
    pub fn refreshed_report(
        &self,
        options: &ScanOptions,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<Report> {
        let outcome = self.scan_all(options, progress)?;
        if outcome.cancelled() {
            return Err(FixityError::Cancelled);
        }
        Ok(Report::build(outcome.verdicts()))
    }

    /// Stops tracking `path`.
    pub fn remove(&self, path: &Path) -> Result<Record> {
        let path = normalize_path(path)?;
        self.mutate(|store| {
            let record = store
                .remove(&path)
                .ok_or_else(|| FixityError::NotTracked(path.clone()))?;
            Ok((record, true))
        })
    }
}
