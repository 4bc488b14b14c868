pub mod export;

use crate::index::scanner::Verdict;
use crate::store::{RecordStore, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use export::{default_file_name, render, write_report, ExportFormat};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub new: usize,
    pub unchanged: usize,
    pub modified: usize,
    pub missing: usize,
    pub error: usize,
}

impl Counts {
    pub fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::New => self.new += 1,
            Status::Unchanged => self.unchanged += 1,
            Status::Modified => self.modified += 1,
            Status::Missing => self.missing += 1,
            Status::Error => self.error += 1,
        }
    }

    pub fn violations(&self) -> usize {
        self.modified + self.missing + self.error
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.new + self.unchanged + self.modified + self.missing + self.error
    }
}

/// Aggregate of a set of verdicts, in the order they were produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub counts: Counts,
    pub entries: Vec<Verdict>,
}

impl Report {
    pub fn build(verdicts: Vec<Verdict>) -> Self {
        Self::build_at(verdicts, Utc::now())
    }

    /// Same verdicts in the same order at the same instant always give an
    /// identical report.
    pub fn build_at(verdicts: Vec<Verdict>, generated_at: DateTime<Utc>) -> Self {
        let mut counts = Counts::default();
        for verdict in &verdicts {
            counts.record(verdict.new_status);
        }

        Self {
            generated_at,
            counts,
            entries: verdicts,
        }
    }

    /// Report of the statuses recorded by the last checks, in store order.
    pub fn from_store(store: &RecordStore) -> Self {
        Self::build(store.all().iter().map(Verdict::from_stored).collect())
    }

    pub fn has_violations(&self) -> bool {
        self.counts.violations() > 0
    }

    pub fn violations(&self) -> impl Iterator<Item = &Verdict> {
        self.entries.iter().filter(|v| v.is_violation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::hasher::Algorithm;
    use proptest::prelude::*;
    use std::path::PathBuf;

    pub(crate) fn verdict(path: &str, previous: Status, new: Status) -> Verdict {
        Verdict {
            path: PathBuf::from(path),
            algorithm: Algorithm::Sha256,
            previous_status: previous,
            new_status: new,
            previous_digest: "d1".to_string(),
            current_digest: match new {
                Status::Modified => Some("d2".to_string()),
                Status::Unchanged => Some("d1".to_string()),
                _ => None,
            },
            size_delta: None,
            error: None,
        }
    }

    fn any_status() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::New),
            Just(Status::Unchanged),
            Just(Status::Modified),
            Just(Status::Missing),
            Just(Status::Error),
        ]
    }

    #[test]
    fn test_single_modified_scenario() {
        let report = Report::build(vec![verdict("/etc/passwd", Status::Unchanged, Status::Modified)]);
        assert_eq!(report.counts.total, 1);
        assert_eq!(report.counts.modified, 1);
        assert!(report.has_violations());
        assert_eq!(report.violations().count(), 1);
    }

    #[test]
    fn test_empty_report() {
        let report = Report::build(Vec::new());
        assert_eq!(report.counts, Counts::default());
        assert!(!report.has_violations());
    }

    #[test]
    fn test_build_is_deterministic() {
        let at = Utc::now();
        let verdicts = vec![
            verdict("/a", Status::New, Status::Unchanged),
            verdict("/b", Status::Unchanged, Status::Missing),
        ];
        let first = serde_json::to_string(&Report::build_at(verdicts.clone(), at)).unwrap();
        let second = serde_json::to_string(&Report::build_at(verdicts, at)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_store_uses_stored_status() {
        let mut store = RecordStore::new();
        let mut record = crate::store::Record {
            path: PathBuf::from("/etc/hosts"),
            algorithm: Algorithm::Md5,
            digest: "abc".to_string(),
            size: 3,
            modified_at: None,
            added_at: Utc::now(),
            last_checked_at: Utc::now(),
            status: Status::Missing,
        };
        store.upsert(record.clone());
        record.path = PathBuf::from("/etc/passwd");
        record.status = Status::New;
        store.upsert(record);

        let report = Report::from_store(&store);
        assert_eq!(report.counts.missing, 1);
        assert_eq!(report.counts.new, 1);
        assert_eq!(report.entries[0].previous_status, Status::Missing);
        assert_eq!(report.entries[1].path, PathBuf::from("/etc/passwd"));
    }

    proptest! {
        #[test]
        fn prop_counts_always_sum_to_total(statuses in prop::collection::vec(any_status(), 0..64)) {
            let verdicts: Vec<_> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| verdict(&format!("/f{}", i), Status::Unchanged, *s))
                .collect();
            let report = Report::build(verdicts);

            prop_assert!(report.counts.is_consistent());
            prop_assert_eq!(report.counts.total, statuses.len());
            prop_assert_eq!(
                report.counts.violations(),
                statuses.iter().filter(|s| s.is_violation()).count()
            );
        }
    }
}
