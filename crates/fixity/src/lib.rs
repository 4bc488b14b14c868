pub mod config;
pub mod error;
pub mod index;
pub mod monitor;
pub mod report;
pub mod store;
pub mod util;

pub use config::{Config, RunOptions, Settings};
pub use error::{FixityError, Result};
pub use index::{
    check, compile_pattern, digest_file, digest_reader, evaluate, evaluate_all, list_files,
    select_tracked, Algorithm, ScanOptions, ScanOutcome, Verdict,
};
pub use monitor::{AddSummary, Monitor};
pub use report::{Counts, ExportFormat, Report};
pub use store::{Record, RecordStore, SnapshotFile, Status, StoreLock};
