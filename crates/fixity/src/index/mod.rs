pub mod hasher;
pub mod scanner;
pub mod tree;

pub use hasher::{digest_file, digest_reader, Algorithm};
pub use scanner::{check, evaluate, evaluate_all, select_tracked, ScanOptions, ScanOutcome, Verdict};
pub use tree::{compile_pattern, list_files};
