use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixityError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Unsupported algorithm '{0}'. Use one of: md5, sha1, sha224, sha256, sha384, sha512")]
    UnsupportedAlgorithm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record store {path} is corrupted: {reason}")]
    StoreCorrupted { path: PathBuf, reason: String },

    #[error("Record store {path} is busy: writer lock not acquired within {waited:?}")]
    StoreBusy { path: PathBuf, waited: Duration },

    #[error("Path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Path is not tracked: {0}")]
    NotTracked(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported export format '{0}'. Use 'json' or 'html'")]
    UnsupportedFormat(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl FixityError {
    /// Busy stores are the only failure a caller should retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FixityError::StoreBusy { .. })
    }

    /// Classifies an error raised while opening or reading `path`.
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FixityError::PathNotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                FixityError::PermissionDenied(path.to_path_buf())
            }
            _ => FixityError::Io(err),
        }
    }
}

impl From<globset::Error> for FixityError {
    fn from(err: globset::Error) -> Self {
        FixityError::Config(format!("Invalid pattern: {}", err))
    }
}

impl From<rayon::ThreadPoolBuildError> for FixityError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        FixityError::Config(format!("Failed to build worker pool: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, FixityError>;
