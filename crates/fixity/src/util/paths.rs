use crate::error::Result;
use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute against the working directory and folds `.` and
/// `..` components lexically.
///
/// Symlinks are not resolved: a tracked symlink stays keyed by its own path.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    Ok(normalized)
}
