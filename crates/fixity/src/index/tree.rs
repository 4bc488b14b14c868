use crate::error::{FixityError, Result};
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compiles an optional file-name glob such as `*.conf`.
pub fn compile_pattern(pattern: Option<&str>) -> Result<Option<GlobMatcher>> {
    match pattern {
        None | Some("") | Some("*") => Ok(None),
        Some(p) => Ok(Some(Glob::new(p)?.compile_matcher())),
    }
}

/// True when `path`'s file name satisfies `matcher` (or no matcher is set).
pub fn name_matches(path: &Path, matcher: Option<&GlobMatcher>) -> bool {
    match matcher {
        None => true,
        Some(m) => path.file_name().map(|n| m.is_match(n)).unwrap_or(false),
    }
}

/// Lists the regular files under `root` in sorted order.
///
/// Only direct children are listed unless `recursive` is set. Symlinks are
/// neither followed nor listed. Unreadable entries are logged and skipped.
pub fn list_files(root: &Path, recursive: bool, matcher: Option<&GlobMatcher>) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(FixityError::PathNotFound(root.to_path_buf()));
    }

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1);

    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && name_matches(entry.path(), matcher) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                log::warn!("Walk error under {}: {}", root.display(), e);
            }
        }
    }

    Ok(files)
}
