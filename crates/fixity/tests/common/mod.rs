#![allow(dead_code)]

use fixity_lib::{Monitor, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Scratch directory with a store inside it and a tree of files to track.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub store_path: PathBuf,
    pub monitor: Monitor,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let store_path = temp_dir.path().join("state/store.json");
        let monitor = monitor_for(&store_path);

        Ok(Self {
            temp_dir,
            store_path,
            monitor,
        })
    }

    /// Another engine over the same store, as a second process would see it.
    pub fn second_monitor(&self) -> Monitor {
        monitor_for(&self.store_path)
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join("data").join(relative)
    }

    pub fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.path(relative);
        write_file(&path, content);
        path
    }
}

pub fn monitor_for(store_path: &Path) -> Monitor {
    Monitor::new(store_path)
        .lock_timeout(Duration::from_secs(10))
        .workers(4)
}

pub fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn setup_test_fixture() -> Result<TestFixture> {
    TestFixture::new()
}
