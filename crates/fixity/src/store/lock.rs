use crate::error::{FixityError, Result};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive advisory lock guarding load -> mutate -> save of a store.
///
/// Held for as long as the value lives; dropping it releases the lock.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Waits up to `timeout` for the lock, then fails with `StoreBusy`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| FixityError::from_io(path, e))?;

        let started = Instant::now();
        loop {
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
            if rc == 0 {
                log::debug!("Acquired store lock {}", path.display());
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            let err = std::io::Error::last_os_error();
            match err.raw_os_error() {
                Some(code) if code == libc::EWOULDBLOCK || code == libc::EINTR => {}
                _ => return Err(FixityError::Io(err)),
            }

            let waited = started.elapsed();
            if waited >= timeout {
                log::warn!(
                    "Gave up waiting for store lock {} after {:?}",
                    path.display(),
                    waited
                );
                return Err(FixityError::StoreBusy {
                    path: path.to_path_buf(),
                    waited,
                });
            }

            thread::sleep(POLL_INTERVAL.min(timeout - waited));
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
        log::debug!("Released store lock {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_writer_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("store.json.lock");

        let _held = StoreLock::acquire(&lock_path, Duration::from_secs(1)).unwrap();
        let started = Instant::now();
        let result = StoreLock::acquire(&lock_path, Duration::from_millis(120));

        assert!(matches!(result, Err(FixityError::StoreBusy { .. })));
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("store.json.lock");

        {
            let held = StoreLock::acquire(&lock_path, Duration::from_secs(1)).unwrap();
            assert_eq!(held.path(), lock_path.as_path());
        }

        StoreLock::acquire(&lock_path, Duration::ZERO).unwrap();
    }

    #[test]
    fn test_waiting_writer_gets_lock_after_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("store.json.lock");

        let held = StoreLock::acquire(&lock_path, Duration::from_secs(1)).unwrap();
        let waiter_path = lock_path.clone();
        let waiter = thread::spawn(move || StoreLock::acquire(&waiter_path, Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(150));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
    }
}
