// Cross-process run lock.
// A lock file in the git directory keeps two processes from publishing at once.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{Result, SyncError};

/// Locks older than this are assumed to belong to a crashed run.
pub const STALE_AFTER: Duration = Duration::from_secs(2 * 60 * 60);

const LOCK_FILE: &str = "cache-sync.lock";

/// Held for the duration of one pipeline run; released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Take the lock in `dir`, failing with `SyncError::Locked` if held.
    pub fn acquire(dir: &Path) -> Result<Self> {
        Self::acquire_with(dir, STALE_AFTER)
    }

    pub fn acquire_with(dir: &Path, stale_after: Duration) -> Result<Self> {
        let path = dir.join(LOCK_FILE);

        match Self::create(&path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if Self::is_stale(&path, stale_after) {
                    tracing::warn!(path = %path.display(), "Taking over stale run lock");
                    fs::remove_file(&path)?;
                    Self::create(&path).map_err(|e| match e.kind() {
                        ErrorKind::AlreadyExists => {
                            SyncError::Locked(path.display().to_string())
                        }
                        _ => SyncError::Io(e),
                    })
                } else {
                    Err(SyncError::Locked(path.display().to_string()))
                }
            }
            Err(e) => Err(SyncError::Io(e)),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "{}", std::process::id())?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn is_stale(path: &Path, stale_after: Duration) -> bool {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > stale_after)
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
