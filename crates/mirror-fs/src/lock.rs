//! Advisory lock files guarding a mirror against concurrent runs

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;

use crate::io::lock_with_retry;
use crate::{Error, Result};

/// An exclusive advisory lock held for as long as the value lives.
///
/// The lock is taken on a dedicated lock file rather than on the mirror
/// itself, so the lock file never shows up in a walk of the mirror.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    /// Acquire the lock at `path`, retrying until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns `LockFailed` if another holder keeps the lock past the timeout.
    pub fn acquire(path: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let path = path.into();
        let file = open_lock_file(&path)?;
        lock_with_retry(&file, &path, timeout)?;
        tracing::debug!(path = %path.display(), "Acquired mirror lock");
        Ok(Self { file, path })
    }

    /// Acquire the lock without waiting.
    ///
    /// Returns `Ok(None)` when the lock is currently held elsewhere.
    pub fn try_acquire(path: impl Into<PathBuf>) -> Result<Option<Self>> {
        let path = path.into();
        let file = open_lock_file(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(_) => Ok(None),
        }
    }

    /// Path of the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if FileExt::unlock(&self.file).is_err() {
            tracing::warn!(path = %self.path.display(), "Failed to release mirror lock");
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_holder_is_refused_until_release() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("locks").join("movies.lock");

        let first = DirLock::acquire(&path, Duration::from_millis(100)).unwrap();
        assert!(DirLock::try_acquire(&path).unwrap().is_none());

        drop(first);
        assert!(DirLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn acquire_times_out_when_held() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("held.lock");

        let _held = DirLock::acquire(&path, Duration::from_millis(100)).unwrap();
        let result = DirLock::acquire(&path, Duration::from_millis(200));

        assert!(matches!(result, Err(Error::LockFailed { .. })));
    }
}
