//! core::lock
//!
//! Advisory repository lock for mutating commands.
//!
//! # Architecture
//!
//! The repo lock ensures only one depot process mutates a repository at a
//! time. Ledger writes are plain read-then-write cycles, so two concurrent
//! pipelines could otherwise interleave and lose updates.
//!
//! # Invariants
//!
//! - Lock must be held for an entire pipeline execution
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//! - Dry-run commands never acquire the lock (it would create a file)

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::RepoPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("repository is locked by another depot process")]
    AlreadyLocked,

    /// Failed to create or open the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on the repository.
///
/// The lock is automatically released when this guard is dropped, so it is
/// always released even if the holding command panics.
#[derive(Debug)]
pub struct RepoLock {
    /// Path to the lock file.
    path: PathBuf,
    /// The open file handle with the lock held.
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl RepoLock {
    /// Attempt to acquire the repository lock.
    ///
    /// Uses OS-level file locking via `fs2`, which works across processes.
    /// Non-blocking: if another process holds the lock this returns
    /// [`LockError::AlreadyLocked`] immediately.
    pub fn acquire(paths: &RepoPaths) -> Result<Self, LockError> {
        let path = paths.lock_path();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Try to acquire the lock, returning None if already held.
    pub fn try_acquire(paths: &RepoPaths) -> Result<Option<Self>, LockError> {
        match Self::acquire(paths) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::AlreadyLocked) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly.
    ///
    /// Called automatically on drop; use this only to release early.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        // Best-effort release on drop - ignore errors since we're dropping
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths(dir: &Path) -> RepoPaths {
        RepoPaths::new(dir.to_path_buf())
    }

    #[test]
    fn lock_acquire_succeeds() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let lock = RepoLock::acquire(&paths).expect("acquire lock");
        assert!(lock.is_held());
        assert!(lock.path().exists());
    }

    #[test]
    fn lock_prevents_second_acquire() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let lock1 = RepoLock::acquire(&paths).expect("first acquire");
        assert!(lock1.is_held());

        let result = RepoLock::acquire(&paths);
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        {
            let lock = RepoLock::acquire(&paths).expect("first acquire");
            assert!(lock.is_held());
            // lock dropped here
        }

        let lock2 = RepoLock::acquire(&paths).expect("second acquire");
        assert!(lock2.is_held());
    }

    #[test]
    fn lock_released_explicitly() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let mut lock = RepoLock::acquire(&paths).expect("acquire");
        lock.release().expect("release");
        assert!(!lock.is_held());

        let lock2 = RepoLock::acquire(&paths).expect("reacquire");
        assert!(lock2.is_held());
    }

    #[test]
    fn try_acquire_returns_none_when_locked() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let _lock1 = RepoLock::acquire(&paths).expect("first acquire");

        let result = RepoLock::try_acquire(&paths).expect("try_acquire");
        assert!(result.is_none());
    }

    #[test]
    fn multiple_release_calls_are_safe() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let mut lock = RepoLock::acquire(&paths).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release should be ok");
        assert!(!lock.is_held());
    }
}
