//! core::ops::lock
//!
//! Exclusive per-worktree lock held for the whole of an lgit invocation.
//!
//! The replay session is shared mutable state between invocations. Each
//! invocation checks for a session and then acts on it; holding this lock
//! from before the check until exit means no other lgit process can slip
//! in between. Acquisition is non-blocking: a second process fails fast
//! with [`LockError::AlreadyLocked`].
//!
//! # Storage
//!
//! - `<git_dir>/logical/lock` - Lock file with an OS-level exclusive lock
//!
//! # Example
//!
//! ```ignore
//! use logicalgit::core::ops::lock::RepoLock;
//!
//! let lock = RepoLock::acquire(&paths)?;
//! // ... replay ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::LogicalPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("another lgit process is already running in this repository")]
    AlreadyLocked,

    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// RAII guard over the invocation lock. Released on drop.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
}

impl RepoLock {
    /// Acquire the lock, creating `<git_dir>/logical` if needed.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be taken
    pub fn acquire(paths: &LogicalPaths) -> Result<Self, LockError> {
        let dir = paths.worktree_dir();
        fs::create_dir_all(&dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
        })?;

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
            Ok(()) => {
                tracing::debug!(path = %path.display(), "acquired invocation lock");
                Ok(Self { file })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release invocation lock");
        }
    }
}
