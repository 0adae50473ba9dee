//! core::paths
//!
//! Centralized path routing for lgit storage locations.
//!
//! A replay session belongs to one worktree (HEAD is per-worktree), so
//! the session and the lock live under `git_dir`. Configuration is shared
//! by every worktree of a repository and lives under `common_dir`.
//!
//! # Storage Layout
//!
//! - `<git_dir>/logical/replay/session.json` - In-progress replay session
//! - `<git_dir>/logical/lock` - Exclusive invocation lock
//! - `<common_dir>/logical/config.toml` - Repository configuration
//!
//! # Example
//!
//! ```
//! use logicalgit::core::paths::LogicalPaths;
//! use std::path::PathBuf;
//!
//! let paths = LogicalPaths::new(
//!     PathBuf::from("/repo/.git"),
//!     PathBuf::from("/repo/.git"),
//! );
//!
//! assert_eq!(
//!     paths.session_path(),
//!     PathBuf::from("/repo/.git/logical/replay/session.json")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::git::RepoInfo;

/// Name of the directory lgit owns inside a git control directory.
const LOGICAL_DIR: &str = "logical";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalPaths {
    /// Per-worktree git directory. Equals `common_dir` outside linked worktrees.
    pub git_dir: PathBuf,
    /// Shared git directory (refs, objects, config).
    pub common_dir: PathBuf,
}

impl LogicalPaths {
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self::new(info.git_dir.clone(), info.common_dir.clone())
    }

    /// `<git_dir>/logical`
    pub fn worktree_dir(&self) -> PathBuf {
        self.git_dir.join(LOGICAL_DIR)
    }

    /// Directory holding the replay session.
    pub fn replay_dir(&self) -> PathBuf {
        self.worktree_dir().join("replay")
    }

    pub fn session_path(&self) -> PathBuf {
        self.replay_dir().join("session.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.worktree_dir().join("lock")
    }

    pub fn repo_config_path(&self) -> PathBuf {
        self.common_dir.join(LOGICAL_DIR).join("config.toml")
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}
