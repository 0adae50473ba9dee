//! core::ops::session
//!
//! The persisted replay session and its store.
//!
//! `--continue`, `--skip` and `--abort` run as brand-new processes, so the
//! session file is the only record that a replay is in flight. Nothing the
//! orchestrator keeps in memory survives between invocations.
//!
//! # Storage
//!
//! - `<git_dir>/logical/replay/session.json` - pretty-printed JSON, meant to
//!   be readable when debugging a stuck replay
//!
//! # Crash Safety Contract
//!
//! [`SessionStore::save`] writes a temporary file next to the session,
//! fsyncs it and renames it into place. A crash leaves either the previous
//! session or the new one on disk, never a torn write.
//!
//! # Invariants
//!
//! - `pending` is never empty in a stored session
//! - `original_head` is fixed when the session is created
//! - At most one session exists per worktree

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::paths::LogicalPaths;
use crate::core::types::{BranchName, Commit, Oid, Reference, UtcTimestamp};

/// Current session schema version. A stored session with another version
/// is treated as corrupt.
pub const SESSION_SCHEMA_VERSION: u32 = 2;

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session is stored.
    #[error("no replay session at {}", path.display())]
    NotFound { path: PathBuf },

    /// The stored session cannot be used.
    #[error("replay session at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Refused to persist a session that violates its invariants.
    #[error("refusing to save invalid replay session: {0}")]
    Invalid(String),

    #[error("replay session i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Which replay flavour a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Rebase,
    CherryPick,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Rebase => "rebase",
            OperationKind::CherryPick => "cherry-pick",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-progress replay, exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySession {
    pub version: u32,
    /// Correlates log lines across the invocations of one replay.
    pub op_id: Uuid,
    pub kind: OperationKind,
    /// HEAD before the operation started.
    pub original_head: Oid,
    /// Branch checked out before the operation; `None` for a detached HEAD.
    pub original_branch: Option<BranchName>,
    /// Baseline the first pending commit is applied onto.
    pub upstream: Oid,
    /// How the upstream was named when the replay started.
    pub upstream_name: String,
    /// HEAD the commit at the head of `pending` applies onto, as of the
    /// last save. HEAD one commit past it means that commit was committed
    /// but the session was not yet updated.
    pub baseline: Oid,
    /// Commits still to apply; the first one is next.
    pub pending: Vec<Commit>,
    pub applied_count: usize,
    pub started_at: UtcTimestamp,
    pub updated_at: UtcTimestamp,
}

impl ReplaySession {
    pub fn new(
        kind: OperationKind,
        original_head: Oid,
        original_branch: Option<BranchName>,
        upstream: &Reference,
        pending: Vec<Commit>,
    ) -> Self {
        let now = UtcTimestamp::now();
        Self {
            version: SESSION_SCHEMA_VERSION,
            op_id: Uuid::new_v4(),
            kind,
            original_head,
            original_branch,
            upstream: upstream.target.clone(),
            upstream_name: upstream.name.clone(),
            baseline: upstream.target.clone(),
            pending,
            applied_count: 0,
            started_at: now.clone(),
            updated_at: now,
        }
    }

    /// The commit the next step applies.
    pub fn next(&self) -> Option<&Commit> {
        self.pending.first()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove the head commit after it was applied.
    pub fn pop_applied(&mut self) -> Option<Commit> {
        let commit = self.pop()?;
        self.applied_count += 1;
        Some(commit)
    }

    /// Remove the head commit without applying it.
    pub fn pop_skipped(&mut self) -> Option<Commit> {
        self.pop()
    }

    fn pop(&mut self) -> Option<Commit> {
        if self.pending.is_empty() {
            return None;
        }
        self.updated_at = UtcTimestamp::now();
        Some(self.pending.remove(0))
    }
}

/// Reads and writes the session file of one worktree.
#[derive(Debug, Clone)]
pub struct SessionStore {
    paths: LogicalPaths,
}

impl SessionStore {
    pub fn new(paths: LogicalPaths) -> Self {
        Self { paths }
    }

    pub fn path(&self) -> PathBuf {
        self.paths.session_path()
    }

    /// Whether a replay is in progress.
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Read the stored session.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no session is stored
    /// - [`StoreError::Corrupt`] if it cannot be parsed, has an unknown
    ///   schema version, or has no pending commits
    pub fn load(&self) -> Result<ReplaySession, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { path });
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(StoreError::Corrupt {
                    path,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let session: ReplaySession =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if session.version != SESSION_SCHEMA_VERSION {
            return Err(StoreError::Corrupt {
                path,
                reason: format!(
                    "schema version {} is not supported (expected {})",
                    session.version, SESSION_SCHEMA_VERSION
                ),
            });
        }
        if session.pending.is_empty() {
            return Err(StoreError::Corrupt {
                path,
                reason: "no pending commits".to_string(),
            });
        }

        Ok(session)
    }

    /// Atomically replace the stored session.
    pub fn save(&self, session: &ReplaySession) -> Result<(), StoreError> {
        if session.pending.is_empty() {
            return Err(StoreError::Invalid(
                "a session must have at least one pending commit".to_string(),
            ));
        }

        let dir = self.paths.replay_dir();
        fs::create_dir_all(&dir)?;

        let content = serde_json::to_string_pretty(session)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path()).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(
            op_id = %session.op_id,
            pending = session.pending.len(),
            applied = session.applied_count,
            "saved replay session"
        );
        Ok(())
    }

    /// Delete the stored session. Deleting an absent session is a no-op.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(self.path()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }
        // Only succeeds once the directory is empty.
        let _ = fs::remove_dir(self.paths.replay_dir());
        tracing::debug!("cleared replay session");
        Ok(())
    }
}
