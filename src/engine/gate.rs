//! engine::gate
//!
//! Precondition checks run before an operation touches the repository.
//!
//! # Invariants
//!
//! - A new operation never starts while another is in progress, whether
//!   the other one is an lgit session or git's own merge/rebase/cherry-pick
//! - A new operation never starts over uncommitted or untracked changes
//! - `--continue`, `--skip` and `--abort` only run against a session of the
//!   matching kind
//! - The in-progress check runs before the dirty check, so a paused
//!   operation (whose tree is conflicted) reports as in progress

use thiserror::Error;

use crate::core::ops::session::{OperationKind, ReplaySession, SessionStore, StoreError};
use crate::core::types::BranchName;
use crate::git::{GitState, VcsBackend};

use super::error::ReplayError;

/// Something already in progress in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InProgress {
    /// An lgit replay session.
    Session(OperationKind),
    /// Git's own in-progress state.
    Git(GitState),
}

impl std::fmt::Display for InProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InProgress::Session(kind) => write!(f, "a {kind}"),
            InProgress::Git(state) => write!(f, "a git {state}"),
        }
    }
}

/// The repository is not in a state the requested command can run in.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("{operation} is already in progress")]
    OperationInProgress { operation: InProgress },

    #[error("the working tree is not clean; these paths have uncommitted or untracked changes:")]
    DirtyWorktree { paths: Vec<String> },

    #[error("no {operation} in progress")]
    NoOperationInProgress { operation: &'static str },

    #[error("you must resolve all conflicts first; these paths are still conflicting:")]
    UnresolvedConflicts { paths: Vec<String> },

    #[error("{}", no_tracking_message(.branch))]
    NoTrackingInfo { branch: Option<BranchName> },
}

fn no_tracking_message(branch: &Option<BranchName>) -> String {
    match branch {
        Some(branch) => format!("there is no tracking information for the current branch {branch}"),
        None => "you are not currently on a branch".to_string(),
    }
}

/// Checks before starting a new rebase, cherry-pick, merge or pull.
pub fn check_can_start<B: VcsBackend>(
    backend: &B,
    store: &SessionStore,
) -> Result<(), ReplayError> {
    if store.exists() {
        // A corrupt session surfaces as such rather than as "in progress".
        let session = store.load()?;
        return Err(PreconditionError::OperationInProgress {
            operation: InProgress::Session(session.kind),
        }
        .into());
    }

    let state = backend.in_progress_state();
    if state.is_in_progress() {
        return Err(PreconditionError::OperationInProgress {
            operation: InProgress::Git(state),
        }
        .into());
    }

    let status = backend.current_status()?;
    if !status.is_clean() {
        return Err(PreconditionError::DirtyWorktree {
            paths: status.dirty_paths(),
        }
        .into());
    }

    Ok(())
}

/// Load the session a resume command acts on.
pub fn require_session(
    store: &SessionStore,
    kind: OperationKind,
) -> Result<ReplaySession, ReplayError> {
    let missing = PreconditionError::NoOperationInProgress {
        operation: kind.as_str(),
    };
    match store.load() {
        Ok(session) if session.kind == kind => Ok(session),
        Ok(_) | Err(StoreError::NotFound { .. }) => Err(missing.into()),
        Err(e) => Err(e.into()),
    }
}

/// Fails while any path is still conflicting.
pub fn require_resolved<B: VcsBackend>(backend: &B) -> Result<(), ReplayError> {
    let status = backend.current_status()?;
    if status.has_conflicts() {
        return Err(PreconditionError::UnresolvedConflicts {
            paths: status.conflicted.into_iter().collect(),
        }
        .into());
    }
    Ok(())
}

/// Merge resume commands act on git's own merge state.
pub fn require_git_merge<B: VcsBackend>(backend: &B) -> Result<(), ReplayError> {
    if backend.in_progress_state() != GitState::Merge {
        return Err(PreconditionError::NoOperationInProgress { operation: "merge" }.into());
    }
    Ok(())
}
