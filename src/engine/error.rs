//! engine::error
//!
//! Engine errors and their classification at the command boundary.
//!
//! Every error a command can hit is converted into a [`Failure`] here, so
//! nothing reaches the user as a panic or a raw `Debug` dump. The class
//! decides the exit status and which hints are shown:
//!
//! - Validation: the user can fix it (dirty tree, wrong state, bad argument)
//! - Backend: git, the comparator, configuration or the filesystem failed
//! - CorruptState: the session file is unusable and must be removed by hand

use std::error::Error as _;

use thiserror::Error;

use crate::compare::CompareError;
use crate::core::config::ConfigError;
use crate::core::ops::lock::LockError;
use crate::core::ops::session::StoreError;
use crate::core::types::TypeError;
use crate::git::{GitError, GitState};

use super::gate::{InProgress, PreconditionError};
use super::result::{Failure, FailureKind};

/// Errors from the replay orchestrator, merge flow and their checks.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Compare(#[from] CompareError),
}

/// Anything a command handler can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A command-line argument cannot be used.
    #[error("{reason}")]
    InvalidArgument {
        reason: String,
        hint: Option<String>,
    },

    /// An external tool failed.
    #[error("{0:#}")]
    Tool(anyhow::Error),
}

impl From<GitError> for CommandError {
    fn from(err: GitError) -> Self {
        CommandError::Replay(err.into())
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Replay(err.into())
    }
}

impl From<PreconditionError> for CommandError {
    fn from(err: PreconditionError) -> Self {
        CommandError::Replay(err.into())
    }
}

impl From<TypeError> for CommandError {
    fn from(err: TypeError) -> Self {
        CommandError::invalid_argument(err.to_string())
    }
}

impl CommandError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            reason: reason.into(),
            hint: None,
        }
    }

    /// Classify into a user-facing failure. `command` is the invoked
    /// subcommand, used in hints.
    pub fn into_failure(self, command: &str, show_stack_trace: bool) -> Failure {
        let trace = show_stack_trace.then(|| self.trace());
        let mut failure = match self {
            CommandError::Replay(ReplayError::Precondition(err)) => precondition_failure(err, command),
            CommandError::Replay(ReplayError::Store(StoreError::Corrupt { path, reason })) => {
                Failure::new(
                    FailureKind::CorruptState,
                    format!("the replay session is corrupt: {reason}"),
                )
                .with_hint(format!(
                    "Remove {} to abandon the operation, then restore your branch with \"git checkout\".",
                    path.display()
                ))
            }
            CommandError::Lock(LockError::AlreadyLocked) => {
                Failure::new(FailureKind::Validation, LockError::AlreadyLocked.to_string())
                    .with_hint("Wait for the other process to finish, then try again.")
            }
            CommandError::InvalidArgument { reason, hint } => {
                let failure = Failure::new(FailureKind::Validation, reason);
                match hint {
                    Some(hint) => failure.with_hint(hint),
                    None => failure,
                }
            }
            other => Failure::new(FailureKind::Backend, other.to_string()),
        };
        failure.trace = trace;
        failure
    }

    /// Cause chain and a backtrace captured at the boundary.
    fn trace(&self) -> String {
        let mut lines = Vec::new();
        let mut source = self.source();
        while let Some(err) = source {
            lines.push(format!("caused by: {err}"));
            source = err.source();
        }
        if let CommandError::Tool(err) = self {
            lines.extend(err.chain().skip(1).map(|e| format!("caused by: {e}")));
        }
        lines.push("stack backtrace:".to_string());
        lines.push(std::backtrace::Backtrace::force_capture().to_string());
        lines.join("\n")
    }
}

fn precondition_failure(err: PreconditionError, command: &str) -> Failure {
    let reason = err.to_string();
    match err {
        PreconditionError::OperationInProgress {
            operation: InProgress::Session(kind),
        } => Failure::new(FailureKind::Validation, reason).with_hint(format!(
            "Use \"lgit {kind} --continue\" to resume it, or \"lgit {kind} --abort\" to give it up."
        )),
        PreconditionError::OperationInProgress {
            operation: InProgress::Git(GitState::Merge),
        } => Failure::new(FailureKind::Validation, reason).with_hint(
            "Use \"lgit merge --continue\" to conclude it, or \"lgit merge --abort\" to give it up.",
        ),
        PreconditionError::OperationInProgress {
            operation: InProgress::Git(state),
        } => Failure::new(FailureKind::Validation, reason).with_hint(format!(
            "Finish or abort the {state} with git before running lgit."
        )),
        PreconditionError::DirtyWorktree { paths } => Failure::new(FailureKind::Validation, reason)
            .with_details(paths)
            .with_hint("Commit, stash or remove these changes, then try again."),
        PreconditionError::NoOperationInProgress { .. } => {
            Failure::new(FailureKind::Validation, reason)
        }
        PreconditionError::UnresolvedConflicts { paths } => {
            Failure::new(FailureKind::Validation, reason)
                .with_details(paths)
                .with_hint(format!(
                    "Mark them as resolved with \"git add <paths>\", then run \"lgit {command} --continue\" again."
                ))
        }
        PreconditionError::NoTrackingInfo { branch } => {
            let mut failure = Failure::new(FailureKind::Validation, reason);
            // pull has no upstream argument.
            if command != "pull" {
                failure = failure.with_hint(format!(
                    "Specify the upstream explicitly: \"lgit {command} <upstream>\"."
                ));
            }
            match branch {
                Some(branch) => failure.with_hint(format!(
                    "Set one with \"git branch --set-upstream-to=<remote>/<branch> {branch}\"."
                )),
                None => failure.with_hint("Check out a branch first."),
            }
        }
    }
}
