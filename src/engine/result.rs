//! engine::result
//!
//! The closed set of outcomes every command reports.

use std::collections::BTreeSet;

use crate::core::types::{BranchName, Commit, Oid};

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The operation finished.
    Complete,
    /// The operation paused on a conflict or was aborted.
    Aborted,
    /// The operation could not run.
    Error,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Complete => 0,
            ExitStatus::Aborted => 1,
            ExitStatus::Error => 2,
        }
    }
}

/// Where a replay or merge stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    /// Sorted and deduplicated.
    pub conflicting_paths: Vec<String>,
    pub stopped_at: Commit,
}

impl ConflictReport {
    pub fn new(paths: impl IntoIterator<Item = String>, stopped_at: Commit) -> Self {
        Self {
            conflicting_paths: paths.into_iter().collect::<BTreeSet<_>>().into_iter().collect(),
            stopped_at,
        }
    }
}

/// Error classes a failure is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad arguments or repository in the wrong state.
    Validation,
    /// git, comparator, configuration or filesystem failure.
    Backend,
    /// The stored session is unusable.
    CorruptState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
    /// Items the reason refers to, one per line (e.g. dirty paths).
    pub details: Vec<String>,
    pub hints: Vec<String>,
    /// Cause chain and backtrace, present with `--show-stack-trace`.
    pub trace: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            details: Vec::new(),
            hints: Vec::new(),
            trace: None,
        }
    }

    pub fn with_details(mut self, details: impl IntoIterator<Item = String>) -> Self {
        self.details.extend(details);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

/// Outcome of one lgit invocation.
///
/// `applied` always lists the commits created during this invocation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Ok {
        applied: Vec<Commit>,
    },
    UpToDate,
    FastForward {
        from: Oid,
        to: Oid,
    },
    Stopped {
        conflict: ConflictReport,
        applied: Vec<Commit>,
    },
    Aborted {
        restored: Oid,
        branch: Option<BranchName>,
    },
    NothingToCommit {
        commit: Commit,
        applied: Vec<Commit>,
    },
    Failed(Failure),
}

impl OperationResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            OperationResult::Failed(_) => ExitStatus::Error,
            OperationResult::Stopped { .. } | OperationResult::Aborted { .. } => {
                ExitStatus::Aborted
            }
            OperationResult::Ok { .. }
            | OperationResult::UpToDate
            | OperationResult::FastForward { .. }
            | OperationResult::NothingToCommit { .. } => ExitStatus::Complete,
        }
    }

    /// Commits created by this invocation.
    pub fn applied(&self) -> &[Commit] {
        match self {
            OperationResult::Ok { applied }
            | OperationResult::Stopped { applied, .. }
            | OperationResult::NothingToCommit { applied, .. } => applied,
            _ => &[],
        }
    }
}
