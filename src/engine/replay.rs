//! engine::replay
//!
//! The resumable multi-commit replay orchestrator behind rebase,
//! cherry-pick and `pull --rebase`.
//!
//! # Lifecycle
//!
//! ```text
//! start ──► step ──► Ok (session deleted)
//!             │
//!             ├──► Stopped ──► continue_op ──► step ...
//!             │        │
//!             │        └─────► skip_op ──────► step ...
//!             │
//!             └──► NothingToCommit ──► skip_op / abort_op
//!
//! abort_op from any pause ──► Aborted (session deleted)
//! ```
//!
//! Each arrow out of a pause is a separate process. The orchestrator keeps
//! no state of its own; every resume starts by loading the session.
//!
//! # Invariants
//!
//! - The session is persisted before `start` moves HEAD
//! - A paused session has the commit that paused it at the head of `pending`
//! - A commit is popped only after it was committed (or skipped)
//! - `baseline` is HEAD as of the last save; a resume that finds the
//!   paused commit already committed on top of it pops it as applied
//! - `applied` in a result lists only commits created by this invocation

use crate::compare::ModelComparator;
use crate::core::ops::session::{OperationKind, ReplaySession, SessionStore, StoreError};
use crate::core::types::{BranchName, Commit, Oid, Reference};
use crate::git::{ApplyOutcome, ApplyStrategy, HeadState, VcsBackend};

use super::error::ReplayError;
use super::gate;
use super::result::{ConflictReport, OperationResult};

pub struct ReplayOrchestrator<'a, B: VcsBackend, C: ModelComparator> {
    kind: OperationKind,
    backend: &'a B,
    comparator: &'a C,
    store: &'a SessionStore,
}

impl<'a, B: VcsBackend, C: ModelComparator> ReplayOrchestrator<'a, B, C> {
    pub fn new(
        kind: OperationKind,
        backend: &'a B,
        comparator: &'a C,
        store: &'a SessionStore,
    ) -> Self {
        Self {
            kind,
            backend,
            comparator,
            store,
        }
    }

    /// Replay the commits of `branch` (default: HEAD) that are not in
    /// `upstream` onto `upstream`, oldest first, skipping merge commits.
    pub fn start(
        &self,
        upstream: &Reference,
        branch: Option<&BranchName>,
    ) -> Result<OperationResult, ReplayError> {
        gate::check_can_start(self.backend, self.store)?;

        if let Some(branch) = branch {
            if self.backend.head()?.branch() != Some(branch) {
                self.backend.checkout_branch(branch)?;
            }
        }
        let head = self.backend.head()?;
        let tip = head.target().clone();

        let pending: Vec<Commit> = self
            .backend
            .list_commits_between(&upstream.target, &tip)?
            .into_iter()
            .filter(|c| !c.is_merge())
            .collect();

        if pending.is_empty() {
            if tip != upstream.target && self.backend.is_ancestor(&tip, &upstream.target)? {
                self.fast_forward(&head, &upstream.target)?;
                tracing::info!(from = %tip.abbrev(), to = %upstream.target.abbrev(), "fast-forwarded");
                return Ok(OperationResult::FastForward {
                    from: tip,
                    to: upstream.target.clone(),
                });
            }
            return Ok(OperationResult::UpToDate);
        }
        if self.backend.is_ancestor(&upstream.target, &tip)? {
            return Ok(OperationResult::UpToDate);
        }

        let session = ReplaySession::new(
            self.kind,
            tip,
            head.branch().cloned(),
            upstream,
            pending,
        );
        self.store.save(&session)?;
        tracing::info!(
            op_id = %session.op_id,
            kind = %self.kind,
            upstream = %upstream.name,
            pending = session.pending.len(),
            "starting replay"
        );
        self.backend.checkout_detached(&upstream.target)?;
        self.step(session, Vec::new())
    }

    /// Replay `commits` in the given order onto the current HEAD. Commits
    /// land directly on the checked-out branch.
    pub fn start_with_commits(&self, commits: Vec<Commit>) -> Result<OperationResult, ReplayError> {
        gate::check_can_start(self.backend, self.store)?;
        if commits.is_empty() {
            return Ok(OperationResult::UpToDate);
        }

        let head = self.backend.head()?;
        let baseline = Reference::new("HEAD", head.target().clone());
        let session = ReplaySession::new(
            self.kind,
            head.target().clone(),
            head.branch().cloned(),
            &baseline,
            commits,
        );
        self.store.save(&session)?;
        tracing::info!(
            op_id = %session.op_id,
            kind = %self.kind,
            pending = session.pending.len(),
            "starting replay of explicit commits"
        );
        self.step(session, Vec::new())
    }

    /// Resume after the user resolved a conflict: commit the index as the
    /// paused commit's replacement and carry on.
    pub fn continue_op(&self) -> Result<OperationResult, ReplayError> {
        let mut session = gate::require_session(self.store, self.kind)?;
        if let Some(created) = self.committed_ahead(&session)? {
            tracing::info!(
                op_id = %session.op_id,
                created = %created.id.abbrev(),
                "paused commit was already committed"
            );
            session.pop_applied();
            return self.step(session, vec![created]);
        }
        gate::require_resolved(self.backend)?;

        let commit = self.head_of(&session)?;
        match self.backend.commit_index_as(&commit)? {
            None => {
                tracing::info!(op_id = %session.op_id, commit = %commit.id.abbrev(), "nothing to commit on continue");
                Ok(OperationResult::NothingToCommit {
                    commit,
                    applied: Vec::new(),
                })
            }
            Some(created) => {
                session.pop_applied();
                self.step(session, vec![created])
            }
        }
    }

    /// Drop the paused commit and carry on with the next one.
    pub fn skip_op(&self) -> Result<OperationResult, ReplayError> {
        let mut session = gate::require_session(self.store, self.kind)?;

        let baseline = match self.committed_ahead(&session)? {
            Some(_) => session.baseline.clone(),
            None => self.backend.head()?.target().clone(),
        };
        self.backend.reset_hard(&baseline)?;
        if let Some(skipped) = session.pop_skipped() {
            tracing::info!(op_id = %session.op_id, commit = %skipped.id.abbrev(), "skipped commit");
        }
        self.step(session, Vec::new())
    }

    /// Restore the branch and HEAD to where they were before `start`.
    pub fn abort_op(&self) -> Result<OperationResult, ReplayError> {
        let session = gate::require_session(self.store, self.kind)?;

        self.backend.reset_hard(&session.original_head)?;
        if let Some(branch) = &session.original_branch {
            self.backend.update_branch(branch, &session.original_head)?;
            self.backend.checkout_branch(branch)?;
        }
        self.store.clear()?;

        tracing::info!(op_id = %session.op_id, restored = %session.original_head.abbrev(), "aborted replay");
        Ok(OperationResult::Aborted {
            restored: session.original_head,
            branch: session.original_branch,
        })
    }

    /// Apply pending commits until one pauses or none are left.
    fn step(
        &self,
        mut session: ReplaySession,
        mut applied: Vec<Commit>,
    ) -> Result<OperationResult, ReplayError> {
        loop {
            if session.is_exhausted() {
                return self.finalize(session, applied);
            }
            // Every step that leaves pending commits behind is a stop point.
            session.baseline = self.backend.head()?.target().clone();
            self.store.save(&session)?;

            let commit = self.head_of(&session)?;
            if let ApplyOutcome::Conflicted { paths } = self.apply(&commit)? {
                tracing::info!(
                    op_id = %session.op_id,
                    commit = %commit.id.abbrev(),
                    conflicts = paths.len(),
                    applied = session.applied_count,
                    "paused on conflict"
                );
                return Ok(OperationResult::Stopped {
                    conflict: ConflictReport::new(paths, commit),
                    applied,
                });
            }

            match self.backend.commit_index_as(&commit)? {
                Some(created) => {
                    tracing::debug!(
                        op_id = %session.op_id,
                        original = %commit.id.abbrev(),
                        created = %created.id.abbrev(),
                        "applied commit"
                    );
                    session.pop_applied();
                    applied.push(created);
                }
                None => {
                    tracing::info!(op_id = %session.op_id, commit = %commit.id.abbrev(), "commit introduces no changes");
                    return Ok(OperationResult::NothingToCommit { commit, applied });
                }
            }
        }
    }

    /// Apply one commit, re-applying in favour of the commit when the
    /// comparator finds the conflicts are not logical ones.
    fn apply(&self, commit: &Commit) -> Result<ApplyOutcome, ReplayError> {
        let outcome = self.backend.apply_commit(commit, ApplyStrategy::Normal)?;
        let ApplyOutcome::Conflicted { paths } = &outcome else {
            return Ok(outcome);
        };
        if self.comparator.is_logically_conflicting(paths)? {
            return Ok(outcome);
        }

        tracing::debug!(commit = %commit.id.abbrev(), "conflicts are not logical, favouring replayed content");
        let baseline = self.backend.head()?.target().clone();
        self.backend.reset_hard(&baseline)?;
        Ok(self
            .backend
            .apply_commit(commit, ApplyStrategy::FavorReplayed)?)
    }

    fn finalize(
        &self,
        session: ReplaySession,
        applied: Vec<Commit>,
    ) -> Result<OperationResult, ReplayError> {
        if session.kind == OperationKind::Rebase {
            let new_tip = self.backend.head()?.target().clone();
            if let Some(branch) = &session.original_branch {
                self.backend.update_branch(branch, &new_tip)?;
                self.backend.checkout_branch(branch)?;
            }
        }
        self.store.clear()?;
        tracing::info!(
            op_id = %session.op_id,
            applied = session.applied_count,
            "replay finished"
        );
        Ok(OperationResult::Ok { applied })
    }

    fn fast_forward(&self, head: &HeadState, to: &Oid) -> Result<(), ReplayError> {
        self.backend.checkout_detached(to)?;
        if let Some(branch) = head.branch() {
            self.backend.update_branch(branch, to)?;
            self.backend.checkout_branch(branch)?;
        }
        Ok(())
    }

    /// The commit HEAD gained on top of the session's baseline when it is
    /// the paused commit, committed by a process that exited before saving.
    fn committed_ahead(&self, session: &ReplaySession) -> Result<Option<Commit>, ReplayError> {
        let head = self.backend.head()?.target().clone();
        if head == session.baseline {
            return Ok(None);
        }
        let pending = self.head_of(session)?;
        let commit = self.backend.find_commit(&head)?;
        let matches = commit.parent_ids == [session.baseline.clone()]
            && commit.full_message == pending.full_message;
        Ok(matches.then_some(commit))
    }

    fn head_of(&self, session: &ReplaySession) -> Result<Commit, ReplayError> {
        session.next().cloned().ok_or_else(|| {
            StoreError::Corrupt {
                path: self.store.path(),
                reason: "no pending commits".to_string(),
            }
            .into()
        })
    }
}
