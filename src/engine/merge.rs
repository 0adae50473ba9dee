//! engine::merge
//!
//! `lgit merge` and `lgit pull`.
//!
//! A merge is a single step, so it keeps no session of its own: a paused
//! merge is git's own MERGE_HEAD state, which `git commit` and other tools
//! understand too. Pull fetches the tracking remote and then either merges
//! the tracking reference or rebases onto it through the replay
//! orchestrator.

use crate::compare::ModelComparator;
use crate::core::ops::session::{OperationKind, SessionStore};
use crate::core::types::{Oid, Reference};
use crate::git::{ApplyOutcome, HeadState, MergeAnalysis, MergeBackend};

use super::error::ReplayError;
use super::gate;
use super::render::Operation;
use super::replay::ReplayOrchestrator;
use super::result::{ConflictReport, OperationResult};

/// Remote name git uses for tracking a local branch.
const LOCAL_REMOTE: &str = ".";

pub struct MergeFlow<'a, B: MergeBackend> {
    backend: &'a B,
    store: &'a SessionStore,
}

impl<'a, B: MergeBackend> MergeFlow<'a, B> {
    pub fn new(backend: &'a B, store: &'a SessionStore) -> Self {
        Self { backend, store }
    }

    /// Merge `theirs` into HEAD.
    pub fn start(&self, theirs: &Reference) -> Result<OperationResult, ReplayError> {
        gate::check_can_start(self.backend, self.store)?;
        let head = self.backend.head()?;

        match self.backend.merge_analysis(&theirs.target)? {
            MergeAnalysis::UpToDate => Ok(OperationResult::UpToDate),
            MergeAnalysis::FastForward => {
                self.fast_forward(&head, &theirs.target)?;
                tracing::info!(from = %head.target().abbrev(), to = %theirs.target.abbrev(), "fast-forwarded");
                Ok(OperationResult::FastForward {
                    from: head.target().clone(),
                    to: theirs.target.clone(),
                })
            }
            MergeAnalysis::Normal => {
                let message = match head.branch() {
                    Some(branch) => format!("Merge {} into {branch}", theirs.name),
                    None => format!("Merge {}", theirs.name),
                };
                match self.backend.merge_into_index(&theirs.target, &message)? {
                    ApplyOutcome::Clean => {
                        let commit = self.backend.commit_merge()?;
                        tracing::info!(merged = %theirs.name, commit = %commit.id.abbrev(), "merged");
                        Ok(OperationResult::Ok {
                            applied: vec![commit],
                        })
                    }
                    ApplyOutcome::Conflicted { paths } => {
                        tracing::info!(merged = %theirs.name, conflicts = paths.len(), "merge paused on conflict");
                        let stopped_at = self.backend.find_commit(&theirs.target)?;
                        Ok(OperationResult::Stopped {
                            conflict: ConflictReport::new(paths, stopped_at),
                            applied: Vec::new(),
                        })
                    }
                }
            }
        }
    }

    /// Commit the resolved merge.
    pub fn continue_op(&self) -> Result<OperationResult, ReplayError> {
        gate::require_git_merge(self.backend)?;
        gate::require_resolved(self.backend)?;
        let commit = self.backend.commit_merge()?;
        tracing::info!(commit = %commit.id.abbrev(), "concluded merge");
        Ok(OperationResult::Ok {
            applied: vec![commit],
        })
    }

    /// Throw the merge away and return to HEAD.
    pub fn abort_op(&self) -> Result<OperationResult, ReplayError> {
        gate::require_git_merge(self.backend)?;
        let head = self.backend.head()?;
        self.backend.reset_hard(head.target())?;
        tracing::info!(restored = %head.target().abbrev(), "aborted merge");
        Ok(OperationResult::Aborted {
            restored: head.target().clone(),
            branch: head.branch().cloned(),
        })
    }

    fn fast_forward(&self, head: &HeadState, to: &Oid) -> Result<(), ReplayError> {
        self.backend.checkout_detached(to)?;
        if let Some(branch) = head.branch() {
            self.backend.update_branch(branch, to)?;
            self.backend.checkout_branch(branch)?;
        }
        Ok(())
    }
}

/// How `pull` integrates the fetched tracking reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStrategy {
    Merge,
    Rebase,
}

impl PullStrategy {
    pub fn from_rebase(rebase: bool) -> Self {
        if rebase {
            PullStrategy::Rebase
        } else {
            PullStrategy::Merge
        }
    }

    pub fn operation(self) -> Operation {
        match self {
            PullStrategy::Merge => Operation::Merge,
            PullStrategy::Rebase => Operation::Rebase,
        }
    }
}

pub struct PullFlow<'a, B: MergeBackend, C: ModelComparator> {
    backend: &'a B,
    comparator: &'a C,
    store: &'a SessionStore,
}

impl<'a, B: MergeBackend, C: ModelComparator> PullFlow<'a, B, C> {
    pub fn new(backend: &'a B, comparator: &'a C, store: &'a SessionStore) -> Self {
        Self {
            backend,
            comparator,
            store,
        }
    }

    /// Fetch the current branch's tracking remote, then merge or rebase.
    pub fn start(&self, strategy: PullStrategy) -> Result<OperationResult, ReplayError> {
        gate::check_can_start(self.backend, self.store)?;
        let (branch, tracking) = super::upstream::UpstreamResolver::new(self.backend).tracking()?;

        if tracking.remote != LOCAL_REMOTE {
            tracing::info!(remote = %tracking.remote, "fetching");
            self.backend.fetch(&tracking.remote)?;
        }
        let target = self.backend.resolve_reference(&tracking.refname)?.target;
        let upstream = Reference::new(tracking.name, target);
        tracing::debug!(branch = %branch, upstream = %upstream.name, ?strategy, "pulling");

        match strategy {
            PullStrategy::Merge => MergeFlow::new(self.backend, self.store).start(&upstream),
            PullStrategy::Rebase => self.rebase().start(&upstream, None),
        }
    }

    /// The operation a resume flag acts on: a paused rebase session if one
    /// exists, otherwise git's merge state.
    pub fn resuming(&self) -> Operation {
        if self.store.exists() {
            Operation::Rebase
        } else {
            Operation::Merge
        }
    }

    pub fn continue_op(&self) -> Result<OperationResult, ReplayError> {
        match self.resuming() {
            Operation::Merge => MergeFlow::new(self.backend, self.store).continue_op(),
            _ => self.rebase().continue_op(),
        }
    }

    pub fn abort_op(&self) -> Result<OperationResult, ReplayError> {
        match self.resuming() {
            Operation::Merge => MergeFlow::new(self.backend, self.store).abort_op(),
            _ => self.rebase().abort_op(),
        }
    }

    /// Only a rebasing pull has commits to skip.
    pub fn skip_op(&self) -> Result<OperationResult, ReplayError> {
        self.rebase().skip_op()
    }

    fn rebase(&self) -> ReplayOrchestrator<'a, B, C> {
        ReplayOrchestrator::new(OperationKind::Rebase, self.backend, self.comparator, self.store)
    }
}
