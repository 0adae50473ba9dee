//! git::backend
//!
//! The seams the engine drives the repository through.
//!
//! [`VcsBackend`] is everything the replay orchestrator needs; the merge
//! and pull flows additionally use [`MergeBackend`]. [`super::Git`]
//! implements both over git2. Unit tests substitute in-memory fakes.

use std::collections::BTreeSet;

use crate::core::types::{BranchName, Commit, Oid, Reference};

use super::{GitError, GitState};

/// What HEAD points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD is a symbolic ref to a local branch.
    Branch { name: BranchName, target: Oid },
    /// HEAD points directly at a commit.
    Detached(Oid),
}

impl HeadState {
    pub fn target(&self) -> &Oid {
        match self {
            HeadState::Branch { target, .. } => target,
            HeadState::Detached(target) => target,
        }
    }

    /// The checked-out branch, `None` when detached.
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            HeadState::Branch { name, .. } => Some(name),
            HeadState::Detached(_) => None,
        }
    }
}

/// How to resolve content conflicts while applying a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStrategy {
    /// Leave conflicts in the index and working tree.
    Normal,
    /// Resolve content conflicts in favour of the commit being applied.
    FavorReplayed,
}

/// Result of applying one commit onto HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Index and working tree hold the merged result.
    Clean,
    /// Conflicts were left in the index; paths sorted.
    Conflicted { paths: Vec<String> },
}

/// Paths that keep the working tree from being clean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Staged or unstaged changes to tracked files.
    pub changed: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
    pub conflicted: BTreeSet<String>,
}

impl WorktreeStatus {
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty() && self.untracked.is_empty() && self.conflicted.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicted.is_empty()
    }

    /// Every offending path, sorted and deduplicated.
    pub fn dirty_paths(&self) -> Vec<String> {
        self.changed
            .iter()
            .chain(&self.untracked)
            .chain(&self.conflicted)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// A branch's configured upstream (`branch.<name>.remote` / `.merge`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRef {
    /// Remote name; `.` for a local upstream.
    pub remote: String,
    /// The local ref mirroring the upstream, e.g. `refs/remotes/origin/main`.
    pub refname: String,
    /// Display name, e.g. `origin/main`.
    pub name: String,
}

/// Result of analysing a merge of another commit into HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAnalysis {
    UpToDate,
    FastForward,
    Normal,
}

/// Repository operations used by the replay orchestrator.
pub trait VcsBackend {
    fn head(&self) -> Result<HeadState, GitError>;

    /// Resolve a revision (branch, remote-tracking branch, id, `HEAD~2`, ...).
    /// The returned reference keeps `spec` as its name.
    fn resolve_reference(&self, spec: &str) -> Result<Reference, GitError>;

    fn find_commit(&self, id: &Oid) -> Result<Commit, GitError>;

    /// Commits reachable from `tip` but not from `base`, oldest first.
    fn list_commits_between(&self, base: &Oid, tip: &Oid) -> Result<Vec<Commit>, GitError>;

    /// True when `ancestor == descendant` too.
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError>;

    /// Apply the changes `commit` introduces onto HEAD, in the index and
    /// working tree. Does not commit.
    fn apply_commit(&self, commit: &Commit, strategy: ApplyStrategy)
        -> Result<ApplyOutcome, GitError>;

    /// Commit the index on top of HEAD with `original`'s author and
    /// message. Returns `None` when the index introduces no changes.
    fn commit_index_as(&self, original: &Commit) -> Result<Option<Commit>, GitError>;

    fn checkout_detached(&self, target: &Oid) -> Result<(), GitError>;

    /// Check out `branch`'s tree and attach HEAD to it.
    fn checkout_branch(&self, branch: &BranchName) -> Result<(), GitError>;

    /// Point `refs/heads/<branch>` at `target` without touching HEAD.
    fn update_branch(&self, branch: &BranchName, target: &Oid) -> Result<(), GitError>;

    /// Move HEAD (and the branch it is attached to) to `target`, discarding
    /// index and working tree changes and any in-progress git state.
    fn reset_hard(&self, target: &Oid) -> Result<(), GitError>;

    fn current_status(&self) -> Result<WorktreeStatus, GitError>;

    fn resolve_tracking_ref(&self, branch: &BranchName) -> Result<Option<TrackingRef>, GitError>;

    /// Git's own in-progress operation, independent of lgit's session.
    fn in_progress_state(&self) -> GitState;
}

/// Repository operations used by merge and pull.
pub trait MergeBackend: VcsBackend {
    fn merge_analysis(&self, theirs: &Oid) -> Result<MergeAnalysis, GitError>;

    /// Merge `theirs` into the index and working tree, leaving git's merge
    /// state (MERGE_HEAD, MERGE_MSG) behind. Does not commit.
    fn merge_into_index(&self, theirs: &Oid, message: &str) -> Result<ApplyOutcome, GitError>;

    /// Commit the index as a merge of HEAD and MERGE_HEAD, then clear the
    /// merge state.
    fn commit_merge(&self) -> Result<Commit, GitError>;

    /// Fetch every configured refspec of `remote`.
    fn fetch(&self, remote: &str) -> Result<(), GitError>;
}
