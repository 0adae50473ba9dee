//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in lgit.
//! No other module imports `git2`; everything above talks to [`Git`] through
//! the [`VcsBackend`] and [`MergeBackend`] traits or the handful of inherent
//! methods used while opening a repository.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested revision does not exist
//! - [`GitError::ObjectNotFound`]: Requested object does not exist
//! - [`GitError::Internal`]: Anything else libgit2 reports
//!
//! # Example
//!
//! ```ignore
//! use logicalgit::git::{Git, VcsBackend};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let upstream = git.resolve_reference("origin/main")?;
//! println!("origin/main is at {}", upstream.target.abbrev());
//! ```

use std::cell::Cell;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::backend::{
    ApplyOutcome, ApplyStrategy, HeadState, MergeAnalysis, MergeBackend, TrackingRef,
    VcsBackend, WorktreeStatus,
};
use crate::core::types::{BranchName, Commit, Oid, Reference, TypeError};

/// Identity used for committers when git has no `user.name`/`user.email`.
const FALLBACK_NAME: &str = "lgit";
const FALLBACK_EMAIL: &str = "lgit@localhost";

/// Credential callback attempts before a fetch gives up.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound { oid: String },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName { message: String },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError { message: String },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => {
                if context.starts_with("refs/") || context.contains("ref") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Adapter for `map_err` on operations whose failure has no better
    /// category than the operation's name.
    fn op(context: &'static str) -> impl Fn(git2::Error) -> GitError {
        move |e| GitError::Internal {
            message: format!("{}: {}", context, e.message()),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Locations of a repository on disk.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Per-worktree git directory
    pub git_dir: PathBuf,
    /// Git directory shared by all worktrees
    pub common_dir: PathBuf,
    /// Working directory
    pub work_dir: PathBuf,
}

/// State of in-progress Git operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitState {
    /// No operation in progress.
    Clean,
    Rebase,
    Merge,
    CherryPick,
    Revert,
    Bisect,
    ApplyMailbox,
}

impl GitState {
    /// Check if any operation is in progress.
    ///
    /// # Example
    ///
    /// ```
    /// use logicalgit::git::GitState;
    ///
    /// assert!(!GitState::Clean.is_in_progress());
    /// assert!(GitState::Merge.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Rebase => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "am",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. All repository
/// reads and writes flow through this interface.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Self::from_repo(repo)
    }

    /// Open the repository whose git directory is exactly `git_dir`.
    pub fn open_git_dir(git_dir: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(git_dir).map_err(|_| GitError::NotARepo {
            path: git_dir.to_path_buf(),
        })?;
        Self::from_repo(repo)
    }

    fn from_repo(repo: git2::Repository) -> Result<Self, GitError> {
        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }
        Ok(Self { repo })
    }

    pub fn info(&self) -> Result<RepoInfo, GitError> {
        let work_dir = self.repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();
        Ok(RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            common_dir: self.repo.commondir().to_path_buf(),
            work_dir,
        })
    }

    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // State Detection
    // =========================================================================

    /// Get the current Git state (rebase, merge, etc.).
    pub fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => GitState::Rebase,
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    /// Paths with unresolved conflicts in the index, sorted.
    ///
    /// A conflict entry may lack any one of its three stages (add/add has
    /// no ancestor, modify/delete lacks ours or theirs), so the path is
    /// taken from whichever stage is present.
    pub fn conflicting_paths(&self) -> Result<Vec<String>, GitError> {
        let mut index = self.repo.index().map_err(GitError::op("read index"))?;
        index.read(false).map_err(GitError::op("read index"))?;
        Self::index_conflicts(&index)
    }

    fn index_conflicts(index: &git2::Index) -> Result<Vec<String>, GitError> {
        let mut paths = std::collections::BTreeSet::new();
        for conflict in index.conflicts().map_err(GitError::op("list conflicts"))? {
            let conflict = conflict.map_err(GitError::op("list conflicts"))?;
            let entry = conflict
                .our
                .as_ref()
                .or(conflict.their.as_ref())
                .or(conflict.ancestor.as_ref());
            if let Some(entry) = entry {
                paths.insert(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        Ok(paths.into_iter().collect())
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    fn to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    fn find_git2_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .find_commit(Self::to_git2(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn commit_value(commit: &git2::Commit<'_>) -> Result<Commit, GitError> {
        let parent_ids = commit
            .parent_ids()
            .map(Self::from_git2_oid)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Commit {
            id: Self::from_git2_oid(commit.id())?,
            parent_ids,
            short_message: commit.summary().unwrap_or("").to_string(),
            full_message: commit.message().unwrap_or("").to_string(),
        })
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))
    }

    fn committer(&self) -> Result<git2::Signature<'static>, GitError> {
        self.repo
            .signature()
            .or_else(|_| git2::Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))
            .map_err(GitError::op("build committer signature"))
    }

    /// Write the index as a tree and report whether it differs from HEAD.
    fn write_index_tree(&self) -> Result<(git2::Tree<'_>, bool), GitError> {
        let mut index = self.repo.index().map_err(GitError::op("read index"))?;
        index.read(false).map_err(GitError::op("read index"))?;
        let tree_id = index.write_tree().map_err(GitError::op("write tree"))?;
        let head_tree_id = self.head_commit()?.tree_id();
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|e| GitError::from_git2(e, &tree_id.to_string()))?;
        Ok((tree, tree_id != head_tree_id))
    }

    /// Short display name of an upstream ref.
    fn upstream_display_name(refname: &str) -> String {
        refname
            .strip_prefix("refs/remotes/")
            .or_else(|| refname.strip_prefix("refs/heads/"))
            .unwrap_or(refname)
            .to_string()
    }
}

impl VcsBackend for Git {
    fn head(&self) -> Result<HeadState, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        let target = Self::from_git2_oid(
            head.peel_to_commit()
                .map_err(|e| GitError::from_git2(e, "HEAD"))?
                .id(),
        )?;

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(HeadState::Branch {
                    name: BranchName::new(name)?,
                    target,
                });
            }
        }
        Ok(HeadState::Detached(target))
    }

    fn resolve_reference(&self, spec: &str) -> Result<Reference, GitError> {
        let commit = self
            .repo
            .revparse_single(spec)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| match e.code() {
                git2::ErrorCode::NotFound
                | git2::ErrorCode::InvalidSpec
                | git2::ErrorCode::Ambiguous
                | git2::ErrorCode::Peel => GitError::RefNotFound {
                    refname: spec.to_string(),
                },
                _ => GitError::from_git2(e, spec),
            })?;
        Ok(Reference::new(spec, Self::from_git2_oid(commit.id())?))
    }

    fn find_commit(&self, id: &Oid) -> Result<Commit, GitError> {
        Self::commit_value(&self.find_git2_commit(id)?)
    }

    fn list_commits_between(&self, base: &Oid, tip: &Oid) -> Result<Vec<Commit>, GitError> {
        let mut revwalk = self.repo.revwalk().map_err(GitError::op("revwalk"))?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)
            .map_err(GitError::op("revwalk"))?;
        revwalk
            .push(Self::to_git2(tip)?)
            .map_err(|e| GitError::from_git2(e, tip.as_str()))?;
        revwalk
            .hide(Self::to_git2(base)?)
            .map_err(|e| GitError::from_git2(e, base.as_str()))?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(GitError::op("revwalk"))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
            commits.push(Self::commit_value(&commit)?);
        }
        Ok(commits)
    }

    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        // A commit is its own ancestor
        if ancestor == descendant {
            return Ok(true);
        }
        self.repo
            .graph_descendant_of(Self::to_git2(descendant)?, Self::to_git2(ancestor)?)
            .map_err(GitError::op("ancestry check"))
    }

    fn apply_commit(
        &self,
        commit: &Commit,
        strategy: ApplyStrategy,
    ) -> Result<ApplyOutcome, GitError> {
        let target = self.find_git2_commit(&commit.id)?;

        let mut merge_opts = git2::MergeOptions::new();
        if strategy == ApplyStrategy::FavorReplayed {
            merge_opts.file_favor(git2::FileFavor::Theirs);
        }
        let mut opts = git2::CherrypickOptions::new();
        opts.merge_opts(merge_opts);

        self.repo
            .cherrypick(&target, Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, commit.id.as_str()))?;

        let index = self.repo.index().map_err(GitError::op("read index"))?;
        let paths = Self::index_conflicts(&index)?;
        tracing::debug!(
            commit = %commit.id.abbrev(),
            ?strategy,
            conflicts = paths.len(),
            "applied commit to index"
        );

        if paths.is_empty() {
            Ok(ApplyOutcome::Clean)
        } else {
            Ok(ApplyOutcome::Conflicted { paths })
        }
    }

    fn commit_index_as(&self, original: &Commit) -> Result<Option<Commit>, GitError> {
        let (tree, changed) = self.write_index_tree()?;
        if !changed {
            return Ok(None);
        }

        let source = self.find_git2_commit(&original.id)?;
        let head = self.head_commit()?;
        let committer = self.committer()?;
        let id = self
            .repo
            .commit(
                Some("HEAD"),
                &source.author(),
                &committer,
                &original.full_message,
                &tree,
                &[&head],
            )
            .map_err(GitError::op("commit"))?;
        self.repo
            .cleanup_state()
            .map_err(GitError::op("clean up repository state"))?;

        let created = self.find_commit(&Self::from_git2_oid(id)?)?;
        tracing::debug!(
            original = %original.id.abbrev(),
            created = %created.id.abbrev(),
            "committed index"
        );
        Ok(Some(created))
    }

    fn checkout_detached(&self, target: &Oid) -> Result<(), GitError> {
        let commit = self.find_git2_commit(target)?;
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(GitError::op("checkout"))?;
        self.repo
            .set_head_detached(commit.id())
            .map_err(GitError::op("detach HEAD"))?;
        tracing::debug!(target = %target.abbrev(), "checked out detached HEAD");
        Ok(())
    }

    fn checkout_branch(&self, branch: &BranchName) -> Result<(), GitError> {
        let refname = branch.refname();
        let commit = self
            .repo
            .find_reference(&refname)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, &refname))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(GitError::op("checkout"))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        tracing::debug!(branch = %branch, "checked out branch");
        Ok(())
    }

    fn update_branch(&self, branch: &BranchName, target: &Oid) -> Result<(), GitError> {
        let refname = branch.refname();
        self.repo
            .reference(
                &refname,
                Self::to_git2(target)?,
                true,
                &format!("lgit: update {} to {}", branch, target.abbrev()),
            )
            .map_err(|e| GitError::from_git2(e, &refname))?;
        tracing::debug!(branch = %branch, target = %target.abbrev(), "updated branch");
        Ok(())
    }

    fn reset_hard(&self, target: &Oid) -> Result<(), GitError> {
        let commit = self.find_git2_commit(target)?;
        self.repo
            .reset(commit.as_object(), git2::ResetType::Hard, None)
            .map_err(GitError::op("reset"))?;
        self.repo
            .cleanup_state()
            .map_err(GitError::op("clean up repository state"))?;
        tracing::debug!(target = %target.abbrev(), "hard reset");
        Ok(())
    }

    fn current_status(&self) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(GitError::op("status"))?;

        let mut result = WorktreeStatus::default();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else { continue };
            let status = entry.status();

            if status.is_conflicted() {
                result.conflicted.insert(path.to_string());
            } else if status.is_wt_new() && !status.is_index_new() {
                result.untracked.insert(path.to_string());
            } else if !status.is_empty() && !status.is_ignored() {
                result.changed.insert(path.to_string());
            }
        }
        Ok(result)
    }

    fn resolve_tracking_ref(&self, branch: &BranchName) -> Result<Option<TrackingRef>, GitError> {
        let refname = branch.refname();

        let upstream = match self.repo.branch_upstream_name(&refname) {
            Ok(buf) => buf.as_str().unwrap_or_default().to_string(),
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, &refname)),
        };
        let remote = match self.repo.branch_upstream_remote(&refname) {
            Ok(buf) => buf.as_str().unwrap_or_default().to_string(),
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, &refname)),
        };
        if upstream.is_empty() || remote.is_empty() {
            return Ok(None);
        }

        Ok(Some(TrackingRef {
            name: Self::upstream_display_name(&upstream),
            refname: upstream,
            remote,
        }))
    }

    fn in_progress_state(&self) -> GitState {
        self.state()
    }
}

impl MergeBackend for Git {
    fn merge_analysis(&self, theirs: &Oid) -> Result<MergeAnalysis, GitError> {
        let annotated = self
            .repo
            .find_annotated_commit(Self::to_git2(theirs)?)
            .map_err(|e| GitError::from_git2(e, theirs.as_str()))?;
        let (analysis, _) = self
            .repo
            .merge_analysis(&[&annotated])
            .map_err(GitError::op("merge analysis"))?;

        if analysis.is_up_to_date() {
            Ok(MergeAnalysis::UpToDate)
        } else if analysis.is_fast_forward() {
            Ok(MergeAnalysis::FastForward)
        } else {
            Ok(MergeAnalysis::Normal)
        }
    }

    fn merge_into_index(&self, theirs: &Oid, message: &str) -> Result<ApplyOutcome, GitError> {
        let annotated = self
            .repo
            .find_annotated_commit(Self::to_git2(theirs)?)
            .map_err(|e| GitError::from_git2(e, theirs.as_str()))?;

        let mut merge_opts = git2::MergeOptions::new();
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.allow_conflicts(true).conflict_style_merge(true);
        self.repo
            .merge(&[&annotated], Some(&mut merge_opts), Some(&mut checkout))
            .map_err(GitError::op("merge"))?;

        // MERGE_MSG is what `commit_merge` (or a plain `git commit`) uses.
        std::fs::write(self.repo.path().join("MERGE_MSG"), format!("{message}\n")).map_err(
            |e| GitError::AccessError {
                message: format!("write MERGE_MSG: {e}"),
            },
        )?;

        let index = self.repo.index().map_err(GitError::op("read index"))?;
        let paths = Self::index_conflicts(&index)?;
        tracing::debug!(theirs = %theirs.abbrev(), conflicts = paths.len(), "merged into index");

        if paths.is_empty() {
            Ok(ApplyOutcome::Clean)
        } else {
            Ok(ApplyOutcome::Conflicted { paths })
        }
    }

    fn commit_merge(&self) -> Result<Commit, GitError> {
        let (tree, _) = self.write_index_tree()?;
        let head = self.head_commit()?;

        let mut merge_heads = Vec::new();
        // `mergehead_foreach` needs `&mut Repository`; use a second handle
        // on the same git dir so this method can keep taking `&self`.
        let mut mh_repo = git2::Repository::open(self.repo.path())
            .map_err(GitError::op("open repository"))?;
        mh_repo
            .mergehead_foreach(|oid| {
                merge_heads.push(*oid);
                true
            })
            .map_err(|e| GitError::from_git2(e, "MERGE_HEAD"))?;

        let mut parents = vec![head];
        for oid in merge_heads {
            parents.push(
                self.repo
                    .find_commit(oid)
                    .map_err(|e| GitError::from_git2(e, &oid.to_string()))?,
            );
        }
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let message = self
            .repo
            .message()
            .unwrap_or_else(|_| "Merge commit".to_string());
        let committer = self.committer()?;
        let id = self
            .repo
            .commit(
                Some("HEAD"),
                &committer,
                &committer,
                &message,
                &tree,
                &parent_refs,
            )
            .map_err(GitError::op("commit merge"))?;
        self.repo
            .cleanup_state()
            .map_err(GitError::op("clean up repository state"))?;

        let created = self.find_commit(&Self::from_git2_oid(id)?)?;
        tracing::debug!(created = %created.id.abbrev(), "committed merge");
        Ok(created)
    }

    fn fetch(&self, remote: &str) -> Result<(), GitError> {
        let mut handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| GitError::from_git2(e, &format!("remote {remote}")))?;
        let config = self.repo.config().map_err(GitError::op("read git config"))?;

        let attempts = Cell::new(0usize);
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |url, username, allowed| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            if allowed.contains(git2::CredentialType::SSH_KEY) {
                if let Some(user) = username {
                    return git2::Cred::ssh_key_from_agent(user);
                }
            }
            if allowed.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                return git2::Cred::credential_helper(&config, url, username);
            }
            git2::Cred::default()
        });

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(callbacks);
        handle
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(|e| GitError::Internal {
                message: format!("fetch {}: {}", remote, e.message()),
            })?;
        tracing::info!(remote, "fetched");
        Ok(())
    }
}
