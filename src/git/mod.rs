//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and writes
//! flow through this interface. No other module should import `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Commit log reading and ancestry queries
//! - Applying commits (cherry-pick into the index) and committing the result
//! - Checkout, branch updates and hard resets
//! - Status, conflict and in-progress state detection
//! - Tracking configuration and fetching
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName, Commit)
//! - Conflicting paths are always reported sorted

mod backend;
mod interface;

pub use backend::{
    ApplyOutcome, ApplyStrategy, HeadState, MergeAnalysis, MergeBackend, TrackingRef, VcsBackend,
    WorktreeStatus,
};
pub use interface::{Git, GitError, GitState, RepoInfo};
