//! engine
//!
//! Resumable replay of commits and the surrounding command lifecycle.
//!
//! # Architecture
//!
//! ```text
//! Gate -> (Upstream resolve | Session load) -> Replay / Merge -> Render
//! ```
//!
//! - [`gate`] rejects commands the repository state does not allow
//! - [`upstream`] picks the baseline for rebase and pull
//! - [`replay`] applies pending commits one at a time and pauses on conflict
//! - [`merge`] runs merges and pulls on top of git's own merge state
//! - [`render`] turns the [`OperationResult`] into the user-facing message
//!
//! # Invariants
//!
//! - Nothing survives in memory between invocations; the session file is
//!   the only cross-process state
//! - Every command ends in exactly one [`OperationResult`]

pub mod error;
pub mod gate;
pub mod merge;
pub mod render;
pub mod replay;
pub mod result;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CommandError, ReplayError};
pub use gate::{InProgress, PreconditionError};
pub use merge::{MergeFlow, PullFlow, PullStrategy};
pub use render::{render, Operation, RenderContext, Rendered};
pub use replay::ReplayOrchestrator;
pub use result::{ConflictReport, ExitStatus, Failure, FailureKind, OperationResult};
pub use upstream::UpstreamResolver;

use std::path::PathBuf;

/// Execution context for commands.
///
/// Global settings derived from CLI flags and configuration.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Explicit repository directory.
    pub git_dir: Option<PathBuf>,
    /// Print the cause chain and a backtrace with failures.
    pub show_stack_trace: bool,
}
