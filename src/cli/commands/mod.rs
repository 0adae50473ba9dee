//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Turns its arguments into engine inputs
//! 2. Runs the engine flow
//! 3. Renders the [`OperationResult`] for the invoked command
//!
//! Every handler error becomes a rendered `Failed` result here, so dispatch
//! always produces exactly one message and exit status.

mod cherry_pick;
mod mergetool;
mod merge;
mod pull;
mod rebase;

pub use cherry_pick::cherry_pick;
pub use mergetool::mergetool;
pub use merge::merge;
pub use pull::pull;
pub use rebase::rebase;

use crate::cli::args::{Cli, Command, Resume};
use crate::compare::ModelComparator;
use crate::core::config::Config;
use crate::core::ops::lock::RepoLock;
use crate::core::ops::session::{OperationKind, SessionStore};
use crate::core::paths::LogicalPaths;
use crate::core::types::{BranchName, Reference};
use crate::engine::{
    render, CommandError, Context, Operation, OperationResult, RenderContext, Rendered,
    ReplayError, ReplayOrchestrator,
};
use crate::git::{Git, GitError, VcsBackend};

/// An opened repository with everything a command needs.
pub struct Repo {
    pub git: Git,
    pub paths: LogicalPaths,
    pub config: Config,
    pub store: SessionStore,
}

impl Repo {
    /// Open the repository selected by `--git-dir`, `--cwd` or the
    /// current directory, in that order.
    pub fn open(ctx: &Context) -> Result<Self, CommandError> {
        let git = match (&ctx.git_dir, &ctx.cwd) {
            (Some(git_dir), _) => Git::open_git_dir(git_dir)?,
            (None, Some(cwd)) => Git::open(cwd)?,
            (None, None) => {
                let cwd = std::env::current_dir().map_err(|e| GitError::AccessError {
                    message: format!("cannot read the current directory: {e}"),
                })?;
                Git::open(&cwd)?
            }
        };
        let paths = LogicalPaths::from_repo_info(&git.info()?);
        let config = Config::load(Some(&paths))?;
        tracing::debug!(
            git_dir = %paths.git_dir().display(),
            global_config = ?config.global_path_loaded(),
            repo_config = ?config.repo_path_loaded(),
            "opened repository"
        );
        let store = SessionStore::new(paths.clone());
        Ok(Self {
            git,
            paths,
            config,
            store,
        })
    }

    /// Branch HEAD is on, `None` when detached.
    pub fn head_branch(&self) -> Result<Option<BranchName>, CommandError> {
        Ok(self.git.head()?.branch().cloned())
    }

    /// Branch recorded by the paused session, for rendering resumed
    /// operations. An unreadable session renders as detached; the resume
    /// itself reports the corruption.
    pub fn session_branch(&self) -> Option<BranchName> {
        self.store.load().ok().and_then(|s| s.original_branch)
    }
}

/// Dispatch a command to its handler and render the outcome.
pub fn dispatch(command: Command, ctx: &Context) -> Rendered {
    let name = command.name();
    let operation = operation_of(&command);
    let mut show_stack_trace = ctx.show_stack_trace;

    let outcome = Repo::open(ctx).and_then(|repo| {
        show_stack_trace |= repo.config.show_stack_trace();
        let _lock = RepoLock::acquire(&repo.paths)?;
        run(command, &repo)
    });

    match outcome {
        Ok(rendered) => rendered,
        Err(err) => {
            tracing::debug!(error = ?err, command = name, "command failed");
            let failure = err.into_failure(name, show_stack_trace);
            render(
                &OperationResult::Failed(failure),
                &RenderContext::new(name, operation, None),
            )
        }
    }
}

fn run(command: Command, repo: &Repo) -> Result<Rendered, CommandError> {
    match command {
        Command::Rebase {
            upstream,
            branch,
            resume,
        } => rebase::rebase(repo, upstream.as_deref(), branch.as_deref(), resume.action()),
        Command::CherryPick { commits, resume } => {
            cherry_pick::cherry_pick(repo, &commits, resume.action())
        }
        Command::Merge { commit, resume } => merge::merge(repo, commit.as_deref(), resume.action()),
        Command::Pull {
            rebase,
            no_rebase,
            resume,
        } => pull::pull(repo, Cli::pull_rebase_flag(rebase, no_rebase), resume.action()),
        Command::Mergetool { tool, paths } => mergetool::mergetool(repo, tool, &paths),
    }
}

fn operation_of(command: &Command) -> Operation {
    match command {
        Command::Rebase { .. } => Operation::Rebase,
        Command::CherryPick { .. } => Operation::CherryPick,
        Command::Merge { .. } | Command::Pull { .. } | Command::Mergetool { .. } => {
            Operation::Merge
        }
    }
}

/// Resolve a revision given on the command line. An unknown revision is
/// the user's mistake, not a repository failure.
fn resolve_arg(git: &Git, spec: &str, what: &str) -> Result<Reference, CommandError> {
    match git.resolve_reference(spec) {
        Ok(reference) => Ok(reference),
        Err(GitError::RefNotFound { .. }) => Err(CommandError::InvalidArgument {
            reason: format!("invalid {what} '{spec}'"),
            hint: Some(format!("\"{spec}\" does not name a commit in this repository.")),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Run a resolution flag against the replay session.
fn resume_replay<B: VcsBackend, C: ModelComparator>(
    orchestrator: &ReplayOrchestrator<'_, B, C>,
    action: Resume,
) -> Result<OperationResult, ReplayError> {
    match action {
        Resume::Continue => orchestrator.continue_op(),
        Resume::Abort => orchestrator.abort_op(),
        Resume::Skip => orchestrator.skip_op(),
    }
}

/// Render a replay command's result.
fn render_replay(
    result: &OperationResult,
    command: &'static str,
    kind: OperationKind,
    branch: Option<BranchName>,
) -> Rendered {
    render(result, &RenderContext::new(command, kind.into(), branch))
}
