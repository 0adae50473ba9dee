//! pull command - fetch the tracking branch and integrate it
//!
//! The strategy comes from `--rebase` / `--no-rebase`, else from the
//! `pull.rebase` configuration key. Resolution flags act on whatever the
//! pull paused in: the replay session of a rebasing pull, or git's merge
//! state.

use super::Repo;
use crate::cli::args::Resume;
use crate::compare::TextualComparator;
use crate::engine::{
    render, CommandError, Operation, PullFlow, PullStrategy, RenderContext, Rendered,
};

pub fn pull(
    repo: &Repo,
    rebase: Option<bool>,
    resume: Option<Resume>,
) -> Result<Rendered, CommandError> {
    let flow = PullFlow::new(&repo.git, &TextualComparator, &repo.store);

    let (result, operation, branch) = match resume {
        Some(action) => {
            let operation = flow.resuming();
            let branch = match operation {
                Operation::Rebase => repo.session_branch(),
                _ => repo.head_branch()?,
            };
            let result = match action {
                Resume::Continue => flow.continue_op()?,
                Resume::Abort => flow.abort_op()?,
                Resume::Skip if operation == Operation::Merge => {
                    return Err(CommandError::InvalidArgument {
                        reason: "no rebase in progress".to_string(),
                        hint: Some(
                            "--skip only applies to a pull that is rebasing; use \"lgit pull --abort\" to give up a merge."
                                .to_string(),
                        ),
                    })
                }
                Resume::Skip => flow.skip_op()?,
            };
            (result, operation, branch)
        }
        None => {
            let strategy =
                PullStrategy::from_rebase(rebase.unwrap_or_else(|| repo.config.pull_rebase()));
            let branch = repo.head_branch()?;
            (flow.start(strategy)?, strategy.operation(), branch)
        }
    };

    Ok(render(
        &result,
        &RenderContext::new("pull", operation, branch),
    ))
}
