//! merge command - join another line of history into HEAD
//!
//! A paused merge lives in git's own merge state, so `--continue` and
//! `--abort` act on MERGE_HEAD rather than on an lgit session.

use super::{resolve_arg, Repo};
use crate::cli::args::Resume;
use crate::engine::{
    render, CommandError, MergeFlow, Operation, RenderContext, Rendered,
};

pub fn merge(
    repo: &Repo,
    commit: Option<&str>,
    resume: Option<Resume>,
) -> Result<Rendered, CommandError> {
    let flow = MergeFlow::new(&repo.git, &repo.store);
    let branch = repo.head_branch()?;

    let result = match resume {
        Some(Resume::Continue) => flow.continue_op()?,
        Some(Resume::Abort) => flow.abort_op()?,
        Some(Resume::Skip) => {
            return Err(CommandError::invalid_argument(
                "--skip is not supported for merge",
            ))
        }
        None => {
            let spec = commit.ok_or_else(|| {
                CommandError::invalid_argument("no commit specified to merge")
            })?;
            flow.start(&resolve_arg(&repo.git, spec, "commit")?)?
        }
    };

    Ok(render(
        &result,
        &RenderContext::new("merge", Operation::Merge, branch),
    ))
}
