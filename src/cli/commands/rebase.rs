//! rebase command - replay a branch onto a new base
//!
//! `lgit rebase [<upstream> [<branch>]]` starts a replay; `--continue`,
//! `--skip` and `--abort` act on the paused one.

use super::{render_replay, resolve_arg, resume_replay, Repo};
use crate::cli::args::Resume;
use crate::compare::TextualComparator;
use crate::core::ops::session::OperationKind;
use crate::core::types::BranchName;
use crate::engine::{gate, CommandError, Rendered, ReplayOrchestrator, UpstreamResolver};

pub fn rebase(
    repo: &Repo,
    upstream: Option<&str>,
    branch: Option<&str>,
    resume: Option<Resume>,
) -> Result<Rendered, CommandError> {
    let orchestrator = ReplayOrchestrator::new(
        OperationKind::Rebase,
        &repo.git,
        &TextualComparator,
        &repo.store,
    );

    if let Some(action) = resume {
        let branch = repo.session_branch();
        let result = resume_replay(&orchestrator, action)?;
        return Ok(render_replay(&result, "rebase", OperationKind::Rebase, branch));
    }

    // In-progress work is reported before a missing tracking branch.
    gate::check_can_start(&repo.git, &repo.store)?;

    let explicit = upstream
        .map(|spec| resolve_arg(&repo.git, spec, "upstream"))
        .transpose()?;
    let upstream = UpstreamResolver::new(&repo.git).resolve(explicit)?;
    let branch = branch.map(BranchName::new).transpose()?;
    let rendered_branch = match &branch {
        Some(branch) => Some(branch.clone()),
        None => repo.head_branch()?,
    };

    let result = orchestrator.start(&upstream, branch.as_ref())?;
    Ok(render_replay(
        &result,
        "rebase",
        OperationKind::Rebase,
        rendered_branch,
    ))
}
