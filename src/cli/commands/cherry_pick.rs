//! cherry-pick command - apply existing commits onto HEAD
//!
//! Commits apply in the order given. `A..B` stands for the commits
//! reachable from B but not from A, oldest first.

use super::{render_replay, resolve_arg, resume_replay, Repo};
use crate::cli::args::Resume;
use crate::compare::TextualComparator;
use crate::core::ops::session::OperationKind;
use crate::core::types::Commit;
use crate::engine::{gate, CommandError, Rendered, ReplayOrchestrator};
use crate::git::{Git, VcsBackend};

pub fn cherry_pick(
    repo: &Repo,
    commits: &[String],
    resume: Option<Resume>,
) -> Result<Rendered, CommandError> {
    let orchestrator = ReplayOrchestrator::new(
        OperationKind::CherryPick,
        &repo.git,
        &TextualComparator,
        &repo.store,
    );

    if let Some(action) = resume {
        let branch = repo.session_branch();
        let result = resume_replay(&orchestrator, action)?;
        return Ok(render_replay(
            &result,
            "cherry-pick",
            OperationKind::CherryPick,
            branch,
        ));
    }

    gate::check_can_start(&repo.git, &repo.store)?;
    let mut picked = Vec::new();
    for spec in commits {
        picked.extend(expand(&repo.git, spec)?);
    }
    let branch = repo.head_branch()?;
    let result = orchestrator.start_with_commits(picked)?;
    Ok(render_replay(
        &result,
        "cherry-pick",
        OperationKind::CherryPick,
        branch,
    ))
}

/// The commits one argument stands for, oldest first.
fn expand(git: &Git, spec: &str) -> Result<Vec<Commit>, CommandError> {
    let commits = match spec.split_once("..") {
        Some((from, to)) => {
            let from = resolve_arg(git, or_head(from), "revision")?;
            let to = resolve_arg(git, or_head(to), "revision")?;
            git.list_commits_between(&from.target, &to.target)?
        }
        None => {
            let reference = resolve_arg(git, spec, "commit")?;
            vec![git.find_commit(&reference.target)?]
        }
    };

    if let Some(merge) = commits.iter().find(|c| c.is_merge()) {
        return Err(CommandError::InvalidArgument {
            reason: format!("commit {} is a merge commit", merge.id.abbrev()),
            hint: Some("Merge commits cannot be cherry-picked; pick the commits they merged instead.".to_string()),
        });
    }
    Ok(commits)
}

fn or_head(spec: &str) -> &str {
    if spec.is_empty() {
        "HEAD"
    } else {
        spec
    }
}
