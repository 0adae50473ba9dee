//! mergetool command - resolve conflicts with an external merge tool
//!
//! Shells out to `git mergetool`, which already knows how to drive every
//! configured tool. The tool comes from `--tool`, else `mergetool.tool`,
//! else git's own `merge.tool`.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context as _, Result};

use super::Repo;
use crate::engine::{CommandError, ExitStatus, Rendered};

const NOTHING_TO_MERGE: &str = "No files need merging\n";

pub fn mergetool(
    repo: &Repo,
    tool: Option<String>,
    paths: &[String],
) -> Result<Rendered, CommandError> {
    let conflicted = repo.git.conflicting_paths()?;
    let selected = select(conflicted, paths);
    if selected.is_empty() {
        return Ok(complete(NOTHING_TO_MERGE));
    }

    let tool = tool.or_else(|| repo.config.mergetool_tool());
    let info = repo.git.info()?;
    tracing::info!(tool = ?tool, paths = selected.len(), "running git mergetool");
    run_git_mergetool(&info.git_dir, &info.work_dir, tool.as_deref(), &selected)
        .map_err(CommandError::Tool)?;
    Ok(complete(""))
}

/// Conflicted paths restricted to the requested ones, if any were given.
fn select(conflicted: Vec<String>, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return conflicted;
    }
    conflicted
        .into_iter()
        .filter(|path| requested.contains(path))
        .collect()
}

fn complete(message: &str) -> Rendered {
    Rendered {
        exit_status: ExitStatus::Complete,
        message: message.to_string(),
    }
}

fn run_git_mergetool(
    git_dir: &Path,
    work_dir: &Path,
    tool: Option<&str>,
    paths: &[String],
) -> Result<()> {
    let mut cmd = Command::new("git");
    cmd.arg("mergetool")
        .arg("--no-prompt")
        .env("GIT_DIR", git_dir)
        .env("GIT_WORK_TREE", work_dir)
        .current_dir(work_dir);
    if let Some(tool) = tool {
        cmd.args(["--tool", tool]);
    }
    cmd.arg("--").args(paths);

    let status = cmd.status().context("failed to run git mergetool")?;
    if !status.success() {
        bail!("git mergetool exited with {status}");
    }
    Ok(())
}
