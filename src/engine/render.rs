//! engine::render
//!
//! Turns an [`OperationResult`] into the exact text and exit status the
//! user sees. Pure: no I/O, no repository access.
//!
//! Every message ends with exactly one trailing blank line. `<id7>` below
//! is the 7-character abbreviated id and `<cmd>` the invoked command.
//!
//! ```text
//! Applied [<id7>] <short>
//! error: could not apply [<id7>] <short>
//! Conflicts:
//! 	<path>
//!
//! hint: ...
//! ```

use crate::core::ops::session::OperationKind;
use crate::core::types::{BranchName, Commit};

use super::result::{ExitStatus, OperationResult};

/// The operation a result belongs to. Differs from the command for
/// `pull`, which runs either a merge or a rebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Rebase,
    CherryPick,
    Merge,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Rebase => "rebase",
            Operation::CherryPick => "cherry-pick",
            Operation::Merge => "merge",
        }
    }
}

impl From<OperationKind> for Operation {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Rebase => Operation::Rebase,
            OperationKind::CherryPick => Operation::CherryPick,
        }
    }
}

/// What the renderer needs to know besides the result itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// The invoked subcommand, e.g. `rebase` or `pull`.
    pub command: &'static str,
    pub operation: Operation,
    /// Branch the operation updates; `None` for a detached HEAD.
    pub branch: Option<BranchName>,
}

impl RenderContext {
    pub fn new(command: &'static str, operation: Operation, branch: Option<BranchName>) -> Self {
        Self {
            command,
            operation,
            branch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub exit_status: ExitStatus,
    pub message: String,
}

impl Rendered {
    /// Failures go to stderr, everything else to stdout.
    pub fn to_stderr(&self) -> bool {
        self.exit_status == ExitStatus::Error
    }
}

fn commit_label(commit: &Commit) -> String {
    format!("[{}] {}", commit.id.abbrev(), commit.short_message)
}

fn applied_lines(applied: &[Commit], lines: &mut Vec<String>) {
    lines.extend(applied.iter().map(|c| format!("Applied {}", commit_label(c))));
}

fn ok_summary(ctx: &RenderContext) -> String {
    match (ctx.operation, &ctx.branch) {
        (Operation::Rebase, Some(branch)) => {
            format!("Successfully rebased and updated {}.", branch.refname())
        }
        (Operation::Rebase, None) => "Successfully rebased detached HEAD.".to_string(),
        (Operation::CherryPick, Some(branch)) => {
            format!("Successfully cherry-picked onto {branch}.")
        }
        (Operation::CherryPick, None) => "Successfully cherry-picked onto detached HEAD.".to_string(),
        (Operation::Merge, _) => "Merge made by the recursive strategy.".to_string(),
    }
}

fn stopped_hints(ctx: &RenderContext, lines: &mut Vec<String>) {
    let cmd = ctx.command;
    lines.push(
        "hint: Resolve all conflicts manually and mark them as resolved with \"git add <paths>\","
            .to_string(),
    );
    lines.push(
        "hint: or run \"lgit mergetool\" to resolve them with the model-aware merge tool."
            .to_string(),
    );
    lines.push(format!("hint: Then run \"lgit {cmd} --continue\" to resume."));
    if ctx.operation == Operation::Merge {
        lines.push(
            "hint: You can instead commit the resolved result yourself with \"git commit\"."
                .to_string(),
        );
    } else {
        lines.push(format!(
            "hint: You can instead skip this commit with \"lgit {cmd} --skip\"."
        ));
    }
    lines.push(format!(
        "hint: To abort and get back to the state before \"lgit {cmd}\", run \"lgit {cmd} --abort\"."
    ));
}

/// Render a result for display.
pub fn render(result: &OperationResult, ctx: &RenderContext) -> Rendered {
    let mut lines: Vec<String> = Vec::new();

    match result {
        OperationResult::Ok { applied } => {
            applied_lines(applied, &mut lines);
            lines.push(ok_summary(ctx));
        }
        OperationResult::UpToDate => lines.push(match (ctx.operation, &ctx.branch) {
            (Operation::Rebase, Some(branch)) => format!("Current branch {branch} is up to date."),
            (Operation::Rebase, None) => "Current HEAD is up to date.".to_string(),
            _ => "Already up to date.".to_string(),
        }),
        OperationResult::FastForward { from, to } => {
            lines.push(format!("Updating {}..{}", from.abbrev(), to.abbrev()));
            lines.push("Fast-forward".to_string());
        }
        OperationResult::Stopped { conflict, applied } => {
            applied_lines(applied, &mut lines);
            let verb = if ctx.operation == Operation::Merge {
                "merge"
            } else {
                "apply"
            };
            lines.push(format!(
                "error: could not {verb} {}",
                commit_label(&conflict.stopped_at)
            ));
            lines.push("Conflicts:".to_string());
            lines.extend(conflict.conflicting_paths.iter().map(|p| format!("\t{p}")));
            lines.push(String::new());
            stopped_hints(ctx, &mut lines);
        }
        OperationResult::Aborted { restored, branch } => {
            let target = branch
                .as_ref()
                .map(|b| b.to_string())
                .unwrap_or_else(|| "HEAD".to_string());
            lines.push(format!(
                "Aborted {}. Restored {target} to [{}].",
                ctx.operation.as_str(),
                restored.abbrev()
            ));
        }
        OperationResult::NothingToCommit { commit, applied } => {
            applied_lines(applied, &mut lines);
            lines.push(format!(
                "The commit {} introduces no changes on top of the current baseline.",
                commit_label(commit)
            ));
            lines.push(format!(
                "hint: Run \"lgit {cmd} --skip\" to drop it, or \"lgit {cmd} --abort\" to restore the original branch.",
                cmd = ctx.command
            ));
        }
        OperationResult::Failed(failure) => {
            lines.push(format!("error: {}", failure.reason));
            lines.extend(failure.details.iter().map(|d| format!("\t{d}")));
            lines.extend(failure.hints.iter().map(|h| format!("hint: {h}")));
            if let Some(trace) = &failure.trace {
                lines.extend(trace.trim_end().lines().map(str::to_string));
            }
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    Rendered {
        exit_status: result.exit_status(),
        message: format!("{}\n\n", lines.join("\n")),
    }
}
