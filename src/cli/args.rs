//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `--git-dir <path>`: Use this repository directory
//! - `--cwd <path>`: Run as if in that directory
//! - `--show-stack-trace`: Print the cause chain and a backtrace on failure
//! - `--debug`: Enable debug logging on stderr
//!
//! The resolution flags (`--continue`, `--abort`, `--skip`) are mutually
//! exclusive and cannot be combined with the arguments that start an
//! operation.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// lgit - resumable rebase, cherry-pick, merge and pull
#[derive(Parser, Debug)]
#[command(name = "lgit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the repository's git directory
    #[arg(long, global = true, value_name = "PATH")]
    pub git_dir: Option<PathBuf>,

    /// Run as if lgit was started in this directory
    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// Print the cause chain and a backtrace when a command fails
    #[arg(long, global = true)]
    pub show_stack_trace: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What a resolution flag asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Continue,
    Abort,
    Skip,
}

/// `--continue | --abort | --skip` for replaying commands.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(id = "resume", multiple = false)]
pub struct ReplayResume {
    /// Resume after resolving the conflicts
    #[arg(long = "continue", id = "continue")]
    pub continue_op: bool,

    /// Give up and restore the state before the operation started
    #[arg(long)]
    pub abort: bool,

    /// Drop the commit the operation stopped at and go on
    #[arg(long)]
    pub skip: bool,
}

impl ReplayResume {
    pub fn action(&self) -> Option<Resume> {
        if self.continue_op {
            Some(Resume::Continue)
        } else if self.abort {
            Some(Resume::Abort)
        } else if self.skip {
            Some(Resume::Skip)
        } else {
            None
        }
    }
}

/// `--continue | --abort` for merges.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(id = "resume", multiple = false)]
pub struct MergeResume {
    /// Commit the merge after resolving the conflicts
    #[arg(long = "continue", id = "continue")]
    pub continue_op: bool,

    /// Give up the merge and restore HEAD
    #[arg(long)]
    pub abort: bool,
}

impl MergeResume {
    pub fn action(&self) -> Option<Resume> {
        if self.continue_op {
            Some(Resume::Continue)
        } else if self.abort {
            Some(Resume::Abort)
        } else {
            None
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the current branch's commits on top of another base
    #[command(
        name = "rebase",
        long_about = "Replay the commits of the current branch (or <branch>) that are not \
            in <upstream> on top of <upstream>, one at a time.\n\n\
            When a commit conflicts, lgit stops and leaves the conflict in the working \
            tree. Resolve it, stage the result and run \"lgit rebase --continue\"; or drop \
            the commit with --skip; or restore the branch with --abort.\n\n\
            Without <upstream> the branch's configured tracking reference is used.",
        after_help = "\
EXAMPLES:
    lgit rebase main
    lgit rebase main feature
    lgit rebase --continue"
    )]
    Rebase {
        /// Base to replay onto (default: the tracking reference)
        #[arg(conflicts_with = "resume")]
        upstream: Option<String>,

        /// Branch to check out before replaying
        #[arg(conflicts_with = "resume", requires = "upstream")]
        branch: Option<String>,

        #[command(flatten)]
        resume: ReplayResume,
    },

    /// Apply the changes of existing commits onto the current branch
    #[command(
        name = "cherry-pick",
        long_about = "Apply the given commits onto HEAD in the order given. \
            An argument of the form A..B stands for the commits of that range, oldest first.",
        after_help = "\
EXAMPLES:
    lgit cherry-pick 1a2b3c4
    lgit cherry-pick main~3..main
    lgit cherry-pick --skip"
    )]
    CherryPick {
        /// Commits or ranges to apply
        #[arg(
            conflicts_with = "resume",
            required_unless_present_any = ["continue", "abort", "skip"]
        )]
        commits: Vec<String>,

        #[command(flatten)]
        resume: ReplayResume,
    },

    /// Join another line of history into the current branch
    Merge {
        /// Commit or branch to merge
        #[arg(
            conflicts_with = "resume",
            required_unless_present_any = ["continue", "abort"]
        )]
        commit: Option<String>,

        #[command(flatten)]
        resume: MergeResume,
    },

    /// Fetch the tracking branch and integrate it
    Pull {
        /// Rebase onto the fetched branch instead of merging
        #[arg(long, conflicts_with_all = ["no_rebase", "resume"])]
        rebase: bool,

        /// Merge the fetched branch even if pull.rebase is set
        #[arg(long, conflicts_with = "resume")]
        no_rebase: bool,

        #[command(flatten)]
        resume: ReplayResume,
    },

    /// Resolve conflicts with the configured merge tool
    Mergetool {
        /// Merge tool to use instead of mergetool.tool
        #[arg(long)]
        tool: Option<String>,

        /// Conflicted paths to resolve (default: all)
        paths: Vec<String>,
    },
}

impl Command {
    /// Subcommand name as typed.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Rebase { .. } => "rebase",
            Command::CherryPick { .. } => "cherry-pick",
            Command::Merge { .. } => "merge",
            Command::Pull { .. } => "pull",
            Command::Mergetool { .. } => "mergetool",
        }
    }
}

impl Cli {
    /// `Some(true)` for `--rebase`, `Some(false)` for `--no-rebase`.
    pub fn pull_rebase_flag(rebase: bool, no_rebase: bool) -> Option<bool> {
        match (rebase, no_rebase) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
