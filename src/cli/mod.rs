//! cli
//!
//! Command-line interface layer for lgit.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging when asked for
//! - Delegate to command handlers and print their rendered result
//!
//! The CLI layer is thin. Repository changes happen in [`crate::engine`].

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use clap::Parser;

use crate::engine::{self, ExitStatus};
use crate::{telemetry, ui};

/// Run the CLI application and return the process exit code.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> u8 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version are not failures; usage errors exit with ERROR.
            let _ = err.print();
            return if err.use_stderr() {
                ExitStatus::Error.code()
            } else {
                ExitStatus::Complete.code()
            };
        }
    };

    telemetry::init(cli.debug);

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        git_dir: cli.git_dir.clone(),
        show_stack_trace: cli.show_stack_trace,
    };

    let rendered = commands::dispatch(cli.command, &ctx);
    ui::output::emit(&rendered);
    rendered.exit_status.code()
}
