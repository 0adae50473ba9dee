//! logicalgit - resumable rebase, cherry-pick, merge and pull
//!
//! `lgit` replays commits one at a time and pauses on conflict. A paused
//! operation is persisted, so `--continue`, `--skip` and `--abort` run as
//! separate processes.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Preconditions, replay orchestration, merge and pull, rendering
//! - [`core`] - Domain types, paths, configuration, session store and lock
//! - [`git`] - Single interface for all Git operations
//! - [`compare`] - Decides whether a conflict is a logical one
//! - [`telemetry`] - Opt-in logging to stderr
//! - [`ui`] - Terminal output
//!
//! # Correctness Invariants
//!
//! 1. A paused operation is always fully persisted before lgit exits
//! 2. `--abort` restores the branch and HEAD recorded at start
//! 3. Every invocation ends with one message and one exit code

pub mod cli;
pub mod compare;
pub mod core;
pub mod engine;
pub mod git;
pub mod telemetry;
pub mod ui;
