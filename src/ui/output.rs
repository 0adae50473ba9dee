//! ui::output
//!
//! Writes rendered results to the terminal.
//!
//! Rendered messages already carry their trailing blank line, so they are
//! written as-is. Failures go to stderr, everything else to stdout.

use std::io::{self, Write};

use crate::engine::Rendered;

/// Print a rendered result to the stream it belongs on.
pub fn emit(rendered: &Rendered) {
    let result = if rendered.to_stderr() {
        write_message(&mut io::stderr().lock(), &rendered.message)
    } else {
        write_message(&mut io::stdout().lock(), &rendered.message)
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "could not write output");
    }
}

/// Print a plain informational line to stdout.
pub fn info(message: impl std::fmt::Display) {
    println!("{message}");
}

fn write_message(out: &mut impl Write, message: &str) -> io::Result<()> {
    out.write_all(message.as_bytes())?;
    out.flush()
}
