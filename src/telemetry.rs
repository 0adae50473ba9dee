//! Logging initialization.
//!
//! Controlled by `LGIT_LOG` (an `EnvFilter` directive such as `debug` or
//! `logicalgit::engine=trace`) and the `--debug` flag:
//! - neither set: no subscriber, nothing is logged
//! - `--debug`: `debug` level for this crate, unless `LGIT_LOG` says otherwise
//! - `LGIT_LOG` set: that filter
//!
//! Events always go to stderr so they never mix with the command's
//! stdout message.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "LGIT_LOG";

const DEBUG_DIRECTIVE: &str = "logicalgit=debug";

/// Install the stderr subscriber if logging was requested.
///
/// Returns whether a subscriber was installed.
pub fn init(debug: bool) -> bool {
    let Some(filter) = filter(std::env::var(LOG_ENV).ok().as_deref(), debug) else {
        return false;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

fn filter(directive: Option<&str>, debug: bool) -> Option<EnvFilter> {
    match directive {
        Some(d) if !d.trim().is_empty() => {
            Some(EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(DEBUG_DIRECTIVE)))
        }
        _ if debug => Some(EnvFilter::new(DEBUG_DIRECTIVE)),
        _ => None,
    }
}
