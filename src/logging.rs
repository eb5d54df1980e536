//! logging
//!
//! Diagnostic logging setup.
//!
//! # Design
//!
//! Library code logs through `tracing` macros with structured fields. The
//! binary installs a `tracing-subscriber` fmt layer writing to stderr, so
//! stdout stays reserved for command output.
//!
//! `RUST_LOG` takes precedence over the level derived from the CLI flags.

use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity setting.
pub fn default_filter(debug: bool, quiet: bool) -> &'static str {
    if debug {
        "tokenreg=debug,info"
    } else if quiet {
        "tokenreg=error,error"
    } else {
        "tokenreg=info,warn"
    }
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(debug: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
