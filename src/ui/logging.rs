//! ui::logging
//!
//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins when set; otherwise the level follows the CLI verbosity
//! (`warn` with `--quiet`, `debug` with `--debug`, `info` by default). Logs
//! go to stderr so command output on stdout stays clean.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::output::Verbosity;

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the filter
/// directive is invalid.
pub fn init(verbosity: Verbosity) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(verbosity.log_directive()))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity == Verbosity::Debug)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
