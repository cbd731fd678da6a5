//! cli
//!
//! Command-line interface layer for regmirror.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, loads the
//! configuration and hands registries to the [`crate::engine`]. Nothing here
//! touches the store or a working copy directly.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::Result;

use crate::ui::{logging, output::Verbosity};

/// Execution context derived from global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit configuration file, if given
    pub config: Option<PathBuf>,
    /// Output verbosity
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        config: cli.config.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    // A subscriber may already be installed when embedded; keep going.
    if let Err(err) = logging::init(ctx.verbosity) {
        if ctx.verbosity == Verbosity::Debug {
            eprintln!("logging not initialized: {}", err);
        }
    }

    commands::dispatch(cli.command, &ctx)
}
