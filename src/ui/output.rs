//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Human-facing output is formatted consistently and respects the quiet
//! flag. Diagnostics go through `tracing` instead (see [`super::logging`]).

use std::fmt::Display;

use crate::engine::{RefreshOutcome, RefreshReport};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default log filter directive for this verbosity.
    pub fn log_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of a successful refresh.
pub fn format_report(report: &RefreshReport) -> String {
    let mut line = format!(
        "{}: {} documents at {} ({})",
        report.registry,
        report.paths.len(),
        report.commit.oid.short(7),
        report.commit.summary
    );
    if !report.failed_directories.is_empty() {
        line.push_str(&format!(
            ", skipped: {}",
            report.failed_directories.join(", ")
        ));
    }
    line
}

/// One-line summary of a refresh outcome for `registry`.
pub fn format_outcome(registry: &str, outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Completed(report) => format_report(report),
        RefreshOutcome::Failed { stage, error } => {
            format!("{}: failed while {}: {}", registry, stage, error)
        }
    }
}
