//! ui
//!
//! User-facing output and log setup.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//! - [`logging`] - Tracing subscriber installation
//!
//! # Design
//!
//! All human-facing output goes through this module so the quiet flag is
//! honored consistently. Diagnostics use `tracing` and land on stderr.

pub mod logging;
pub mod output;
