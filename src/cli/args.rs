//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// regmirror - mirror git-backed chain registries into a key-value store
#[derive(Parser, Debug)]
#[command(name = "regmirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (overrides $REGMIRROR_CONFIG and the default locations)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; only warnings and errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh configured registries once
    #[command(
        name = "refresh",
        long_about = "Refresh configured registries once.\n\n\
            Each registry's working copy is re-cloned at the tracked branch, its chain \
            directories are filtered and aggregated into one JSON document each, and the \
            documents, the path index, the latest commit and the repository descriptor \
            are written to the configured store.\n\n\
            A failed registry keeps its previous snapshot. The command exits non-zero \
            if any registry failed.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Refresh every configured registry
    regmirror refresh

    # Refresh a single registry
    regmirror refresh --registry chain-registry

    # Use a specific configuration file
    regmirror --config ./mirror.toml refresh"
    )]
    Refresh {
        /// Only refresh these registries (by name)
        #[arg(long = "registry", value_name = "NAME")]
        registries: Vec<String>,
    },

    /// Refresh on a fixed interval until interrupted
    #[command(
        name = "watch",
        long_about = "Refresh every configured registry immediately, then on a fixed \
            interval, until interrupted with Ctrl-C.\n\n\
            A refresh in progress is allowed to finish before the process exits.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Use the configured interval ([sync] interval_secs, default 900)
    regmirror watch

    # Refresh every five minutes
    regmirror watch --interval 300"
    )]
    Watch {
        /// Seconds between refreshes (overrides the configured interval)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },

    /// Print a stored value as JSON
    #[command(
        name = "get",
        long_about = "Print the JSON value stored under a key.\n\n\
            Keys are '<registry>:<chain>' for chain documents, '<registry>:paths' for \
            the index, '<registry>:commit' for the latest commit and \
            '<registry>:repository' for the repository descriptor.",
        after_help = "\
WORKFLOW EXAMPLES:
    # List published chains
    regmirror get chain-registry:paths

    # Inspect one chain document
    regmirror get chain-registry:osmosis

    # Which commit is mirrored?
    regmirror get chain-registry:commit"
    )]
    Get {
        /// Store key
        key: String,
    },

    /// Inspect configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for regmirror commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    regmirror completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    regmirror completion zsh >> ~/.zshrc

    # Fish
    regmirror completion fish > ~/.config/fish/completions/regmirror.fish

    # PowerShell
    regmirror completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the path of the configuration file in use
    Path,
    /// Print the effective configuration
    Show,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
