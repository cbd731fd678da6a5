//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the configuration named by the context
//! 2. Builds engines or opens the store
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that touch the network or the store (refresh, watch, get) run
//! on a tokio runtime created by the handler; dispatch itself stays sync.

mod completion;
mod config_cmd;
mod get;
mod refresh;
mod watch;

pub use completion::completion;
pub use config_cmd::{path as config_path, show as config_show};
pub use get::get;
pub use refresh::refresh;
pub use watch::watch;

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};

use super::args::{Command, ConfigAction};
use super::Context;
use crate::allowlist::HttpAllowlistFetcher;
use crate::core::config::Config;
use crate::core::registry::RegistryDescriptor;
use crate::engine::RegistrySyncEngine;
use crate::store::open_store;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Refresh { registries } => refresh::refresh(ctx, &registries),
        Command::Watch { interval } => watch::watch(ctx, interval),
        Command::Get { key } => get::get(ctx, &key),
        Command::Config { action } => match action {
            ConfigAction::Path => config_cmd::path(ctx),
            ConfigAction::Show => config_cmd::show(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load the configuration named by the context.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    Config::load(ctx.config.as_deref()).context("Failed to load configuration")
}

/// Configured registries, narrowed to `only` when it is non-empty.
pub(crate) fn select_registries(config: &Config, only: &[String]) -> Result<Vec<RegistryDescriptor>> {
    let all = config.registries().context("Invalid registry configuration")?;
    if all.is_empty() {
        bail!("No registries configured. Add a [[registry]] section to the configuration file.");
    }
    if only.is_empty() {
        return Ok(all);
    }

    for name in only {
        if !all.iter().any(|d| d.name.as_str() == name) {
            bail!("Unknown registry '{}'", name);
        }
    }
    Ok(all
        .into_iter()
        .filter(|d| only.iter().any(|name| name == d.name.as_str()))
        .collect())
}

/// One engine per descriptor, sharing the store and allowlist client.
pub(crate) async fn build_engines(
    config: &Config,
    descriptors: Vec<RegistryDescriptor>,
) -> Result<Vec<Arc<RegistrySyncEngine>>> {
    let store = open_store(&config.store_backend())
        .await
        .context("Failed to open store")?;
    let allowlist = Arc::new(
        HttpAllowlistFetcher::new(config.allowlist_settings())
            .context("Failed to build allowlist client")?,
    );
    let settings = config.engine_settings();

    Ok(descriptors
        .into_iter()
        .map(|descriptor| {
            Arc::new(
                RegistrySyncEngine::new(descriptor, Arc::clone(&store), allowlist.clone())
                    .with_settings(settings.clone()),
            )
        })
        .collect())
}
