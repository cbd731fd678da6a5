//! config command - Show where configuration comes from and what it says

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::ui::output;

/// Print the path of the configuration file in use.
pub fn path(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    match config.loaded_from() {
        Some(path) => println!("{}", path.display()),
        None => output::warn("no configuration file found; using defaults", ctx.verbosity),
    }
    Ok(())
}

/// Print the effective configuration as TOML.
///
/// Defaults that were not set in the file are filled in so the output shows
/// what a refresh would actually use.
pub fn show(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let mut effective = config.file.clone();
    effective.data_dir = Some(config.data_dir());

    let rendered =
        toml::to_string_pretty(&effective).context("Failed to render configuration")?;
    print!("{}", rendered);
    output::print(
        format!("# store: {:?}", config.store_backend()),
        ctx.verbosity,
    );
    output::print(
        format!("# interval: {}s", config.interval().as_secs()),
        ctx.verbosity,
    );
    Ok(())
}
