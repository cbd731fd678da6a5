//! get command - Print a stored value

use anyhow::{bail, Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::store::open_store;

/// Print the JSON stored under `key`.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = load_config(ctx)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to start runtime")?;

    let value = rt.block_on(async {
        let store = open_store(&config.store_backend())
            .await
            .context("Failed to open store")?;
        store
            .get_json(key)
            .await
            .with_context(|| format!("Failed to read '{}'", key))
    })?;

    match value {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => bail!("No value stored under '{}'", key),
    }
}
