//! refresh command - Refresh registries once

use anyhow::{bail, Context as _, Result};

use super::{build_engines, load_config, select_registries};
use crate::cli::Context;
use crate::ui::output;

/// Refresh the selected registries one after another.
///
/// Every registry is attempted even when an earlier one fails.
pub fn refresh(ctx: &Context, only: &[String]) -> Result<()> {
    let config = load_config(ctx)?;
    let descriptors = select_registries(&config, only)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to start runtime")?;

    let (total, failed) = rt.block_on(async {
        let engines = build_engines(&config, descriptors).await?;
        let mut failed = Vec::new();
        for engine in &engines {
            let name = engine.descriptor().name.to_string();
            let outcome = engine.refresh().await;
            if outcome.is_success() {
                output::print(output::format_outcome(&name, &outcome), ctx.verbosity);
            } else {
                output::error(output::format_outcome(&name, &outcome));
                failed.push(name);
            }
        }
        Ok::<_, anyhow::Error>((engines.len(), failed))
    })?;

    if !failed.is_empty() {
        bail!(
            "{} of {} registries failed to refresh: {}",
            failed.len(),
            total,
            failed.join(", ")
        );
    }
    Ok(())
}
