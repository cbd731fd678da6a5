//! watch command - Refresh on an interval until interrupted

use std::time::Duration;

use anyhow::{bail, Context as _, Result};

use super::{build_engines, load_config, select_registries};
use crate::cli::Context;
use crate::engine::Scheduler;
use crate::ui::output;

/// Run the scheduler until Ctrl-C.
pub fn watch(ctx: &Context, interval_secs: Option<u64>) -> Result<()> {
    let config = load_config(ctx)?;
    let interval = match interval_secs {
        Some(0) => bail!("--interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => config.interval(),
    };
    let descriptors = select_registries(&config, &[])?;
    let rt = tokio::runtime::Runtime::new().context("Failed to start runtime")?;

    let ticks = rt.block_on(async {
        let engines = build_engines(&config, descriptors).await?;
        output::print(
            format!(
                "watching {} registries every {}s (Ctrl-C to stop)",
                engines.len(),
                interval.as_secs()
            ),
            ctx.verbosity,
        );

        let scheduler = Scheduler::new(engines, interval);
        let shutdown = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        Ok::<_, anyhow::Error>(scheduler.run_until(shutdown).await)
    })?;

    output::print(format!("stopped after {} refresh rounds", ticks), ctx.verbosity);
    Ok(())
}
