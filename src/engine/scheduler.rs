//! engine::scheduler
//!
//! Periodic refresh of every configured registry.
//!
//! Registries of one tick are refreshed one after another. Ticks use
//! [`MissedTickBehavior::Delay`], so a refresh that overruns the interval
//! pushes the next tick back instead of causing a burst of catch-up runs.
//! Shutdown is observed between ticks; an in-flight refresh is never
//! cancelled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::outcome::RefreshOutcome;
use super::sync::RegistrySyncEngine;

/// Drives a set of engines on a fixed interval.
#[derive(Debug, Clone)]
pub struct Scheduler {
    engines: Vec<Arc<RegistrySyncEngine>>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(engines: Vec<Arc<RegistrySyncEngine>>, interval: Duration) -> Self {
        Self { engines, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn engines(&self) -> &[Arc<RegistrySyncEngine>] {
        &self.engines
    }

    /// Refresh every registry once, in order.
    pub async fn tick(&self) -> Vec<RefreshOutcome> {
        let mut outcomes = Vec::with_capacity(self.engines.len());
        for engine in &self.engines {
            outcomes.push(engine.refresh().await);
        }
        outcomes
    }

    /// Tick immediately, then every interval, until `shutdown` completes.
    ///
    /// Returns the number of ticks run.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = std::pin::pin!(shutdown);

        let mut ticks = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let outcomes = self.tick().await;
                    ticks += 1;
                    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
                    tracing::info!(
                        tick = ticks,
                        registries = outcomes.len(),
                        failed,
                        "scheduled refresh finished"
                    );
                }
            }
        }
        tracing::info!(ticks, "scheduler stopped");
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::StaticAllowlist;
    use crate::core::registry::RegistryDescriptor;
    use crate::core::types::{BranchName, RegistryName};
    use crate::report::RecordingReporter;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    fn unreachable_engine(temp: &TempDir, name: &str, reporter: &RecordingReporter) -> Arc<RegistrySyncEngine> {
        let descriptor = RegistryDescriptor::new(
            RegistryName::new(name).unwrap(),
            temp.path().join("no-such-remote").display().to_string(),
            BranchName::new("master").unwrap(),
            temp.path().join(name),
        );
        Arc::new(
            RegistrySyncEngine::new(
                descriptor,
                Arc::new(MemoryStore::new()),
                Arc::new(StaticAllowlist::default()),
            )
            .with_reporter(Arc::new(reporter.clone())),
        )
    }

    #[tokio::test]
    async fn tick_refreshes_each_registry_in_order() {
        let temp = TempDir::new().unwrap();
        let reporter = RecordingReporter::new();
        let scheduler = Scheduler::new(
            vec![
                unreachable_engine(&temp, "sched-first", &reporter),
                unreachable_engine(&temp, "sched-second", &reporter),
            ],
            Duration::from_secs(60),
        );

        let outcomes = scheduler.tick().await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.is_success()));

        let contexts: Vec<_> = reporter.reports().into_iter().map(|r| r.context).collect();
        assert_eq!(contexts, vec!["sched-first", "sched-second"]);
    }

    #[tokio::test]
    async fn immediate_shutdown_runs_no_tick() {
        let scheduler = Scheduler::new(Vec::new(), Duration::from_secs(60));
        let ticks = scheduler.run_until(std::future::ready(())).await;
        assert_eq!(ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_until_shutdown() {
        let scheduler = Scheduler::new(Vec::new(), Duration::from_secs(10));
        let ticks = scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(25)))
            .await;
        // t = 0, 10, 20
        assert_eq!(ticks, 3);
    }
}
