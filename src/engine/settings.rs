//! engine::settings
//!
//! Tunables of the refresh pipeline.

use std::time::Duration;

/// Default bound on directories processed at once.
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Default deadline per git network step.
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// What a failed directory does to the rest of a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryFailurePolicy {
    /// Fail the refresh. Documents already written stay written; the index,
    /// commit and descriptor keep their previous values.
    #[default]
    Abort,
    /// Skip the directory, publish the rest, and list it in the report.
    Isolate,
}

/// Refresh pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Maximum directories read ahead at once (at least 1). Writes stay
    /// sequential in candidate order.
    pub concurrency: usize,
    /// Clone depth; 0 fetches full history
    pub depth: u32,
    /// Deadline per git network step
    pub git_timeout: Duration,
    pub on_directory_failure: DirectoryFailurePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            depth: 1,
            git_timeout: DEFAULT_GIT_TIMEOUT,
            on_directory_failure: DirectoryFailurePolicy::Abort,
        }
    }
}
