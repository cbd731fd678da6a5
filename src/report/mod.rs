//! report
//!
//! Error sink for failed refreshes.
//!
//! # Design
//!
//! The engine catches every refresh failure once and hands it to an
//! [`ErrorReporter`] together with a context tag (the registry name).
//! [`TracingReporter`] forwards to the log; an external error tracker can
//! be plugged in by implementing the trait. [`RecordingReporter`] keeps
//! reports in memory for tests.

use std::sync::{Arc, Mutex};

use crate::engine::RefreshError;

/// Receiver of refresh failures.
pub trait ErrorReporter: Send + Sync {
    /// Record `error`, tagged with `context`.
    fn notify(&self, error: &RefreshError, context: &str);
}

/// Reports failures as `error`-level log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn notify(&self, error: &RefreshError, context: &str) {
        tracing::error!(
            registry = context,
            category = error.category(),
            error = %error,
            "refresh failed"
        );
    }
}

/// One captured report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub context: String,
    pub category: &'static str,
    pub message: String,
}

/// In-memory reporter; clones share the captured list.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports captured so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn notify(&self, error: &RefreshError, context: &str) {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Report {
                context: context.to_string(),
                category: error.category(),
                message: error.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::AllowlistError;

    #[test]
    fn recording_reporter_captures_context() {
        let reporter = RecordingReporter::new();
        let handle = reporter.clone();

        reporter.notify(&AllowlistError::Timeout.into(), "chain-registry");

        let reports = handle.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context, "chain-registry");
        assert_eq!(reports[0].category, "allowlist");
        assert!(reports[0].message.contains("timed out"));
    }

    #[test]
    fn tracing_reporter_does_not_panic() {
        TracingReporter.notify(&AllowlistError::Malformed("x".into()).into(), "r");
    }
}
