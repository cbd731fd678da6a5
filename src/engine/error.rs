//! engine::error
//!
//! Top-level refresh error.

use std::path::PathBuf;

use thiserror::Error;

use crate::aggregate::FilesystemError;
use crate::allowlist::AllowlistError;
use crate::core::lock::LockError;
use crate::git::SyncError;
use crate::publish::{MetadataError, PublishError};

/// Why a refresh attempt failed.
///
/// Each variant wraps the error of the component that failed; nothing is
/// retried at this level.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("allowlist unavailable: {0}")]
    Allowlist(#[from] AllowlistError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Another process holds the working-copy lock.
    #[error("working copy is locked by another process: {0}")]
    Locked(PathBuf),

    /// The lock file could not be created or locked.
    #[error(transparent)]
    Lock(LockError),

    /// A blocking task panicked or was cancelled.
    #[error("{operation} task failed: {message}")]
    Join {
        operation: &'static str,
        message: String,
    },
}

impl RefreshError {
    /// Short category name for logs and reports.
    pub fn category(&self) -> &'static str {
        match self {
            RefreshError::Sync(_) => "sync",
            RefreshError::Allowlist(_) => "allowlist",
            RefreshError::Filesystem(_) => "filesystem",
            RefreshError::Publish(_) => "publish",
            RefreshError::Metadata(_) => "metadata",
            RefreshError::Locked(_) | RefreshError::Lock(_) => "lock",
            RefreshError::Join { .. } => "join",
        }
    }

    pub(crate) fn join(operation: &'static str, err: tokio::task::JoinError) -> Self {
        RefreshError::Join {
            operation,
            message: err.to_string(),
        }
    }
}

impl From<LockError> for RefreshError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AlreadyLocked(path) => RefreshError::Locked(path),
            other => RefreshError::Lock(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_locked_maps_to_locked() {
        let err: RefreshError = LockError::AlreadyLocked(PathBuf::from("/data/r.lock")).into();
        assert!(matches!(err, RefreshError::Locked(_)));
        assert_eq!(err.category(), "lock");
        assert!(err.to_string().contains("/data/r.lock"));
    }

    #[test]
    fn other_lock_errors_wrap() {
        let err: RefreshError = LockError::CreateFailed("denied".into()).into();
        assert!(matches!(err, RefreshError::Lock(_)));
    }

    #[test]
    fn categories() {
        let err: RefreshError = AllowlistError::Timeout.into();
        assert_eq!(err.category(), "allowlist");
        assert!(err.to_string().contains("timed out"));

        let err: RefreshError = FilesystemError::DocumentBuild {
            dir: "osmosis".into(),
            message: "gone".into(),
        }
        .into();
        assert_eq!(err.category(), "filesystem");

        let err: RefreshError = MetadataError("boom".into()).into();
        assert_eq!(err.category(), "metadata");
    }
}
