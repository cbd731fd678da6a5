//! engine::outcome
//!
//! Stages and results of a refresh attempt.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::RefreshError;
use crate::core::document::CommitRecord;
use crate::core::types::{Fingerprint, RegistryName};

/// Where a refresh attempt is in its pipeline.
///
/// An attempt walks these in declaration order and returns to `Idle`
/// whether it succeeds or fails. `PublishingMetadata` is skipped when no
/// metadata sink is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshStage {
    Idle,
    Locking,
    CloningWorkingCopy,
    Fetching,
    CheckingOut,
    FetchingAllowlist,
    ScanningDirectories,
    PublishingDocuments,
    PublishingIndex,
    PublishingMetadata,
    PublishingCommit,
    PublishingDescriptor,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStage::Idle => "idle",
            RefreshStage::Locking => "locking",
            RefreshStage::CloningWorkingCopy => "cloning working copy",
            RefreshStage::Fetching => "fetching",
            RefreshStage::CheckingOut => "checking out",
            RefreshStage::FetchingAllowlist => "fetching allowlist",
            RefreshStage::ScanningDirectories => "scanning directories",
            RefreshStage::PublishingDocuments => "publishing documents",
            RefreshStage::PublishingIndex => "publishing index",
            RefreshStage::PublishingMetadata => "publishing metadata",
            RefreshStage::PublishingCommit => "publishing commit",
            RefreshStage::PublishingDescriptor => "publishing descriptor",
        };
        f.write_str(name)
    }
}

/// Summary of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub registry: RegistryName,
    pub attempt_id: Uuid,
    /// Published directory names, in index order
    pub paths: Vec<String>,
    /// Tip commit the snapshot was built from
    pub commit: CommitRecord,
    /// Directories skipped under the isolate policy
    pub failed_directories: Vec<String>,
    /// Digest of the published documents
    pub fingerprint: Fingerprint,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of [`RegistrySyncEngine::refresh`](super::RegistrySyncEngine::refresh).
#[derive(Debug)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    Failed {
        /// Stage that was running when the error occurred
        stage: RefreshStage,
        error: RefreshError,
    },
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&RefreshReport> {
        match self {
            RefreshOutcome::Completed(report) => Some(report),
            RefreshOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RefreshError> {
        match self {
            RefreshOutcome::Completed(_) => None,
            RefreshOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// Failing stage, if any.
    pub fn failed_stage(&self) -> Option<RefreshStage> {
        match self {
            RefreshOutcome::Completed(_) => None,
            RefreshOutcome::Failed { stage, .. } => Some(*stage),
        }
    }
}
