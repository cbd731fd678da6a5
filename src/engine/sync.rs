//! engine::sync
//!
//! The per-registry refresh orchestrator.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::Instrument;
use uuid::Uuid;

use super::error::RefreshError;
use super::outcome::{RefreshOutcome, RefreshReport, RefreshStage};
use super::settings::{DirectoryFailurePolicy, EngineSettings};
use crate::aggregate::{build_document_async, Candidate, DirectoryAggregator};
use crate::allowlist::{Allowlist, AllowlistFetcher};
use crate::core::document::ChainDocument;
use crate::core::lock::{RefreshLock, WorkingCopyLock};
use crate::core::registry::RegistryDescriptor;
use crate::core::types::Fingerprint;
use crate::git::{SyncError, WorkingCopy};
use crate::publish::{MetadataSink, SnapshotPublisher};
use crate::report::{ErrorReporter, TracingReporter};
use crate::store::DocumentStore;

/// Slack on top of the git deadline before the blocking task is abandoned.
/// Capped at the deadline itself.
const BLOCKING_GRACE: Duration = Duration::from_secs(5);

/// Mirrors one registry into the store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use registry_mirror::allowlist::StaticAllowlist;
/// use registry_mirror::core::registry::RegistryDescriptor;
/// use registry_mirror::core::types::{BranchName, RegistryName};
/// use registry_mirror::engine::RegistrySyncEngine;
/// use registry_mirror::store::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let descriptor = RegistryDescriptor::new(
///     RegistryName::new("chain-registry").unwrap(),
///     "https://github.com/cosmos/chain-registry",
///     BranchName::new("master").unwrap(),
///     "/var/lib/regmirror/chain-registry",
/// );
/// let engine = RegistrySyncEngine::new(
///     descriptor,
///     Arc::new(MemoryStore::new()),
///     Arc::new(StaticAllowlist::default()),
/// );
///
/// let outcome = engine.refresh().await;
/// println!("success: {}", outcome.is_success());
/// # });
/// ```
pub struct RegistrySyncEngine {
    descriptor: RegistryDescriptor,
    store: Arc<dyn DocumentStore>,
    allowlist: Arc<dyn AllowlistFetcher>,
    reporter: Arc<dyn ErrorReporter>,
    metadata: Option<Arc<dyn MetadataSink>>,
    settings: EngineSettings,
}

impl std::fmt::Debug for RegistrySyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySyncEngine")
            .field("registry", &self.descriptor.name)
            .field("store", &self.store.name())
            .field("allowlist", &self.allowlist.name())
            .field("has_metadata_sink", &self.metadata.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl RegistrySyncEngine {
    /// Create an engine with default settings that reports through tracing.
    pub fn new(
        descriptor: RegistryDescriptor,
        store: Arc<dyn DocumentStore>,
        allowlist: Arc<dyn AllowlistFetcher>,
    ) -> Self {
        Self {
            descriptor,
            store,
            allowlist,
            reporter: Arc::new(TracingReporter),
            metadata: None,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_metadata_sink(mut self, sink: Arc<dyn MetadataSink>) -> Self {
        self.metadata = Some(sink);
        self
    }

    pub fn descriptor(&self) -> &RegistryDescriptor {
        &self.descriptor
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one refresh, catching every failure.
    ///
    /// A failure is reported to the error reporter tagged with the registry
    /// name, logged, and returned as [`RefreshOutcome::Failed`]. The
    /// previously published snapshot stays in the store.
    pub async fn refresh(&self) -> RefreshOutcome {
        let attempt_id = Uuid::new_v4();
        let mut stage = RefreshStage::Idle;

        match self.attempt(attempt_id, &mut stage).await {
            Ok(report) => RefreshOutcome::Completed(report),
            Err(error) => {
                self.reporter.notify(&error, self.descriptor.name.as_str());
                tracing::warn!(
                    registry = %self.descriptor.name,
                    attempt = %attempt_id,
                    stage = %stage,
                    "failed to update registry"
                );
                RefreshOutcome::Failed { stage, error }
            }
        }
    }

    /// Run one refresh and return its error instead of reporting it.
    pub async fn try_refresh(&self) -> Result<RefreshReport, RefreshError> {
        let mut stage = RefreshStage::Idle;
        self.attempt(Uuid::new_v4(), &mut stage).await
    }

    async fn attempt(
        &self,
        attempt_id: Uuid,
        stage: &mut RefreshStage,
    ) -> Result<RefreshReport, RefreshError> {
        let span = tracing::info_span!(
            "refresh",
            registry = %self.descriptor.name,
            attempt = %attempt_id
        );
        async move {
            let _serial = RefreshLock::acquire(&self.descriptor.name).await;
            let result = self.run(attempt_id, &mut *stage).await;
            if result.is_ok() {
                *stage = RefreshStage::Idle;
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        attempt_id: Uuid,
        stage: &mut RefreshStage,
    ) -> Result<RefreshReport, RefreshError> {
        let started_at = Utc::now();
        let descriptor = &self.descriptor;
        tracing::info!(url = %descriptor.source_url, branch = %descriptor.branch, "updating repository");

        enter(stage, RefreshStage::Locking);
        let lock = Arc::new(WorkingCopyLock::acquire(&descriptor.lock_path())?);

        let copy = WorkingCopy::new(
            descriptor.local_path.clone(),
            descriptor.source_url.clone(),
            descriptor.branch.clone(),
        )
        .with_depth(self.settings.depth)
        .with_deadline(self.settings.git_timeout);

        enter(stage, RefreshStage::CloningWorkingCopy);
        self.git_step("clone", &copy, &lock, |c| {
            c.wipe()?;
            c.clone_branch()
        })
        .await?;

        enter(stage, RefreshStage::Fetching);
        self.git_step("fetch", &copy, &lock, WorkingCopy::fetch).await?;

        enter(stage, RefreshStage::CheckingOut);
        self.git_step("checkout", &copy, &lock, WorkingCopy::checkout).await?;

        enter(stage, RefreshStage::FetchingAllowlist);
        let allowlist = if descriptor.allowlist_policy.requires_allowlist() {
            let entries = self.allowlist.fetch().await?;
            tracing::info!(source = self.allowlist.name(), entries = entries.len(), "fetched allowlist");
            Some(Allowlist::new(entries))
        } else {
            None
        };

        enter(stage, RefreshStage::ScanningDirectories);
        let candidates = {
            let descriptor = descriptor.clone();
            tokio::task::spawn_blocking(move || {
                DirectoryAggregator::new(&descriptor).eligible(allowlist.as_ref())
            })
            .await
            .map_err(|e| RefreshError::join("scan", e))??
        };

        enter(stage, RefreshStage::PublishingDocuments);
        let publisher = SnapshotPublisher::new(Arc::clone(&self.store), descriptor);
        let (documents, failed_directories) = self.publish_documents(&publisher, candidates).await?;
        tracing::info!(
            published = documents.len(),
            failed = failed_directories.len(),
            "published documents"
        );

        enter(stage, RefreshStage::PublishingIndex);
        publisher.publish_index(&documents).await?;

        if let Some(sink) = &self.metadata {
            enter(stage, RefreshStage::PublishingMetadata);
            publisher.publish_metadata(sink.as_ref(), &documents).await?;
        }

        enter(stage, RefreshStage::PublishingCommit);
        let commit = self.git_step("log", &copy, &lock, WorkingCopy::latest_commit).await?;
        publisher.publish_commit(&commit).await?;

        enter(stage, RefreshStage::PublishingDescriptor);
        publisher.publish_descriptor().await?;

        let report = RefreshReport {
            registry: descriptor.name.clone(),
            attempt_id,
            paths: documents.iter().map(|d| d.path().to_string()).collect(),
            fingerprint: Fingerprint::compute(&documents),
            commit,
            failed_directories,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            commit = report.commit.oid.short(7),
            documents = report.paths.len(),
            fingerprint = %report.fingerprint,
            "updated registry"
        );
        Ok(report)
    }

    /// Build each candidate, then write the documents one at a time.
    ///
    /// Up to `concurrency` directories are read ahead, but writes follow
    /// candidate order, so under [`DirectoryFailurePolicy::Abort`] no
    /// directory after the failing one is ever written. A document whose path
    /// is already in the snapshot replaces the earlier one in place.
    async fn publish_documents(
        &self,
        publisher: &SnapshotPublisher<'_>,
        candidates: Vec<Candidate>,
    ) -> Result<(Vec<ChainDocument>, Vec<String>), RefreshError> {
        let built = stream::iter(candidates)
            .map(|candidate| async move {
                let name = candidate.name.clone();
                (name, build_document_async(candidate).await)
            })
            .buffered(self.settings.concurrency.max(1));
        let mut built = std::pin::pin!(built);

        let mut documents: Vec<ChainDocument> = Vec::new();
        let mut failed = Vec::new();
        while let Some((name, result)) = built.next().await {
            let written = match result {
                Ok(document) => publisher
                    .publish_document(&document)
                    .await
                    .map(|()| document)
                    .map_err(RefreshError::from),
                Err(err) => Err(err.into()),
            };
            match written {
                Ok(document) => {
                    match documents.iter_mut().find(|d| d.path() == document.path()) {
                        Some(existing) => *existing = document,
                        None => documents.push(document),
                    }
                }
                Err(err) => match self.settings.on_directory_failure {
                    DirectoryFailurePolicy::Abort => return Err(err),
                    DirectoryFailurePolicy::Isolate => {
                        self.reporter.notify(&err, self.descriptor.name.as_str());
                        tracing::warn!(dir = %name, error = %err, "skipping directory");
                        failed.push(name);
                    }
                },
            }
        }
        Ok((documents, failed))
    }

    /// Run a blocking git step under the configured deadline.
    ///
    /// The step owns a share of the working-copy lock. A step that outlives
    /// its deadline keeps the lock file held until its thread exits.
    async fn git_step<T, F>(
        &self,
        operation: &'static str,
        copy: &WorkingCopy,
        lock: &Arc<WorkingCopyLock>,
        step: F,
    ) -> Result<T, RefreshError>
    where
        T: Send + 'static,
        F: FnOnce(&WorkingCopy) -> Result<T, SyncError> + Send + 'static,
    {
        let copy = copy.clone();
        let deadline = copy.deadline();
        let held = Arc::clone(lock);
        let task = tokio::task::spawn_blocking(move || {
            let _held = held;
            step(&copy)
        });

        match tokio::time::timeout(deadline + BLOCKING_GRACE.min(deadline), task).await {
            Ok(joined) => Ok(joined.map_err(|e| RefreshError::join(operation, e))??),
            Err(_) => {
                tracing::warn!(
                    operation,
                    lock = %lock.path().display(),
                    "git step abandoned; working copy stays locked until it exits"
                );
                Err(SyncError::Timeout {
                    operation,
                    after: deadline,
                }
                .into())
            }
        }
    }
}

fn enter(stage: &mut RefreshStage, next: RefreshStage) {
    tracing::debug!(from = %stage, to = %next, "stage");
    *stage = next;
}
