//! engine
//!
//! Orchestrates a registry refresh: update the working copy, then load and
//! publish its documents.
//!
//! # Architecture
//!
//! [`RegistrySyncEngine`] owns one registry and runs its pipeline
//! sequentially:
//!
//! ```text
//! Locking -> CloningWorkingCopy -> Fetching -> CheckingOut
//!   -> FetchingAllowlist -> ScanningDirectories -> PublishingDocuments
//!   -> PublishingIndex -> [PublishingMetadata] -> PublishingCommit
//!   -> PublishingDescriptor -> Idle
//! ```
//!
//! Any failure moves the attempt straight back to `Idle`. Documents are the
//! only fan-out point: each eligible directory is built and written in one
//! task, with at most `concurrency` tasks in flight.
//!
//! # Invariants
//!
//! - [`RegistrySyncEngine::refresh`] never returns an error or panics on a
//!   pipeline failure; failures are reported once, tagged with the registry
//!   name, and returned as [`RefreshOutcome::Failed`]
//! - Refreshes of the same registry never overlap
//! - Nothing is written to the store before the allowlist is fetched
//! - Documents and the index are written before the commit and descriptor
//!
//! # Example
//!
//! ```ignore
//! use registry_mirror::engine::{RegistrySyncEngine, Scheduler};
//!
//! let engines = descriptors
//!     .into_iter()
//!     .map(|d| Arc::new(RegistrySyncEngine::new(d, store.clone(), allowlist.clone())))
//!     .collect();
//! Scheduler::new(engines, config.interval())
//!     .run_until(tokio::signal::ctrl_c().map(|_| ()))
//!     .await;
//! ```

mod error;
mod outcome;
pub mod scheduler;
mod settings;
mod sync;

pub use error::RefreshError;
pub use outcome::{RefreshOutcome, RefreshReport, RefreshStage};
pub use scheduler::Scheduler;
pub use settings::{DirectoryFailurePolicy, EngineSettings, DEFAULT_CONCURRENCY, DEFAULT_GIT_TIMEOUT};
pub use sync::RegistrySyncEngine;
