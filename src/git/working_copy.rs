//! git::working_copy
//!
//! Local shallow mirror of one registry branch, implemented with git2.
//!
//! # Lifecycle
//!
//! Every refresh rebuilds the working copy from scratch:
//!
//! ```text
//! wipe -> clone (single branch, depth N, no checkout) -> fetch -> force checkout
//! ```
//!
//! There is no incremental diffing; the local directory is owned by the
//! refresh holding the registry's lock.
//!
//! # Deadlines
//!
//! libgit2 network calls have no timeout of their own. Each network step
//! installs a transfer-progress callback that aborts the transfer once the
//! configured deadline passes, which surfaces as [`SyncError::Timeout`].
//! Callers should additionally bound the blocking task (the engine wraps
//! every step in `tokio::time::timeout`), since a stalled connect never
//! reaches the progress callback.
//!
//! # Example
//!
//! ```ignore
//! use registry_mirror::git::WorkingCopy;
//!
//! let copy = WorkingCopy::new("/data/chain-registry", url, branch)
//!     .with_depth(1)
//!     .with_deadline(Duration::from_secs(300));
//! copy.update()?;
//! let tip = copy.latest_commit()?;
//! println!("mirrored {}", tip.oid.short(7));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions, RemoteCallbacks, Repository};
use thiserror::Error;

use crate::core::document::{CommitRecord, Signature};
use crate::core::types::{BranchName, Oid};

/// Default deadline for one network step.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

/// Git and working-copy failures.
///
/// Any of these aborts the refresh that hit it; there is no retry at this
/// layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The old working copy could not be removed.
    #[error("cannot remove working copy {path}: {source}")]
    Wipe {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The remote rejected our credentials or requires some.
    #[error("authentication failed for {url}: {message}")]
    Auth { url: String, message: String },

    /// Clone failed (unreachable remote, bad URL, missing branch).
    #[error("clone of {url} failed: {message}")]
    Clone { url: String, message: String },

    /// Fetch of the tracked branch failed.
    #[error("fetch of {branch} failed: {message}")]
    Fetch { branch: String, message: String },

    /// The tracked ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    /// Force checkout failed.
    #[error("checkout of {branch} failed: {message}")]
    Checkout { branch: String, message: String },

    /// A network step exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Opening the working copy or reading history failed.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl SyncError {
    fn internal(err: git2::Error) -> Self {
        SyncError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Handle to one registry's working copy.
///
/// Cheap to clone; holds no open repository, so it can move into
/// blocking tasks freely.
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    path: PathBuf,
    url: String,
    branch: BranchName,
    depth: u32,
    deadline: Duration,
}

impl WorkingCopy {
    /// Create a handle for `url`'s `branch` mirrored at `path`.
    ///
    /// Defaults to depth 1 and [`DEFAULT_DEADLINE`].
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>, branch: BranchName) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            branch,
            depth: 1,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Set the clone depth; 0 fetches full history.
    ///
    /// libgit2's local transport cannot serve shallow fetches, so `file://`
    /// remotes need depth 0.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the per-step network deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Root of the working copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tracked branch.
    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Per-step network deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Rebuild the working copy: wipe, clone, fetch, force checkout.
    pub fn update(&self) -> Result<(), SyncError> {
        self.wipe()?;
        self.clone_branch()?;
        self.fetch()?;
        self.checkout()
    }

    /// Recursively delete the working copy if present.
    pub fn wipe(&self) -> Result<(), SyncError> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SyncError::Wipe {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Single-branch clone into an empty path, skipping checkout.
    pub fn clone_branch(&self) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::Clone {
                url: self.url.clone(),
                message: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }

        let started = Instant::now();
        let refspec = self.refspec();

        let mut skip_checkout = CheckoutBuilder::new();
        skip_checkout.dry_run();

        let mut builder = RepoBuilder::new();
        builder
            .branch(self.branch.as_str())
            .fetch_options(self.fetch_options(started))
            .with_checkout(skip_checkout)
            .remote_create(|repo, name, url| repo.remote_with_fetch(name, url, &refspec));

        builder
            .clone(&self.url, &self.path)
            .map(|_| ())
            .map_err(|e| self.classify(e, started, "clone"))
    }

    /// Fetch the tracked branch into its remote-tracking ref.
    pub fn fetch(&self) -> Result<(), SyncError> {
        let repo = self.open()?;
        let mut remote = repo.find_remote("origin").map_err(SyncError::internal)?;

        let started = Instant::now();
        let mut options = self.fetch_options(started);
        remote
            .fetch(&[self.refspec()], Some(&mut options), None)
            .map_err(|e| self.classify(e, started, "fetch"))
    }

    /// Point the local branch at the remote tip and force-checkout it.
    pub fn checkout(&self) -> Result<(), SyncError> {
        let repo = self.open()?;
        let checkout_err = |e: git2::Error| SyncError::Checkout {
            branch: self.branch.to_string(),
            message: e.message().to_string(),
        };

        let tip = self.remote_tip(&repo)?;
        let local_ref = self.branch.local_ref();
        repo.reference(&local_ref, tip, true, "regmirror: checkout")
            .map_err(checkout_err)?;
        repo.set_head(&local_ref).map_err(checkout_err)?;

        let mut force = CheckoutBuilder::new();
        force.force();
        repo.checkout_head(Some(&mut force)).map_err(checkout_err)
    }

    // =========================================================================
    // Commit queries
    // =========================================================================

    /// The commit at the tip of the remote-tracking ref.
    pub fn latest_commit(&self) -> Result<CommitRecord, SyncError> {
        self.log(1)?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::RefNotFound {
                refname: self.branch.remote_ref(),
            })
    }

    /// Up to `count` commits of the remote-tracking ref, newest first.
    pub fn log(&self, count: usize) -> Result<Vec<CommitRecord>, SyncError> {
        let repo = self.open()?;
        let tip = self.remote_tip(&repo)?;

        let mut revwalk = repo.revwalk().map_err(SyncError::internal)?;
        revwalk
            .set_sorting(git2::Sort::TIME)
            .map_err(SyncError::internal)?;
        revwalk.push(tip).map_err(SyncError::internal)?;

        let mut records = Vec::with_capacity(count);
        for oid in revwalk.take(count) {
            let oid = oid.map_err(SyncError::internal)?;
            let commit = repo.find_commit(oid).map_err(SyncError::internal)?;
            records.push(commit_record(&commit)?);
        }
        Ok(records)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn open(&self) -> Result<Repository, SyncError> {
        Repository::open(&self.path).map_err(|e| SyncError::Internal {
            message: format!("cannot open {}: {}", self.path.display(), e.message()),
        })
    }

    fn refspec(&self) -> String {
        format!(
            "+{}:{}",
            self.branch.local_ref(),
            self.branch.remote_ref()
        )
    }

    fn remote_tip(&self, repo: &Repository) -> Result<git2::Oid, SyncError> {
        let refname = self.branch.remote_ref();
        repo.refname_to_id(&refname)
            .map_err(|_| SyncError::RefNotFound { refname })
    }

    fn fetch_options(&self, started: Instant) -> FetchOptions<'static> {
        let deadline = self.deadline;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(move |_| started.elapsed() < deadline);

        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks);
        if self.depth > 0 {
            options.depth(i32::try_from(self.depth).unwrap_or(i32::MAX));
        }
        options
    }

    fn classify(&self, err: git2::Error, started: Instant, operation: &'static str) -> SyncError {
        if started.elapsed() >= self.deadline {
            return SyncError::Timeout {
                operation,
                after: self.deadline,
            };
        }
        match (err.code(), operation) {
            (git2::ErrorCode::Auth, _) => SyncError::Auth {
                url: self.url.clone(),
                message: err.message().to_string(),
            },
            (_, "clone") => SyncError::Clone {
                url: self.url.clone(),
                message: err.message().to_string(),
            },
            _ => SyncError::Fetch {
                branch: self.branch.to_string(),
                message: err.message().to_string(),
            },
        }
    }
}

fn signature(sig: &git2::Signature<'_>) -> Signature {
    Signature {
        name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
    }
}

fn commit_record(commit: &git2::Commit<'_>) -> Result<CommitRecord, SyncError> {
    let oid = Oid::new(commit.id().to_string()).map_err(|e| SyncError::Internal {
        message: e.to_string(),
    })?;
    let author = commit.author();
    let timestamp = chrono::DateTime::<chrono::Utc>::from_timestamp(author.when().seconds(), 0)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);

    Ok(CommitRecord {
        oid,
        author: signature(&author),
        committer: signature(&commit.committer()),
        timestamp,
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        summary: commit.summary().unwrap_or("").to_string(),
    })
}
