//! core::lock
//!
//! Exclusive ownership of a registry's working copy.
//!
//! # Architecture
//!
//! A refresh wipes and recreates the working-copy directory, so two
//! refreshes of the same registry must never overlap. Ownership is enforced
//! at two levels:
//!
//! - [`RefreshLock::acquire`] serializes refreshes inside this process. It is
//!   an async mutex keyed by registry name, so a timer-driven refresh and a
//!   manual one queue up behind each other instead of racing.
//! - [`WorkingCopyLock`] is an OS-level exclusive lock (via `fs2`) on
//!   `<local_path>.lock`, held for the whole attempt and by any git step
//!   still running after it. It keeps a second process off the same
//!   directory and fails fast rather than waiting.
//!
//! # Invariants
//!
//! - Both locks are released on drop (RAII pattern)
//! - The file lock is non-blocking
//! - The lock file lives beside the working copy, never inside it, so the
//!   wipe at the start of a refresh cannot delete it
//!
//! # Example
//!
//! ```ignore
//! use registry_mirror::core::lock::{RefreshLock, WorkingCopyLock};
//!
//! let _serial = RefreshLock::acquire(&descriptor.name).await;
//! let _lock = WorkingCopyLock::acquire(&descriptor.lock_path())?;
//! // ... wipe, clone, publish ...
//! ```

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use fs2::FileExt;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use super::types::RegistryName;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("working copy is locked by another process: {0}")]
    AlreadyLocked(PathBuf),

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive OS-level lock on a working-copy lock file.
///
/// The lock is released when the value is dropped. A refresh shares it
/// (behind an `Arc`) with every blocking git task it starts, so the file
/// stays locked until the last task touching the working copy has exited.
#[derive(Debug)]
pub struct WorkingCopyLock {
    path: PathBuf,
    file: File,
}

impl WorkingCopyLock {
    /// Attempt to acquire the lock at `path`.
    ///
    /// Creates the parent directory and the lock file if needed.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another holder has the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path: path.to_path_buf(),
                file,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(LockError::AlreadyLocked(path.to_path_buf()))
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopyLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

type RefreshMutex = Arc<tokio::sync::Mutex<()>>;

fn refresh_mutexes() -> &'static Mutex<HashMap<RegistryName, RefreshMutex>> {
    static MUTEXES: OnceLock<Mutex<HashMap<RegistryName, RefreshMutex>>> = OnceLock::new();
    MUTEXES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// In-process single-flight guard for one registry.
///
/// Holding a `RefreshLock` means no other refresh of the same registry is
/// running in this process. Waiters are served in FIFO order.
#[derive(Debug)]
pub struct RefreshLock {
    _guard: OwnedMutexGuard<()>,
}

impl RefreshLock {
    /// Wait until no other refresh of `registry` is in flight.
    pub async fn acquire(registry: &RegistryName) -> Self {
        let mutex = {
            let mut map = refresh_mutexes()
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            map.entry(registry.clone()).or_default().clone()
        };
        Self {
            _guard: mutex.lock_owned().await,
        }
    }
}
