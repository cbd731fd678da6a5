//! git
//!
//! Single doorway for all Git operations.
//!
//! # Architecture
//!
//! Only this module imports `git2`. The rest of the crate sees a
//! [`WorkingCopy`] handle that can rebuild a registry's local mirror and
//! report its tip commit, with strongly typed results
//! ([`CommitRecord`](crate::core::document::CommitRecord)).
//!
//! All operations are blocking. Async callers run them on the blocking
//! pool (`tokio::task::spawn_blocking`).
//!
//! # Invariants
//!
//! - The working copy is wiped before every clone
//! - Only the tracked branch is fetched
//! - Commit queries read `refs/remotes/origin/<branch>`, never `HEAD`

mod working_copy;

pub use working_copy::{SyncError, WorkingCopy, DEFAULT_DEADLINE};
