//! allowlist::fixed
//!
//! In-memory allowlist for tests and offline runs.
//!
//! # Example
//!
//! ```
//! use registry_mirror::allowlist::{AllowlistEntry, AllowlistFetcher, StaticAllowlist};
//! use registry_mirror::core::registry::NetworkType;
//!
//! # tokio_test::block_on(async {
//! let allowlist = StaticAllowlist::new([AllowlistEntry::new("cosmoshub", NetworkType::Mainnet)]);
//! let entries = allowlist.fetch().await.unwrap();
//! assert_eq!(entries.len(), 1);
//! assert_eq!(allowlist.fetch_count(), 1);
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{AllowlistEntry, AllowlistError, AllowlistFetcher};

/// Fixed allowlist with optional failure injection.
///
/// Clones share state, so a test can keep a handle while the engine owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct StaticAllowlist {
    inner: Arc<Mutex<StaticInner>>,
}

#[derive(Debug, Default)]
struct StaticInner {
    entries: Vec<AllowlistEntry>,
    fail_with: Option<AllowlistError>,
    fetches: usize,
}

impl StaticAllowlist {
    pub fn new(entries: impl IntoIterator<Item = AllowlistEntry>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StaticInner {
                entries: entries.into_iter().collect(),
                ..Default::default()
            })),
        }
    }

    /// Make every subsequent fetch fail with `err`.
    pub fn fail_with(&self, err: AllowlistError) {
        self.lock().fail_with = Some(err);
    }

    /// Clear injected failures.
    pub fn clear_failure(&self) {
        self.lock().fail_with = None;
    }

    /// Replace the served entries.
    pub fn set_entries(&self, entries: impl IntoIterator<Item = AllowlistEntry>) {
        self.lock().entries = entries.into_iter().collect();
    }

    /// How many times `fetch` has been called.
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StaticInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AllowlistFetcher for StaticAllowlist {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<AllowlistEntry>, AllowlistError> {
        let mut inner = self.lock();
        inner.fetches += 1;
        match &inner.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(inner.entries.clone()),
        }
    }
}
