//! store::memory
//!
//! In-process document store for tests and dry runs.
//!
//! # Example
//!
//! ```
//! use registry_mirror::store::{DocumentStore, MemoryStore};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.set_json("chain-registry:paths", &json!(["cosmoshub"])).await.unwrap();
//!
//! assert_eq!(
//!     store.get_json("chain-registry:paths").await.unwrap(),
//!     Some(json!(["cosmoshub"]))
//! );
//! assert_eq!(store.writes(), vec!["chain-registry:paths".to_string()]);
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{DocumentStore, StoreError};

/// Map-backed store.
///
/// Clones share state. Writes are recorded in order so tests can assert
/// publication order, and individual keys can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: BTreeMap<String, Value>,
    writes: Vec<String>,
    fail_on: BTreeSet<String>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `key` fail.
    pub fn fail_on_key(&self, key: impl Into<String>) {
        self.lock().fail_on.insert(key.into());
    }

    /// Make every operation fail as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Clear injected failures.
    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.fail_on.clear();
        inner.unavailable = false;
    }

    /// Keys written so far, in write order (repeats included).
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Forget the write log, keeping values.
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Copy of every stored value.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.lock().values.clone()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.lock().values.keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn set_json(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store marked down".into()));
        }
        if inner.fail_on.contains(key) {
            return Err(StoreError::Write {
                key: key.to_string(),
                message: "injected failure".into(),
            });
        }
        inner.values.insert(key.to_string(), value.clone());
        inner.writes.push(key.to_string());
        Ok(())
    }

    async fn get_json(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store marked down".into()));
        }
        Ok(inner.values.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_replaces_value() {
        let store = MemoryStore::new();
        store.set_json("r:a", &json!({"v": 1})).await.unwrap();
        store.set_json("r:a", &json!({"w": 2})).await.unwrap();

        assert_eq!(store.get_json("r:a").await.unwrap(), Some(json!({"w": 2})));
        assert_eq!(store.writes(), vec!["r:a", "r:a"]);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get_json("r:nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_key_failure_leaves_old_value() {
        let store = MemoryStore::new();
        store.set_json("r:b", &json!("old")).await.unwrap();
        store.fail_on_key("r:b");

        let err = store.set_json("r:b", &json!("new")).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.get_json("r:b").await.unwrap(), Some(json!("old")));

        store.clear_failures();
        store.set_json("r:b", &json!("new")).await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_fails_everything() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.get_json("r:a").await.is_err());
        assert!(store.set_json("r:a", &json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.set_json("r:a", &json!(1)).await.unwrap();
        assert_eq!(handle.keys(), vec!["r:a"]);
    }
}
