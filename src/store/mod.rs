//! store
//!
//! Document store abstraction the mirror publishes into.
//!
//! # Architecture
//!
//! Documents are written through the [`DocumentStore`] trait, which has
//! several implementations:
//!
//! - [`FileStore`]: one JSON file per key under a directory (default)
//! - [`MemoryStore`]: in-process map with failure injection
//! - `RedisStore`: RedisJSON server (optional, feature-gated)
//!
//! # Keys
//!
//! Every key is `<registry>:<suffix>` and is produced by [`key`]. For a
//! registry `R` the mirror writes:
//!
//! | Key | Value |
//! |---|---|
//! | `R:<dirName>` | chain document |
//! | `R:paths` | ordered array of published directory names |
//! | `R:commit` | tip commit record |
//! | `R:repository` | `{name, url, branch}` |
//!
//! # Backend Selection
//!
//! ```ignore
//! use registry_mirror::store::{open_store, StoreBackend};
//!
//! let store = open_store(&config.store_backend()).await?;
//! store.set_json("chain-registry:paths", &json!(["cosmoshub"])).await?;
//! ```

mod file_store;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod traits;

use std::path::PathBuf;
use std::sync::Arc;

pub use file_store::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use traits::{DocumentStore, StoreError};

use crate::core::types::RegistryName;

/// Key suffix of the published directory index.
pub const PATHS_SUFFIX: &str = "paths";

/// Key suffix of the tip commit record.
pub const COMMIT_SUFFIX: &str = "commit";

/// Key suffix of the repository descriptor.
pub const REPOSITORY_SUFFIX: &str = "repository";

/// Composite store key `<registry>:<suffix>`.
pub fn key(registry: &RegistryName, suffix: &str) -> String {
    format!("{}:{}", registry, suffix)
}

/// Configured store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    /// Root directory of a [`FileStore`]
    File(PathBuf),
    /// Connection URL of a RedisJSON server
    Redis(String),
}

/// Open the configured backend.
///
/// # Errors
///
/// - The file store root cannot be created
/// - The redis server is unreachable
/// - Redis was requested without the `redis` feature
pub async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::File(root) => Ok(Arc::new(FileStore::open(root.clone())?)),
        #[cfg(feature = "redis")]
        StoreBackend::Redis(url) => Ok(Arc::new(RedisStore::connect(url).await?)),
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis(_) => Err(StoreError::BackendNotAvailable(
            "redis support not enabled (compile with --features redis)".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn key_format() {
        let name = RegistryName::new("chain-registry").unwrap();
        assert_eq!(key(&name, "cosmoshub"), "chain-registry:cosmoshub");
        assert_eq!(key(&name, PATHS_SUFFIX), "chain-registry:paths");
        assert_eq!(key(&name, COMMIT_SUFFIX), "chain-registry:commit");
        assert_eq!(key(&name, REPOSITORY_SUFFIX), "chain-registry:repository");
    }

    #[tokio::test]
    async fn open_memory_store() {
        let store = open_store(&StoreBackend::Memory).await.expect("open memory");
        assert_eq!(store.name(), "memory");
        assert!(store.get_json("r:x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_file_store() {
        let temp = TempDir::new().expect("create temp dir");
        let backend = StoreBackend::File(temp.path().join("store"));
        let store = open_store(&backend).await.expect("open file store");

        store.set_json("r:a", &json!(1)).await.unwrap();
        assert_eq!(store.get_json("r:a").await.unwrap(), Some(json!(1)));
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn redis_without_feature() {
        let result = open_store(&StoreBackend::Redis("redis://localhost".into())).await;
        match result {
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("redis"), "error should mention redis");
                assert!(msg.contains("not enabled"), "error should mention not enabled");
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
