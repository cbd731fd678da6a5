//! store::file_store
//!
//! Directory-backed document store.
//!
//! # Layout
//!
//! Each key is one file, `<root>/<encoded key>.json`. Characters outside
//! `[A-Za-z0-9._-]` are percent-encoded, so `chain-registry:paths` becomes
//! `chain-registry%3Apaths.json`.
//!
//! # Invariants
//!
//! - All writes are atomic (write to a uniquely named temp file, sync,
//!   then rename)
//! - A reader never sees a half-written value

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{DocumentStore, StoreError};

/// File-per-key JSON store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            StoreError::Unavailable(format!("cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `key`.
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }
}

fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)
}

#[async_trait]
impl DocumentStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn set_json(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let write_err = |message: String| StoreError::Write {
            key: key.to_string(),
            message,
        };
        let content = serde_json::to_vec_pretty(value).map_err(|e| write_err(e.to_string()))?;
        let path = self.key_path(key);

        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(|e| write_err(e.to_string()))?
            .map_err(|e| write_err(e.to_string()))
    }

    async fn get_json(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let read_err = |message: String| StoreError::Read {
            key: key.to_string(),
            message,
        };
        let content = match tokio::fs::read(self.key_path(key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_err(e.to_string())),
        };
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| read_err(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn key_encoding() {
        assert_eq!(encode_key("chain-registry:paths"), "chain-registry%3Apaths");
        assert_eq!(encode_key("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_key("plain_name.v1"), "plain_name.v1");
    }

    #[test]
    fn open_creates_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested/store");
        let store = FileStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[tokio::test]
    async fn set_then_get() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        let doc = json!({"path": "cosmoshub", "chain": {"chain_id": "cosmoshub-4"}});
        store.set_json("chain-registry:cosmoshub", &doc).await.unwrap();

        assert!(store.key_path("chain-registry:cosmoshub").exists());
        assert_eq!(
            store.get_json("chain-registry:cosmoshub").await.unwrap(),
            Some(doc)
        );
    }

    #[tokio::test]
    async fn overwrite_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        store.set_json("r:paths", &json!(["a"])).await.unwrap();
        store.set_json("r:paths", &json!(["a", "b"])).await.unwrap();

        assert_eq!(store.get_json("r:paths").await.unwrap(), Some(json!(["a", "b"])));
        let files: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get_json("r:none").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        fs::write(store.key_path("r:bad"), "{not json").unwrap();

        let err = store.get_json("r:bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }
}
