//! publish
//!
//! Writes a snapshot of one registry into the document store.
//!
//! # Order
//!
//! A snapshot is published as:
//!
//! ```text
//! R:<dir> (each document) -> R:paths -> metadata sink -> R:commit -> R:repository
//! ```
//!
//! Documents and the index always precede the commit and descriptor, so a
//! reader that sees a new `R:commit` also sees the documents it describes.
//! The engine drives the steps one by one to track its stage; each step is
//! a method here.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use registry_mirror::core::document::ChainDocument;
//! use registry_mirror::core::registry::RegistryDescriptor;
//! use registry_mirror::core::types::{BranchName, RegistryName};
//! use registry_mirror::publish::SnapshotPublisher;
//! use registry_mirror::store::{DocumentStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let descriptor = RegistryDescriptor::new(
//!     RegistryName::new("chain-registry").unwrap(),
//!     "https://example/chain-registry",
//!     BranchName::new("master").unwrap(),
//!     "/tmp/chain-registry",
//! );
//! let store = MemoryStore::new();
//! let publisher = SnapshotPublisher::new(Arc::new(store.clone()), &descriptor);
//!
//! let doc = ChainDocument::new("cosmoshub");
//! publisher.publish_document(&doc).await.unwrap();
//! publisher.publish_index(&[doc]).await.unwrap();
//!
//! assert_eq!(store.writes(), vec!["chain-registry:cosmoshub", "chain-registry:paths"]);
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::document::{ChainDocument, CommitRecord};
use crate::core::registry::RegistryDescriptor;
use crate::core::types::RegistryName;
use crate::store::{self, DocumentStore, StoreError};

/// Store write failures while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The store rejected a write.
    #[error("failed to publish '{key}': {source}")]
    Write { key: String, source: StoreError },

    /// A value could not be encoded as JSON.
    #[error("cannot encode '{key}': {message}")]
    Encode { key: String, message: String },
}

/// Failure reported by a [`MetadataSink`].
#[derive(Debug, Clone, Error)]
#[error("metadata sink failed: {0}")]
pub struct MetadataError(pub String);

/// Optional consumer of each published snapshot.
///
/// Called once per successful publish, after the index is written and
/// before the commit record. Its failure fails the refresh.
#[async_trait]
pub trait MetadataSink: Send + Sync {
    async fn store_meta(
        &self,
        registry: &RegistryName,
        documents: &[ChainDocument],
    ) -> Result<(), MetadataError>;
}

/// Step-wise writer of one registry's snapshot.
pub struct SnapshotPublisher<'a> {
    store: Arc<dyn DocumentStore>,
    descriptor: &'a RegistryDescriptor,
}

impl<'a> SnapshotPublisher<'a> {
    pub fn new(store: Arc<dyn DocumentStore>, descriptor: &'a RegistryDescriptor) -> Self {
        Self { store, descriptor }
    }

    /// Replace `R:<document.path>`.
    pub async fn publish_document(&self, document: &ChainDocument) -> Result<(), PublishError> {
        let key = self.descriptor.key(document.path());
        self.write(key, &document.to_value()).await?;
        tracing::debug!(registry = %self.descriptor.name, dir = document.path(), "published document");
        Ok(())
    }

    /// Replace `R:paths` with the ordered document paths.
    pub async fn publish_index(&self, documents: &[ChainDocument]) -> Result<(), PublishError> {
        let paths: Vec<&str> = documents.iter().map(ChainDocument::path).collect();
        self.write(self.descriptor.key(store::PATHS_SUFFIX), &paths)
            .await
    }

    /// Hand the snapshot to the metadata sink.
    pub async fn publish_metadata(
        &self,
        sink: &dyn MetadataSink,
        documents: &[ChainDocument],
    ) -> Result<(), MetadataError> {
        sink.store_meta(&self.descriptor.name, documents).await
    }

    /// Replace `R:commit`.
    pub async fn publish_commit(&self, commit: &CommitRecord) -> Result<(), PublishError> {
        self.write(self.descriptor.key(store::COMMIT_SUFFIX), commit)
            .await
    }

    /// Replace `R:repository` with `{name, url, branch}`.
    pub async fn publish_descriptor(&self) -> Result<(), PublishError> {
        self.write(
            self.descriptor.key(store::REPOSITORY_SUFFIX),
            &self.descriptor.repository(),
        )
        .await
    }

    async fn write<T: Serialize + ?Sized>(&self, key: String, value: &T) -> Result<(), PublishError> {
        let value = serde_json::to_value(value).map_err(|e| PublishError::Encode {
            key: key.clone(),
            message: e.to_string(),
        })?;
        self.store
            .set_json(&key, &value)
            .await
            .map_err(|source| PublishError::Write { key, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Signature;
    use crate::core::types::{BranchName, Oid};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Mutex;

    fn descriptor() -> RegistryDescriptor {
        RegistryDescriptor::new(
            RegistryName::new("chain-registry").unwrap(),
            "https://example/chain-registry",
            BranchName::new("master").unwrap(),
            "/tmp/chain-registry",
        )
    }

    fn document(path: &str) -> ChainDocument {
        let mut doc = ChainDocument::new(path);
        doc.insert("chain", json!({"chain_id": format!("{path}-1")}));
        doc
    }

    fn commit() -> CommitRecord {
        let sig = Signature {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        CommitRecord {
            oid: Oid::new("a".repeat(40)).unwrap(),
            author: sig.clone(),
            committer: sig,
            timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            message: "Update chains\n".into(),
            summary: "Update chains".into(),
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl MetadataSink for RecordingSink {
        async fn store_meta(
            &self,
            registry: &RegistryName,
            documents: &[ChainDocument],
        ) -> Result<(), MetadataError> {
            if self.fail {
                return Err(MetadataError("sink down".into()));
            }
            self.calls.lock().unwrap().push((
                registry.to_string(),
                documents.iter().map(|d| d.path().to_string()).collect(),
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn full_snapshot_order_and_values() {
        let d = descriptor();
        let store = MemoryStore::new();
        let publisher = SnapshotPublisher::new(Arc::new(store.clone()), &d);
        let docs = vec![document("cosmoshub"), document("osmosis")];
        let sink = RecordingSink::default();

        for doc in &docs {
            publisher.publish_document(doc).await.unwrap();
        }
        publisher.publish_index(&docs).await.unwrap();
        publisher.publish_metadata(&sink, &docs).await.unwrap();
        publisher.publish_commit(&commit()).await.unwrap();
        publisher.publish_descriptor().await.unwrap();

        assert_eq!(
            store.writes(),
            vec![
                "chain-registry:cosmoshub",
                "chain-registry:osmosis",
                "chain-registry:paths",
                "chain-registry:commit",
                "chain-registry:repository",
            ]
        );

        let snapshot = store.snapshot();
        assert_eq!(snapshot["chain-registry:paths"], json!(["cosmoshub", "osmosis"]));
        assert_eq!(
            snapshot["chain-registry:cosmoshub"],
            json!({"path": "cosmoshub", "chain": {"chain_id": "cosmoshub-1"}})
        );
        assert_eq!(
            snapshot["chain-registry:repository"],
            json!({
                "name": "chain-registry",
                "url": "https://example/chain-registry",
                "branch": "master"
            })
        );
        assert_eq!(snapshot["chain-registry:commit"]["oid"], json!("a".repeat(40)));
        assert_eq!(snapshot["chain-registry:commit"]["summary"], json!("Update chains"));

        let calls = sink.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                "chain-registry".to_string(),
                vec!["cosmoshub".to_string(), "osmosis".to_string()]
            )]
        );
    }

    #[tokio::test]
    async fn empty_index_is_empty_array() {
        let d = descriptor();
        let store = MemoryStore::new();
        let publisher = SnapshotPublisher::new(Arc::new(store.clone()), &d);

        publisher.publish_index(&[]).await.unwrap();
        assert_eq!(store.snapshot()["chain-registry:paths"], json!([]));
    }

    #[tokio::test]
    async fn write_failure_names_key() {
        let d = descriptor();
        let store = MemoryStore::new();
        store.fail_on_key("chain-registry:osmosis");
        let publisher = SnapshotPublisher::new(Arc::new(store.clone()), &d);

        let err = publisher
            .publish_document(&document("osmosis"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Write { ref key, .. } if key == "chain-registry:osmosis"));
        assert!(err.to_string().contains("chain-registry:osmosis"));
    }

    #[tokio::test]
    async fn sink_failure_propagates() {
        let d = descriptor();
        let publisher = SnapshotPublisher::new(Arc::new(MemoryStore::new()), &d);
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let err = publisher.publish_metadata(&sink, &[]).await.unwrap_err();
        assert!(err.to_string().contains("sink down"));
    }
}
