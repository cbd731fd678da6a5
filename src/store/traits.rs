//! store::traits
//!
//! Document store trait definition.
//!
//! # Design
//!
//! The store is an external key/value service holding JSON documents under
//! composite keys `<registry>:<suffix>`. Every write replaces the whole
//! value at the key. There are no cross-key transactions, so readers may
//! observe a mix of old and new keys while a refresh is publishing.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend could not be reached or initialized.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected.
    #[error("failed to write '{key}': {message}")]
    Write { key: String, message: String },

    /// A read failed.
    #[error("failed to read '{key}': {message}")]
    Read { key: String, message: String },

    /// The named backend is unknown or not compiled in.
    #[error("store backend not available: {0}")]
    BackendNotAvailable(String),
}

/// Key/value store of JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Replace the value at `key`.
    async fn set_json(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Read the value at `key`, if any.
    async fn get_json(&self, key: &str) -> Result<Option<Value>, StoreError>;
}
