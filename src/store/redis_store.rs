//! store::redis_store
//!
//! RedisJSON-backed document store.
//!
//! Values are written with `JSON.SET <key> $ <json>` and read with
//! `JSON.GET <key> $`, so the server needs the RedisJSON module. The
//! connection manager reconnects on its own; clones share it.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde_json::Value;

use super::traits::{DocumentStore, StoreError};

/// Redis store over a shared connection manager.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn set_json(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value).map_err(|e| StoreError::Write {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let _: () = redis::cmd("JSON.SET")
            .arg(key)
            .arg("$")
            .arg(json)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn get_json(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.conn.clone();
        let read_err = |message: String| StoreError::Read {
            key: key.to_string(),
            message,
        };

        let raw: Option<String> = redis::cmd("JSON.GET")
            .arg(key)
            .arg("$")
            .query_async(&mut conn)
            .await
            .map_err(|e| read_err(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        unwrap_path_result(&raw).map_err(read_err)
    }
}

/// `JSON.GET key $` answers with an array of path matches.
fn unwrap_path_result(raw: &str) -> Result<Option<Value>, String> {
    match serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())? {
        Value::Array(mut matches) => Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        }),
        other => Ok(Some(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_result_unwrapping() {
        assert_eq!(
            unwrap_path_result(r#"[{"path":"cosmoshub"}]"#).unwrap(),
            Some(json!({"path": "cosmoshub"}))
        );
        assert_eq!(unwrap_path_result("[]").unwrap(), None);
        assert_eq!(unwrap_path_result(r#"{"a":1}"#).unwrap(), Some(json!({"a": 1})));
        assert!(unwrap_path_result("nope").is_err());
    }
}
