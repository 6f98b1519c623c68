//! Document backends the cache is stored in.

pub mod memory;
pub mod redis_json;

use async_trait::async_trait;

/// JSON path addressing the whole document.
pub const ROOT_PATH: &str = ".";

/// Acknowledgement returned by a successful write.
pub const ACK_OK: &str = "OK";

#[derive(thiserror::Error, Debug)]
/// Transport-level failures talking to a backend.
pub enum BackendError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Minimal key → JSON document surface, modelled on RedisJSON.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the document at the root path. `Ok(None)` when the key does not exist.
    async fn json_get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Writes `json` at `path` under `key` and returns the backend's acknowledgement.
    ///
    /// Anything other than [`ACK_OK`] means the write was refused without a
    /// transport failure.
    async fn json_set(&self, key: &str, path: &str, json: &str) -> Result<String, BackendError>;
}
