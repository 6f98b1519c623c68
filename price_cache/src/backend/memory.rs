use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{ACK_OK, BackendError, DocumentStore, ROOT_PATH};

/// Process-local [`DocumentStore`].
///
/// Used by tests, and by the service as a degraded cache when Redis cannot be
/// reached at startup. Only whole-document writes at [`ROOT_PATH`] are
/// supported.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: RwLock<HashMap<String, String>>,
    reject_writes: AtomicBool,
    offline: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every write with a refusal instead of [`ACK_OK`].
    pub fn rejecting_writes(self) -> Self {
        self.reject_writes.store(true, Ordering::SeqCst);
        self
    }

    /// While offline, every call fails with [`BackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Stores a raw document, bypassing acknowledgement handling.
    pub async fn insert_raw(&self, key: impl Into<String>, json: impl Into<String>) {
        self.docs.write().await.insert(key.into(), json.into());
    }

    /// Number of `json_get` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("memory backend offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn json_get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.check_online()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn json_set(&self, key: &str, path: &str, json: &str) -> Result<String, BackendError> {
        self.check_online()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Ok("ERR write refused".to_string());
        }
        if path != ROOT_PATH {
            return Ok(format!("ERR unsupported path {path}"));
        }

        self.docs
            .write()
            .await
            .insert(key.to_string(), json.to_string());
        Ok(ACK_OK.to_string())
    }
}
