use std::time::Duration;

use async_trait::async_trait;
use redis::{IntoConnectionInfo, Value, aio::ConnectionManager};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::backend::{ACK_OK, BackendError, DocumentStore, ROOT_PATH};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// [`DocumentStore`] speaking the RedisJSON `JSON.GET` / `JSON.SET` commands.
///
/// The connection manager is a multiplexed handle that reconnects on its own;
/// each call works on a cheap clone of it.
#[derive(Clone)]
pub struct RedisJsonBackend {
    conn: ConnectionManager,
}

impl RedisJsonBackend {
    /// Connects to `address` (`host:port` or a `redis://` URL).
    ///
    /// An empty `password` means no authentication.
    pub async fn connect(
        address: &str,
        password: &SecretString,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let url = if address.contains("://") {
            address.to_string()
        } else {
            format!("redis://{address}")
        };

        let mut info = url.as_str().into_connection_info()?;
        let password = password.expose_secret();
        if !password.is_empty() {
            info.redis.password = Some(password.to_string());
        }

        let client = redis::Client::open(info)?;
        let conn = tokio::time::timeout(timeout, client.get_connection_manager())
            .await
            .map_err(|_| {
                BackendError::Unavailable(format!("no connection to {address} within {timeout:?}"))
            })??;

        info!(address, "connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl DocumentStore for RedisJsonBackend {
    async fn json_get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let mut conn = self.conn.clone();
        let doc: Option<String> = redis::cmd("JSON.GET")
            .arg(key)
            .arg(ROOT_PATH)
            .query_async(&mut conn)
            .await?;
        Ok(doc)
    }

    async fn json_set(&self, key: &str, path: &str, json: &str) -> Result<String, BackendError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("JSON.SET")
            .arg(key)
            .arg(path)
            .arg(json)
            .query_async(&mut conn)
            .await?;

        Ok(match reply {
            Value::Okay => ACK_OK.to_string(),
            Value::SimpleString(s) => s,
            Value::Nil => "(nil)".to_string(),
            other => format!("{other:?}"),
        })
    }
}
