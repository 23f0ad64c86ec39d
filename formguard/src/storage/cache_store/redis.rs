use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

use super::types::{CacheStore, RedisCacheStore};

const CACHE_PREFIX: &str = "cache";

impl RedisCacheStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn make_key(prefix: &str, key: &str) -> String {
        format!("{CACHE_PREFIX}:{prefix}:{key}")
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StorageError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Builds `SET key value [EX ttl]`.
    fn set_command(key: &str, value: &CacheData, ttl: Option<usize>) -> Result<redis::Cmd, StorageError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(serde_json::to_string(value)?);
        if let Some(ttl) = ttl {
            // Redis rejects EX 0
            cmd.arg("EX").arg(ttl.max(1));
        }
        Ok(cmd)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::debug!("Redis cache store reachable: {reply}");
        Ok(())
    }

    async fn put(&mut self, prefix: &str, key: &str, value: CacheData) -> Result<(), StorageError> {
        let cmd = Self::set_command(&Self::make_key(prefix, key), &value, None)?;
        cmd.query_async::<()>(&mut self.connection().await?).await?;
        Ok(())
    }

    async fn put_with_ttl(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        let cmd = Self::set_command(&Self::make_key(prefix, key), &value, Some(ttl))?;
        cmd.query_async::<()>(&mut self.connection().await?).await?;
        Ok(())
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::make_key(prefix, key))
            .query_async(&mut self.connection().await?)
            .await?;

        raw.map(|json| serde_json::from_str(&json).map_err(StorageError::from))
            .transpose()
    }

    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError> {
        redis::cmd("DEL")
            .arg(Self::make_key(prefix, key))
            .query_async::<()>(&mut self.connection().await?)
            .await?;
        Ok(())
    }
}
