use crate::store::{last_index, CappedListStore, StoreError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;

/// [`CappedListStore`] backed by Redis lists.
///
/// Capped writes go out as a single MULTI/EXEC pipeline
/// (`LPUSH` + `LTRIM` + optional `EXPIRE`). The connection manager
/// reconnects on its own after connection loss.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to the Redis server at `url`, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Connection(format!("invalid redis url: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { connection })
    }

    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

fn command_error(command: &'static str) -> impl FnOnce(redis::RedisError) -> StoreError {
    move |e| StoreError::Command {
        command,
        message: e.to_string(),
    }
}

#[async_trait]
impl CappedListStore for RedisStore {
    async fn push_front(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("LPUSH")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(command_error("LPUSH"))?;
        Ok(())
    }

    async fn trim(&self, key: &str, start: isize, end: isize) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("LTRIM")
            .arg(key)
            .arg(start)
            .arg(end)
            .query_async(&mut conn)
            .await
            .map_err(command_error("LTRIM"))?;
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("EXPIRE")
            .arg(key)
            .arg(seconds)
            .query_async(&mut conn)
            .await
            .map_err(command_error("EXPIRE"))?;
        Ok(())
    }

    async fn range(&self, key: &str, start: isize, end: isize) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(end)
            .query_async(&mut conn)
            .await
            .map_err(command_error("LRANGE"))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let count: i64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(command_error("EXISTS"))?;
        Ok(count > 0)
    }

    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        limit: usize,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("LPUSH")
            .arg(key)
            .arg(value)
            .ignore()
            .cmd("LTRIM")
            .arg(key)
            .arg(0)
            .arg(last_index(limit))
            .ignore();
        if ttl_seconds > 0 {
            pipe.cmd("EXPIRE").arg(key).arg(ttl_seconds).ignore();
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(command_error("MULTI"))?;
        Ok(())
    }
}
