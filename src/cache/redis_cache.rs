//! Redis backed cache, shared by every process pointed at the same server.
//!
//! Values are the plain destination URL under the caller's `url:<code>` key,
//! written with `SET ... EX` (or `PX` for sub-second TTLs) so Redis expires
//! them itself.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::{debug, trace};

use super::{CacheError, CacheResult, LinkCache};

/// `ConnectionManager` multiplexes commands over one connection and
/// reconnects after failures; clones share that connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Opens the connection and checks it with `PING`.
    ///
    /// # Errors
    /// [`CacheError::Unavailable`] for a malformed URL or an unreachable
    /// server.
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        let cache = Self { connection };
        if !cache.ping().await {
            return Err(CacheError::Unavailable("PING failed".to_string()));
        }

        debug!("Redis link cache connected");
        Ok(cache)
    }
}

fn operation_error(e: redis::RedisError) -> CacheError {
    CacheError::Operation(e.to_string())
}

#[async_trait]
impl LinkCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(operation_error)?;

        trace!(key, hit = value.is_some(), "Redis get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection.clone();

        if ttl.is_zero() {
            return conn.del::<_, ()>(key).await.map_err(operation_error);
        }

        if ttl.subsec_nanos() == 0 {
            conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(operation_error)
        } else {
            let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
            conn.pset_ex::<_, _, ()>(key, value, millis)
                .await
                .map_err(operation_error)
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await.map_err(operation_error)
    }

    async fn ping(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
