//! # Cache layer
//!
//! A `short_code -> original_url` projection of the store, used to answer
//! redirects without a database round trip. It is never authoritative: any
//! entry may be missing, stale or evicted, and every miss falls back to the
//! store.
//!
//! Backends:
//! - [`MemoryCache`]: bounded in-process cache on `moka`
//! - [`RedisCache`]: shared across processes, selected by `REDIS_URL`
//! - [`NullCache`]: caching switched off
//!
//! Cache calls return [`CacheResult`], whose error type deliberately has no
//! conversion into [`crate::error::AppError`]. Callers discard failures
//! through [`BestEffort`], which logs them and yields an `Option`.

mod memory;
mod redis_cache;

pub use memory::*;
pub use redis_cache::*;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

// =====================================
// Errors
// =====================================
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation failed: {0}")]
    Operation(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Marks a cache result as ignorable.
pub trait BestEffort<T> {
    /// Logs a failure at `warn` and turns it into `None`.
    fn best_effort(self, operation: &'static str, key: &str) -> Option<T>;
}

impl<T> BestEffort<T> for CacheResult<T> {
    fn best_effort(self, operation: &'static str, key: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, operation, key, "Cache operation failed, continuing without cache");
                None
            }
        }
    }
}

/// Namespaced key for a short code.
#[must_use]
pub fn cache_key(short_code: &str) -> String {
    format!("url:{}", short_code)
}

// =====================================
// Cache trait
// =====================================
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// `Ok(None)` on a miss.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` for `ttl`. Concurrent writers to one key are
    /// last-write-wins.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Whether the backend is reachable.
    async fn ping(&self) -> bool;
}

// =====================================
// Disabled cache
// =====================================
/// Always misses. Used when caching is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl LinkCache for NullCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }
}
