//! # Services (business logic layer)
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- HTTP handlers (axum)
//! ├─────────────────┤
//! │  Service Layer  │  <-- link lifecycle, analytics
//! ├────────┬────────┤
//! │ Stores │ Cache  │  <-- SQLite repositories, LinkCache
//! └────────┴────────┘
//! ```
//!
//! Services depend on the store and cache traits only; [`AppState::connect`]
//! and [`AppState::new`] are where the concrete SQLite and cache backends are
//! wired in.

mod analytics_service;
mod link_service;

pub use analytics_service::*;
pub use link_service::*;

use std::sync::Arc;

use tracing::info;

use crate::{
    cache::{LinkCache, MemoryCache, NullCache, RedisCache},
    config::Config,
    database::{ClickRepository, Database, LinkRepository},
    error::{AppError, Result},
};

// =====================================
// Application State
// =====================================
/// Shared by every handler. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub links: Arc<LinkService>,
    pub analytics: Arc<AnalyticsService>,
    pub cache: Arc<dyn LinkCache>,
    pub db: Database,
}

impl AppState {
    /// Wires the SQLite stores and the configured cache backend: none when
    /// caching is disabled, Redis when `redis_url` is set, otherwise the
    /// bounded in-process cache.
    ///
    /// # Errors
    /// [`AppError::Config`] when `redis_url` is set but the server cannot be
    /// reached.
    pub async fn connect(db: Database, config: Config) -> Result<Self> {
        let cache: Arc<dyn LinkCache> = match (&config.redis_url, config.cache_enabled) {
            (_, false) => {
                info!("Link cache disabled");
                Arc::new(NullCache)
            }
            (Some(url), true) => {
                let redis = RedisCache::connect(url)
                    .await
                    .map_err(|e| AppError::Config(format!("Redis cache: {e}")))?;
                info!("Using Redis link cache");
                Arc::new(redis)
            }
            (None, true) => {
                info!(
                    max_capacity = config.cache_max_capacity,
                    "Using in-memory link cache"
                );
                Arc::new(MemoryCache::with_capacity(config.cache_max_capacity))
            }
        };

        Ok(Self::with_cache(db, config, cache))
    }

    /// Synchronous wiring without Redis: the in-process cache when
    /// `cache_enabled`, otherwise none.
    #[must_use]
    pub fn new(db: Database, config: Config) -> Self {
        let cache: Arc<dyn LinkCache> = if config.cache_enabled {
            Arc::new(MemoryCache::with_capacity(config.cache_max_capacity))
        } else {
            Arc::new(NullCache)
        };

        Self::with_cache(db, config, cache)
    }

    /// Like [`AppState::new`] with an explicit cache backend.
    #[must_use]
    pub fn with_cache(db: Database, config: Config, cache: Arc<dyn LinkCache>) -> Self {
        let config = Arc::new(config);
        let link_store = Arc::new(LinkRepository::new(db.clone()));
        let click_store = Arc::new(ClickRepository::new(db.clone()));

        let links = Arc::new(LinkService::new(
            link_store.clone(),
            cache.clone(),
            config.clone(),
        ));
        let analytics = Arc::new(AnalyticsService::new(click_store, link_store));

        Self {
            config,
            links,
            analytics,
            cache,
            db,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
