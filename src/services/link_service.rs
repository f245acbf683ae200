//! # Link service
//!
//! Creates and resolves links on top of the store, the cache and the code
//! generator.
//!
//! Writes go to the store first; the cache is refreshed afterwards on a
//! best-effort basis. Reads try the cache, fall back to the store and
//! repopulate the cache on the way out.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::{
    cache::{cache_key, BestEffort, LinkCache},
    config::Config,
    database::LinkStore,
    error::{AppError, Result},
    models::{CreateLinkRequest, Link, LinkResponse, NewLink, Page, UpdateLinkRequest},
    shortener::{is_reserved_code, is_valid_code, CodeGenerator, RandomCodeGenerator},
    utils,
};

/// Random codes tried before giving up with `GenerationExhausted`.
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

// =====================================
// Link Service
// =====================================
#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn LinkCache>,
    generator: Arc<dyn CodeGenerator>,
    config: Arc<Config>,
}

impl LinkService {
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>, cache: Arc<dyn LinkCache>, config: Arc<Config>) -> Self {
        Self {
            store,
            cache,
            generator: Arc::new(RandomCodeGenerator),
            config,
        }
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    // ----------------------------------------
    // Creation
    // ----------------------------------------

    /// Creates a link under a caller supplied or freshly generated code.
    ///
    /// # Errors
    /// - `InvalidInput`: empty/invalid URL or malformed custom code
    /// - `CodeTaken`: custom code already in use, including when a concurrent
    ///   creator wins the insert after our existence check passed
    /// - `GenerationExhausted`: every random candidate collided
    #[instrument(skip(self, request), fields(url = %request.original_url))]
    pub async fn create_link(&self, mut request: CreateLinkRequest) -> Result<LinkResponse> {
        request.original_url = request.original_url.trim().to_string();
        request.custom_code = request.custom_code.filter(|code| !code.is_empty());

        request.validate()?;

        if !utils::is_valid_url(&request.original_url) {
            return Err(AppError::InvalidInput(
                "original_url must be an absolute http(s) URL".to_string(),
            ));
        }

        let link = match request.custom_code.take() {
            Some(code) => self.create_with_custom_code(code, &request).await?,
            None => self.create_with_generated_code(&request).await?,
        };

        self.populate_cache(&link).await;

        info!(id = link.id, short_code = %link.short_code, "Created short link");

        Ok(self.to_response(&link))
    }

    async fn create_with_custom_code(
        &self,
        code: String,
        request: &CreateLinkRequest,
    ) -> Result<Link> {
        if !is_valid_code(&code) {
            return Err(AppError::InvalidInput(format!(
                "custom code '{}' may only contain 0-9, A-Z and a-z",
                code
            )));
        }

        if is_reserved_code(&code) {
            return Err(AppError::InvalidInput(format!(
                "custom code '{}' is reserved",
                code
            )));
        }

        if self.store.code_exists(&code).await? {
            return Err(AppError::CodeTaken(code));
        }

        self.store
            .create(&NewLink {
                short_code: code,
                original_url: request.original_url.clone(),
                expires_at: request.expires_at,
            })
            .await
    }

    /// Bounded generate-check-insert loop. A candidate lost to a concurrent
    /// insert counts as a collision and uses up an attempt.
    async fn create_with_generated_code(&self, request: &CreateLinkRequest) -> Result<Link> {
        let length = self.config.short_code_length as i64;

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = self
                .generator
                .generate(length)
                .map_err(|e| AppError::Internal(e.to_string()))?;

            if is_reserved_code(&code) || self.store.code_exists(&code).await? {
                debug!(attempt, short_code = %code, "Generated code already exists");
                continue;
            }

            let new_link = NewLink {
                short_code: code,
                original_url: request.original_url.clone(),
                expires_at: request.expires_at,
            };

            match self.store.create(&new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::CodeTaken(code)) => {
                    debug!(attempt, short_code = %code, "Lost insert race for generated code");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(attempts = MAX_GENERATION_ATTEMPTS, "Could not generate a unique short code");
        Err(AppError::GenerationExhausted(MAX_GENERATION_ATTEMPTS))
    }

    // ----------------------------------------
    // Resolution
    // ----------------------------------------

    /// Cache-aside lookup of the destination for `short_code`.
    ///
    /// A cache hit is returned without an expiry check. This is safe because
    /// entries are never cached past the link's `expires_at` (see
    /// [`LinkService::cache_ttl_for`]).
    ///
    /// # Errors
    /// `NotFound` for an unknown code, `Expired` for a past `expires_at`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, short_code: &str) -> Result<String> {
        let key = cache_key(short_code);

        if let Some(Some(url)) = self.cache.get(&key).await.best_effort("get", &key) {
            debug!(short_code, "Cache hit");
            return Ok(url);
        }

        let link = self.load_active_link(short_code).await?;

        self.populate_cache(&link).await;

        Ok(link.original_url)
    }

    /// Full entity for `short_code`, with the same expiry rule as
    /// [`LinkService::resolve`] but without touching the cache. The redirect
    /// path needs the numeric id for click recording, which the cache does
    /// not hold.
    #[instrument(skip(self))]
    pub async fn get_link_by_code(&self, short_code: &str) -> Result<Link> {
        self.load_active_link(short_code).await
    }

    async fn load_active_link(&self, short_code: &str) -> Result<Link> {
        let link = self
            .store
            .get_by_code(short_code)
            .await?
            .ok_or_else(|| AppError::code_not_found(short_code))?;

        if link.is_expired() {
            warn!(short_code, "Attempted to access expired link");
            return Err(AppError::Expired(short_code.to_string()));
        }

        Ok(link)
    }

    // ----------------------------------------
    // Management
    // ----------------------------------------

    /// Link view by id. Expired links are still returned.
    #[instrument(skip(self))]
    pub async fn get_link_by_id(&self, id: i64) -> Result<LinkResponse> {
        let link = self.load_by_id(id).await?;
        Ok(self.to_response(&link))
    }

    /// Newest first. See [`Page::new`] for how `limit`/`offset` are clamped.
    #[instrument(skip(self))]
    pub async fn list_links(&self, limit: i64, offset: i64) -> Result<Vec<LinkResponse>> {
        let links = self.store.list_all(Page::new(limit, offset)).await?;

        Ok(links.iter().map(|link| self.to_response(link)).collect())
    }

    /// Changes the destination and/or expiry. The cached projection is
    /// evicted and rebuilt by the next resolution.
    #[instrument(skip(self, request))]
    pub async fn update_link(&self, id: i64, request: UpdateLinkRequest) -> Result<LinkResponse> {
        request.validate()?;

        let mut link = self.load_by_id(id).await?;

        if let Some(url) = request.original_url {
            let url = url.trim().to_string();
            if !utils::is_valid_url(&url) {
                return Err(AppError::InvalidInput(
                    "original_url must be an absolute http(s) URL".to_string(),
                ));
            }
            link.original_url = url;
        }

        if let Some(expires_at) = request.expires_at {
            link.expires_at = Some(expires_at);
        }

        self.store.update(&link).await?;
        self.evict(&link.short_code).await;

        info!(id, short_code = %link.short_code, "Updated short link");

        Ok(self.to_response(&link))
    }

    /// Removes the link and evicts its cache entry.
    #[instrument(skip(self))]
    pub async fn delete_link(&self, id: i64) -> Result<()> {
        let link = self.load_by_id(id).await?;

        self.store.delete(id).await?;
        self.evict(&link.short_code).await;

        info!(id, short_code = %link.short_code, "Deleted short link");
        Ok(())
    }

    async fn load_by_id(&self, id: i64) -> Result<Link> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::link_not_found(id))
    }

    // ----------------------------------------
    // Cache helpers
    // ----------------------------------------

    /// `min(configured TTL, time left until expiry)`; `None` when the link
    /// is already expired and must not be cached at all.
    #[must_use]
    pub fn cache_ttl_for(&self, link: &Link, now: DateTime<Utc>) -> Option<Duration> {
        let ttl = self.config.cache_ttl();

        match link.expires_at {
            None => Some(ttl),
            Some(expires_at) => {
                let remaining = (expires_at - now).to_std().ok()?;
                (!remaining.is_zero()).then(|| ttl.min(remaining))
            }
        }
    }

    async fn populate_cache(&self, link: &Link) {
        let Some(ttl) = self.cache_ttl_for(link, Utc::now()) else {
            return;
        };

        let key = cache_key(&link.short_code);
        self.cache
            .set(&key, &link.original_url, ttl)
            .await
            .best_effort("set", &key);
    }

    async fn evict(&self, short_code: &str) {
        let key = cache_key(short_code);
        self.cache.delete(&key).await.best_effort("delete", &key);
    }

    fn to_response(&self, link: &Link) -> LinkResponse {
        LinkResponse::from_link(link, &self.config.base_url)
    }
}
