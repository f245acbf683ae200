//! # Analytics service
//!
//! Click recording and per-link statistics.
//!
//! Recording runs off the request path: [`AnalyticsService::dispatch_click`]
//! spawns it on the runtime and returns immediately, so a redirect is never
//! delayed or failed by the click log. A failed recording is logged and
//! otherwise lost.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info_span, instrument, warn, Instrument};

use crate::{
    database::{ClickStore, LinkStore},
    error::{AppError, Result},
    models::{NewClick, UrlStats, STATS_RECENT_CLICKS},
};

// =====================================
// Analytics Service
// =====================================
#[derive(Clone)]
pub struct AnalyticsService {
    clicks: Arc<dyn ClickStore>,
    links: Arc<dyn LinkStore>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(clicks: Arc<dyn ClickStore>, links: Arc<dyn LinkStore>) -> Self {
        Self { clicks, links }
    }

    /// Appends a click event, then bumps the link's counter.
    ///
    /// The two writes are not transactional. If the second fails the event
    /// stays in the log while `clicks_count` lags behind it.
    #[instrument(skip(self, user_agent, referer))]
    pub async fn record_click(
        &self,
        link_id: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
        referer: Option<String>,
    ) -> Result<()> {
        let click = NewClick::new(link_id, ip_address, user_agent, referer);

        self.clicks.append(&click).await?;

        if !self.links.increment_clicks(link_id).await? {
            warn!(link_id, "Click recorded for a link that no longer exists");
        }

        Ok(())
    }

    /// Fire-and-forget [`AnalyticsService::record_click`].
    ///
    /// The task owns clones of everything it needs and runs in its own root
    /// span, so it outlives the request that started it. The handle is only
    /// useful to tests that want to wait for the write.
    pub fn dispatch_click(
        &self,
        link_id: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
        referer: Option<String>,
    ) -> JoinHandle<()> {
        let service = self.clone();
        let span = info_span!(parent: None, "click_recording", link_id);

        tokio::spawn(
            async move {
                if let Err(e) = service
                    .record_click(link_id, ip_address, user_agent, referer)
                    .await
                {
                    error!(link_id, error = %e, "Failed to record click");
                }
            }
            .instrument(span),
        )
    }

    /// Aggregates for one link.
    ///
    /// # Errors
    /// `NotFound` when the link does not exist, so an unknown id is never
    /// confused with a link nobody has clicked yet.
    #[instrument(skip(self))]
    pub async fn get_stats(&self, link_id: i64) -> Result<UrlStats> {
        if self.links.get_by_id(link_id).await?.is_none() {
            return Err(AppError::link_not_found(link_id));
        }

        self.clicks.stats(link_id, STATS_RECENT_CLICKS).await
    }
}
