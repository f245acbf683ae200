//! Click events and the statistics derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Number of day buckets in [`UrlStats::clicks_by_date`].
pub const STATS_DAYS: i64 = 30;

/// Number of country buckets in [`UrlStats::clicks_by_country`].
pub const STATS_COUNTRIES: i64 = 10;

/// Number of raw events in [`UrlStats::recent_clicks`].
pub const STATS_RECENT_CLICKS: i64 = 100;

/// One recorded visit. Never updated after insert.
///
/// `country` and `city` are part of the schema but nothing fills them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Input for appending a click.
#[derive(Debug, Clone, Default)]
pub struct NewClick {
    pub link_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl NewClick {
    /// Empty strings are stored as NULL so they do not count as a distinct IP.
    #[must_use]
    pub fn new(
        link_id: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
        referer: Option<String>,
    ) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Self {
            link_id,
            ip_address: non_empty(ip_address),
            user_agent: non_empty(user_agent),
            referer: non_empty(referer),
        }
    }
}

/// Clicks on one calendar day (UTC), `date` as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyClicks {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CountryClicks {
    pub country: String,
    pub count: i64,
}

/// Read-only statistics for one link, computed on every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlStats {
    pub total_clicks: i64,
    pub unique_ips: i64,
    /// Newest day first
    pub clicks_by_date: Vec<DailyClicks>,
    /// Busiest country first
    pub clicks_by_country: Vec<CountryClicks>,
    /// Newest click first
    pub recent_clicks: Vec<ClickEvent>,
}
