//! # Generic DTOs
//!
//! Envelopes and query parameters shared by several handlers.

use serde::{Deserialize, Deserializer, Serialize};

// =====================================
// Generic API Responses
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// =====================================
// Query parameters
// =====================================
/// `?limit=&offset=` on the listing endpoint. Out-of-range values are
/// normalised by [`super::Page`] and non-numeric ones fall back to the
/// defaults; the query is never rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub limit: Option<i64>,

    #[serde(default, deserialize_with = "lenient_i64")]
    pub offset: Option<i64>,
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

// =====================================
// Health Check
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: bool,
    pub cache: bool,
}

impl HealthResponse {
    /// The cache never decides health; a broken cache only degrades latency.
    #[must_use]
    pub fn new(database_ok: bool, cache_ok: bool) -> Self {
        Self {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
            cache: cache_ok,
        }
    }
}
