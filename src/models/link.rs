//! Link entity and the DTOs built around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// =====================================
// Link Entity
// =====================================
/// A short code bound to a destination.
///
/// `id`, `created_at` and `clicks_count` are assigned by the store. The
/// counter only moves through `increment_clicks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub clicks_count: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Expired means a past `expires_at`; the row itself is never removed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Public short URL. Always derived, never stored.
    #[must_use]
    pub fn short_url(&self, base_url: &str) -> String {
        short_url(base_url, &self.short_code)
    }
}

/// `{base_url}/{code}` with any trailing slash on the base removed.
#[must_use]
pub fn short_url(base_url: &str, short_code: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short_code)
}

// =====================================
// Store input
// =====================================
/// What the service asks the store to persist.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// =====================================
// API Request DTOs
// =====================================
/// Body of `POST /api/v1/urls`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub original_url: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 52, message = "Custom code must be 1-52 characters"))]
    pub custom_code: Option<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateLinkRequest {
    #[must_use]
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn custom_code(mut self, code: impl Into<String>) -> Self {
        self.custom_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Body of `PATCH /api/v1/urls/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub original_url: Option<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

// =====================================
// API Response DTOs
// =====================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub clicks_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_clicked_at: Option<DateTime<Utc>>,
}

impl LinkResponse {
    #[must_use]
    pub fn from_link(link: &Link, base_url: &str) -> Self {
        Self {
            id: link.id,
            short_code: link.short_code.clone(),
            short_url: link.short_url(base_url),
            original_url: link.original_url.clone(),
            created_at: link.created_at,
            expires_at: link.expires_at,
            clicks_count: link.clicks_count,
            last_clicked_at: link.last_clicked_at,
        }
    }
}

/// Body of `GET /api/v1/resolve/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub short_code: String,
    pub original_url: String,
}
