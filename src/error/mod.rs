//! # Error handling
//!
//! Every fallible operation in the crate returns [`Result<T>`], an alias over
//! [`AppError`]. The variants mirror the outcomes a caller can act on:
//!
//! - `InvalidInput`, `CodeTaken`, `GenerationExhausted`, `NotFound`, `Expired`
//!   are expected outcomes and are translated into 4xx/5xx responses.
//! - `Database` is a store failure and always surfaces as an internal error.
//!
//! Cache failures are deliberately absent from this enum: they live in
//! [`crate::cache::CacheError`] and have no `From` conversion, so `?` can never
//! turn a cache hiccup into a failed request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

// =====================================
// Result Type Alias
// =====================================
/// Crate-wide result type.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// =====================================
// Custom Error Enum
// =====================================
/// Application error.
#[derive(Debug, Error)]
pub enum AppError {
    // ----------------------------------------
    // Caller-actionable outcomes
    // ----------------------------------------

    /// Empty or malformed original URL, malformed custom code - 400
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Short code already bound to a link - 409
    #[error("Short code '{0}' is already taken")]
    CodeTaken(String),

    /// Every random attempt collided with an existing code - 500
    #[error("Failed to generate a unique short code after {0} attempts")]
    GenerationExhausted(usize),

    /// Unknown id or code - 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Link exists but its expiry is in the past - 410
    #[error("Link '{0}' has expired")]
    Expired(String),

    // ----------------------------------------
    // Server errors (5xx)
    // ----------------------------------------

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Server could not start or serve
    #[error("Server error: {0}")]
    Server(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    // ----------------------------------------
    // Converted library errors
    // ----------------------------------------

    /// Durable store unreachable or rejected the statement
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure at startup
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::CodeTaken(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Expired(_) => StatusCode::GONE,

            Self::GenerationExhausted(_)
            | Self::Internal(_)
            | Self::Server(_)
            | Self::Config(_)
            | Self::Database(_)
            | Self::Migrate(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is the server's fault rather than the caller's.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Short code has no link.
    #[must_use]
    pub fn code_not_found(short_code: &str) -> Self {
        Self::NotFound(format!("URL with code '{}' not found", short_code))
    }

    /// Numeric id has no link.
    #[must_use]
    pub fn link_not_found(id: i64) -> Self {
        Self::NotFound(format!("URL with id {} not found", id))
    }
}

// =====================================
// Error Response DTO
// =====================================
/// JSON body returned for every error.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Canonical reason, e.g. "Not Found"
    pub error: String,

    /// Human readable message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status.as_u16());
        self
    }
}

// =====================================
// IntoResponse Implementation
// =====================================
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error = %self, "Server error occurred");
        }

        let status = self.status_code();

        // Store internals stay in the log, not in the body.
        let message = match &self {
            Self::Database(_) | Self::Migrate(_) | Self::Io(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let error_response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            message,
        )
        .with_status(status);

        (status, Json(error_response)).into_response()
    }
}

// =====================================
// From Implementations
// =====================================
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
