//! # Health Check Handler

use axum::{extract::State, http::StatusCode, Json};

use crate::{models::HealthResponse, services::AppState};

/// `GET /health`
///
/// 200 while the database answers, 503 otherwise. The cache is reported but
/// never makes the service unhealthy.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "database": true, "cache": true }
/// ```
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = state.db.health_check().await.is_ok();
    let cache_ok = state.cache.ping().await;

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(HealthResponse::new(database_ok, cache_ok)))
}
