//! # Statistics Handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::Result,
    models::{ApiResponse, UrlStats},
    services::AppState,
};

/// `GET /api/v1/urls/{id}/stats`
///
/// Aggregates are computed on every call. Clicks from redirects that just
/// happened may not be visible yet.
pub async fn get_link_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UrlStats>>> {
    let stats = state.analytics.get_stats(id).await?;
    Ok(Json(ApiResponse::success(stats)))
}
