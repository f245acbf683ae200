//! # Link Handlers
//!
//! Management endpoints under `/api/v1`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::JsonBody,
    error::Result,
    models::{
        ApiResponse, CreateLinkRequest, LinkResponse, ListQuery, ResolveResponse,
        UpdateLinkRequest, DEFAULT_PAGE_SIZE,
    },
    services::AppState,
};

// =====================================
// Create
// =====================================
/// `POST /api/v1/urls`
///
/// ```json
/// { "original_url": "https://example.com/very/long", "custom_code": "promo", "expires_at": null }
/// ```
///
/// 201 with the created link, 400 for invalid input, 409 when the custom
/// code is taken.
pub async fn create_link(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LinkResponse>>)> {
    let link = state.links.create_link(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(link).with_message("Short URL created")),
    ))
}

// =====================================
// Read
// =====================================
/// `GET /api/v1/urls?limit=&offset=`
pub async fn list_links(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<LinkResponse>>>> {
    let links = state
        .links
        .list_links(
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(ApiResponse::success(links)))
}

/// `GET /api/v1/urls/{id}`
pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LinkResponse>>> {
    let link = state.links.get_link_by_id(id).await?;
    Ok(Json(ApiResponse::success(link)))
}

/// `GET /api/v1/resolve/{code}`: the cache-aside lookup without a redirect
/// or a recorded click.
pub async fn resolve_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<ResolveResponse>>> {
    let original_url = state.links.resolve(&code).await?;

    Ok(Json(ApiResponse::success(ResolveResponse {
        short_code: code,
        original_url,
    })))
}

// =====================================
// Update / Delete
// =====================================
/// `PATCH /api/v1/urls/{id}`
pub async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(request): JsonBody<UpdateLinkRequest>,
) -> Result<Json<ApiResponse<LinkResponse>>> {
    let link = state.links.update_link(id, request).await?;
    Ok(Json(ApiResponse::success(link).with_message("Short URL updated")))
}

/// `DELETE /api/v1/urls/{id}`: 204 on success.
pub async fn delete_link(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.links.delete_link(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
