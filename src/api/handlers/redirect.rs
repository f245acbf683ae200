//! # Redirect Handler

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{
    api::{ClientIp, Referer, UserAgent},
    error::Result,
    services::AppState,
};

/// `GET /{code}`: 302 to the original URL.
///
/// The click is handed to a detached task before the response is built, so
/// neither its latency nor its failure reaches the visitor. 404 for unknown
/// codes, 410 for expired ones.
pub async fn redirect(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ClientIp(ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    Referer(referer): Referer,
) -> Result<Response> {
    let link = state.links.get_link_by_code(&code).await?;

    info!(short_code = %code, link_id = link.id, "Redirecting");

    state
        .analytics
        .dispatch_click(link.id, ip, user_agent, referer);

    Ok((StatusCode::FOUND, [(header::LOCATION, link.original_url)]).into_response())
}
