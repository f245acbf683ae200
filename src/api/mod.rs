//! # API layer
//!
//! Routes:
//! - `POST   /api/v1/urls` create a short link
//! - `GET    /api/v1/urls` list links, newest first
//! - `GET    /api/v1/urls/:id` link details
//! - `PATCH  /api/v1/urls/:id` change destination or expiry
//! - `DELETE /api/v1/urls/:id` delete a link
//! - `GET    /api/v1/urls/:id/stats` click statistics
//! - `GET    /api/v1/resolve/:code` destination lookup without redirect
//! - `GET    /health` liveness and dependency status
//! - `GET    /:code` 302 redirect

mod extractors;
mod handlers;
mod middleware;

pub use extractors::*;
pub use handlers::*;
pub use middleware::*;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, database::Database, services::AppState};

// =====================================
// Router Builder
// =====================================
/// Builds the application router with the default cache backend.
pub fn create_router(db: Database, config: Config) -> Router {
    router(AppState::new(db, config))
}

/// Builds the router around an existing state.
pub fn router(state: AppState) -> Router {
    let timeout = state.config.request_timeout();

    Router::new()
        .route("/:code", get(handlers::redirect::redirect))
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_id))
                .layer(axum_middleware::from_fn(request_timing))
                .layer(TimeoutLayer::new(timeout))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/urls",
            post(handlers::links::create_link).get(handlers::links::list_links),
        )
        .route(
            "/urls/:id",
            get(handlers::links::get_link)
                .patch(handlers::links::update_link)
                .delete(handlers::links::delete_link),
        )
        .route("/urls/:id/stats", get(handlers::stats::get_link_stats))
        .route("/resolve/:code", get(handlers::links::resolve_code))
}
