//! # Link Shortener - binary entry point
//!
//! Loads `.env`, reads the config, opens and migrates the database, then
//! serves the router until Ctrl-C.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use link_shortener::{
    api::router,
    config::{Config, Environment},
    database::Database,
    error::{AppError, Result},
    services::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(config.environment);

    info!(
        environment = ?config.environment,
        cache_enabled = config.cache_enabled,
        code_length = config.short_code_length,
        "Starting link shortener"
    );

    let database = Database::connect(&config.database_url).await?;
    database.migrate().await?;
    info!("Database ready");

    let addr = config.server_addr();
    let state = AppState::connect(database, config).await?;
    let app = router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    // Connect info lets the redirect handler fall back to the socket address
    // for click analytics.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

/// Pretty human-readable logs in development, JSON lines elsewhere.
/// `RUST_LOG` overrides the default filter.
fn init_tracing(environment: Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("link_shortener=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if environment.is_development() {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }

    info!("Shutdown signal received");
}
