//! # Link Shortener
//!
//! Maps long URLs to short base62 codes, redirects visitors and records
//! click analytics off the request path.
//!
//! ## Layout
//!
//! ```text
//! src/
//! ├── lib.rs
//! ├── main.rs         # binary: config, tracing, serve
//! ├── config/         # environment driven settings
//! ├── error/          # AppError and its HTTP mapping
//! ├── shortener/      # code generation and validation
//! ├── database/       # SQLite pool, LinkStore / ClickStore
//! ├── cache/          # LinkCache: in-memory and disabled backends
//! ├── models/         # entities and DTOs
//! ├── services/       # link lifecycle and analytics
//! ├── api/            # axum router, handlers, extractors
//! └── utils/          # URL validation, client IP resolution
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use link_shortener::{config::Config, database::Database};
//!
//! #[tokio::main]
//! async fn main() -> link_shortener::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     db.migrate().await?;
//!     let _app = link_shortener::api::create_router(db, config);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod shortener;
pub mod utils;

pub use error::{AppError, Result};

/// Commonly used items.
///
/// ```rust
/// use link_shortener::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::{LinkCache, MemoryCache, NullCache, RedisCache};
    pub use crate::config::Config;
    pub use crate::database::Database;
    pub use crate::error::{AppError, Result};
    pub use crate::models::*;
    pub use crate::services::*;
}
