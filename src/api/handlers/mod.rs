//! # HTTP Handlers
//!
//! Thin adapters: extract, call one service method, wrap the result.
//! Status mapping for failures lives in [`crate::error::AppError`].

pub mod health;
pub mod links;
pub mod redirect;
pub mod stats;
