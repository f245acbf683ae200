//! # Models
//!
//! - **Entities** ([`Link`], [`ClickEvent`]) are read straight from SQLite
//!   with `FromRow`.
//! - **Inputs** ([`NewLink`], [`NewClick`]) are what the service hands to the
//!   stores.
//! - **DTOs** ([`CreateLinkRequest`], [`LinkResponse`], ...) cross the HTTP
//!   boundary.

mod click;
mod dto;
mod link;

pub use click::*;
pub use dto::*;
pub use link::*;

use serde::{Deserialize, Serialize};

// =====================================
// Pagination
// =====================================
/// Page size used when the caller gives none or an out-of-range one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalised `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// `limit <= 0` or above [`MAX_PAGE_SIZE`] becomes [`DEFAULT_PAGE_SIZE`];
    /// a negative offset becomes 0.
    #[must_use]
    pub fn new(limit: i64, offset: i64) -> Self {
        let limit = if limit <= 0 || limit > MAX_PAGE_SIZE {
            DEFAULT_PAGE_SIZE
        } else {
            limit
        };

        Self {
            limit,
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}
