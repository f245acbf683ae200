//! # Repositories
//!
//! [`LinkStore`] is the authoritative home of links; [`ClickStore`] holds the
//! append-only click log. Both are traits so the service can be driven by any
//! backend, and both have a SQLite implementation here.
//!
//! The `UNIQUE` index on `links.short_code` is the final word on uniqueness.
//! The service's existence check is only a fast path: two concurrent creators
//! can both pass it, and the loser's insert is turned into `CodeTaken` here.

use async_trait::async_trait;
use chrono::Utc;

use super::Database;
use crate::{
    error::{AppError, Result},
    models::{
        ClickEvent, CountryClicks, DailyClicks, Link, NewClick, NewLink, Page, UrlStats,
        STATS_COUNTRIES, STATS_DAYS,
    },
};

const LINK_COLUMNS: &str =
    "id, short_code, original_url, created_at, expires_at, clicks_count, last_clicked_at";

// =====================================
// Link Store
// =====================================
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Persists a link. The store assigns `id`, `created_at` and a zero
    /// `clicks_count`.
    ///
    /// # Errors
    /// `CodeTaken` when the code violates the uniqueness constraint.
    async fn create(&self, link: &NewLink) -> Result<Link>;

    async fn get_by_code(&self, short_code: &str) -> Result<Option<Link>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>>;

    /// Rewrites `original_url` and `expires_at`. `NotFound` if the id is gone.
    async fn update(&self, link: &Link) -> Result<()>;

    /// `NotFound` if the id is gone.
    async fn delete(&self, id: i64) -> Result<()>;

    /// Atomically bumps `clicks_count` and stamps `last_clicked_at`.
    /// Returns false when no link has this id.
    async fn increment_clicks(&self, id: i64) -> Result<bool>;

    async fn code_exists(&self, short_code: &str) -> Result<bool>;

    /// Newest first.
    async fn list_all(&self, page: Page) -> Result<Vec<Link>>;
}

/// SQLite backed [`LinkStore`].
#[derive(Debug, Clone)]
pub struct LinkRepository {
    db: Database,
}

impl LinkRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LinkStore for LinkRepository {
    async fn create(&self, link: &NewLink) -> Result<Link> {
        let id = sqlx::query(
            r#"
            INSERT INTO links (short_code, original_url, created_at, expires_at, clicks_count)
            VALUES (?, ?, ?, ?, 0)
            "#,
        )
        .bind(&link.short_code)
        .bind(&link.original_url)
        .bind(Utc::now())
        .bind(link.expires_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::CodeTaken(link.short_code.clone())
            }
            other => AppError::Database(other),
        })?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal("Created link vanished before read-back".to_string()))
    }

    async fn get_by_code(&self, short_code: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE short_code = ?"
        ))
        .bind(short_code)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(link)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(link)
    }

    async fn update(&self, link: &Link) -> Result<()> {
        let result = sqlx::query("UPDATE links SET original_url = ?, expires_at = ? WHERE id = ?")
            .bind(&link.original_url)
            .bind(link.expires_at)
            .bind(link.id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::link_not_found(link.id));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::link_not_found(id));
        }

        Ok(())
    }

    async fn increment_clicks(&self, id: i64) -> Result<bool> {
        // Single statement: the read-modify-write happens inside SQLite.
        let result = sqlx::query(
            r#"
            UPDATE links
            SET clicks_count = clicks_count + 1, last_clicked_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn code_exists(&self, short_code: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM links WHERE short_code = ?)",
        )
        .bind(short_code)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists > 0)
    }

    async fn list_all(&self, page: Page) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links ORDER BY id DESC LIMIT ? OFFSET ?"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(links)
    }
}

// =====================================
// Click Store
// =====================================
#[async_trait]
pub trait ClickStore: Send + Sync {
    /// Appends one event, returns its id.
    async fn append(&self, click: &NewClick) -> Result<i64>;

    /// All aggregates for one link. `recent_limit` bounds `recent_clicks`.
    async fn stats(&self, link_id: i64, recent_limit: i64) -> Result<UrlStats>;
}

/// SQLite backed [`ClickStore`].
#[derive(Debug, Clone)]
pub struct ClickRepository {
    db: Database,
}

impl ClickRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn total_clicks(&self, link_id: i64) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clicks WHERE link_id = ?")
            .bind(link_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(total)
    }

    async fn unique_ips(&self, link_id: i64) -> Result<i64> {
        let unique = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT ip_address) FROM clicks WHERE link_id = ? AND ip_address IS NOT NULL",
        )
        .bind(link_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(unique)
    }

    async fn clicks_by_date(&self, link_id: i64) -> Result<Vec<DailyClicks>> {
        // clicked_at is RFC 3339 UTC text, so the first ten bytes are the day.
        let rows = sqlx::query_as::<_, DailyClicks>(
            r#"
            SELECT substr(clicked_at, 1, 10) AS date, COUNT(*) AS count
            FROM clicks
            WHERE link_id = ?
            GROUP BY date
            ORDER BY date DESC
            LIMIT ?
            "#,
        )
        .bind(link_id)
        .bind(STATS_DAYS)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    async fn clicks_by_country(&self, link_id: i64) -> Result<Vec<CountryClicks>> {
        let rows = sqlx::query_as::<_, CountryClicks>(
            r#"
            SELECT country, COUNT(*) AS count
            FROM clicks
            WHERE link_id = ? AND country IS NOT NULL
            GROUP BY country
            ORDER BY count DESC, country ASC
            LIMIT ?
            "#,
        )
        .bind(link_id)
        .bind(STATS_COUNTRIES)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    async fn recent_clicks(&self, link_id: i64, limit: i64) -> Result<Vec<ClickEvent>> {
        let rows = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT id, link_id, clicked_at, ip_address, user_agent, referer, country, city
            FROM clicks
            WHERE link_id = ?
            ORDER BY clicked_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(link_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl ClickStore for ClickRepository {
    async fn append(&self, click: &NewClick) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO clicks (link_id, clicked_at, ip_address, user_agent, referer)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(click.link_id)
        .bind(Utc::now())
        .bind(&click.ip_address)
        .bind(&click.user_agent)
        .bind(&click.referer)
        .execute(self.db.pool())
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    async fn stats(&self, link_id: i64, recent_limit: i64) -> Result<UrlStats> {
        Ok(UrlStats {
            total_clicks: self.total_clicks(link_id).await?,
            unique_ips: self.unique_ips(link_id).await?,
            clicks_by_date: self.clicks_by_date(link_id).await?,
            clicks_by_country: self.clicks_by_country(link_id).await?,
            recent_clicks: self.recent_clicks(link_id, recent_limit).await?,
        })
    }
}
