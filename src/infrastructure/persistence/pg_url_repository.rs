//! PostgreSQL implementation of URL storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::{NewUrl, Url};
use crate::domain::repositories::{StorageStats, UrlRepository};
use crate::error::{AppError, map_sqlx_error};

// Binds: $1 short_url, $2 original_url, $3 user_id, $4 created_at.
const INSERT_URL_SQL: &str = "INSERT INTO urls (short_url, original_url, user_id, created_at)
     VALUES ($1, $2, $3, $4)";

const GET_BY_SHORT_URL_SQL: &str =
    "SELECT original_url, is_deleted FROM urls WHERE short_url = $1";

const GET_BY_ORIGINAL_URL_SQL: &str = "SELECT short_url FROM urls WHERE original_url = $1";

const GET_USER_URLS_SQL: &str = "SELECT short_url, original_url, user_id, created_at, is_deleted
     FROM urls
     WHERE user_id = $1
     ORDER BY created_at";

const MARK_DELETED_SQL: &str = "UPDATE urls
     SET is_deleted = TRUE
     WHERE short_url = ANY($1) AND user_id = $2";

const PING_SQL: &str = "SELECT 1";

const GET_STATS_SQL: &str = "SELECT
         COUNT(*) FILTER (WHERE NOT is_deleted),
         COUNT(DISTINCT user_id)
     FROM urls";

/// PostgreSQL repository for URL storage.
///
/// Uniqueness of both keys is enforced by the database; `add` surfaces the
/// raw uniqueness violation and leaves conflict recovery to the URL
/// service.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UrlRow {
    short_url: String,
    original_url: String,
    user_id: String,
    created_at: DateTime<Utc>,
    is_deleted: bool,
}

impl From<UrlRow> for Url {
    fn from(row: UrlRow) -> Self {
        Url::new(
            row.short_url,
            row.original_url,
            row.user_id,
            row.created_at,
            row.is_deleted,
        )
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn add(
        &self,
        user_id: &str,
        short_url: &str,
        original_url: &str,
    ) -> Result<String, AppError> {
        sqlx::query(INSERT_URL_SQL)
            .bind(short_url)
            .bind(original_url)
            .bind(user_id)
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(short_url.to_string())
    }

    async fn get_by_short_url(&self, short_url: &str) -> Result<String, AppError> {
        let row: Option<(String, bool)> = sqlx::query_as(GET_BY_SHORT_URL_SQL)
            .bind(short_url)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            None => Err(AppError::UrlNotFound),
            Some((_, true)) => Err(AppError::UrlDeleted),
            Some((original_url, false)) => Ok(original_url),
        }
    }

    async fn get_by_original_url(&self, original_url: &str) -> Result<String, AppError> {
        let row: Option<(String,)> = sqlx::query_as(GET_BY_ORIGINAL_URL_SQL)
            .bind(original_url)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        row.map(|(short_url,)| short_url)
            .ok_or(AppError::UrlNotFound)
    }

    async fn add_batch(&self, user_id: &str, batch: &[NewUrl]) -> Result<(), AppError> {
        // One transaction per batch; dropping it on an early return rolls
        // back every row inserted so far.
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let now = Utc::now();
        for new_url in batch {
            sqlx::query(INSERT_URL_SQL)
                .bind(&new_url.short_url)
                .bind(&new_url.original_url)
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn get_user_urls(&self, user_id: &str) -> Result<Vec<Url>, AppError> {
        let rows: Vec<UrlRow> = sqlx::query_as(GET_USER_URLS_SQL)
            .bind(user_id)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Url::from).collect())
    }

    async fn mark_deleted_batch(
        &self,
        user_id: &str,
        short_urls: &[String],
    ) -> Result<(), AppError> {
        if short_urls.is_empty() {
            return Ok(());
        }

        sqlx::query(MARK_DELETED_SQL)
            .bind(short_urls)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query(PING_SQL)
            .execute(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_stats(&self) -> Result<StorageStats, AppError> {
        let (urls, users): (i64, i64) = sqlx::query_as(GET_STATS_SQL)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(StorageStats { urls, users })
    }

    async fn close(&self) -> Result<(), AppError> {
        self.pool.close().await;
        Ok(())
    }
}
