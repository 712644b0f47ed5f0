//! Repository trait for URL storage.

use crate::domain::entities::{NewUrl, Url};
use crate::error::AppError;
use async_trait::async_trait;

/// Aggregate service statistics: live URLs and distinct record owners.
///
/// Deleted records are excluded from `urls` but their owners still count
/// toward `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub urls: i64,
    pub users: i64,
}

/// Storage contract implemented by the in-memory, file, and Postgres
/// backends with uniform semantics.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`]
/// - [`crate::infrastructure::persistence::FileUrlRepository`]
/// - [`crate::infrastructure::persistence::PgUrlRepository`]
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Stores a new mapping and returns the stored short URL.
    ///
    /// # Errors
    ///
    /// The in-memory and file backends return [`AppError::UrlExists`]
    /// (carrying the existing short URL) when `original_url` is already
    /// mapped. The Postgres backend surfaces the raw
    /// [`AppError::UniqueViolation`] instead; translation happens in the URL
    /// service. Anything else is [`AppError::Internal`].
    async fn add(
        &self,
        user_id: &str,
        short_url: &str,
        original_url: &str,
    ) -> Result<String, AppError>;

    /// Resolves a short URL to its original URL.
    ///
    /// # Errors
    ///
    /// [`AppError::UrlNotFound`] if absent, [`AppError::UrlDeleted`] if
    /// tombstoned.
    async fn get_by_short_url(&self, short_url: &str) -> Result<String, AppError>;

    /// Resolves an original URL to its short URL.
    ///
    /// Tombstoned records may still be returned; this lookup backs
    /// duplicate-insert conflict recovery.
    ///
    /// # Errors
    ///
    /// [`AppError::UrlNotFound`] if absent.
    async fn get_by_original_url(&self, original_url: &str) -> Result<String, AppError>;

    /// Inserts a batch of pre-generated mappings for one user.
    ///
    /// Atomic per batch: the Postgres backend wraps the inserts in a
    /// transaction rolled back on the first failure; the in-memory and file
    /// backends apply the whole batch under a single critical section.
    async fn add_batch(&self, user_id: &str, urls: &[NewUrl]) -> Result<(), AppError>;

    /// Returns every record owned by `user_id`, live and tombstoned.
    /// Empty list if none.
    async fn get_user_urls(&self, user_id: &str) -> Result<Vec<Url>, AppError>;

    /// Sets the tombstone on every listed record whose owner is `user_id`.
    ///
    /// Records owned by someone else, or not present at all, are skipped
    /// silently. Idempotent.
    async fn mark_deleted_batch(&self, user_id: &str, short_urls: &[String])
    -> Result<(), AppError>;

    /// Reports backend liveness. A round-trip for Postgres; a no-op success
    /// for the in-memory and file backends.
    async fn ping(&self) -> Result<(), AppError>;

    /// Returns aggregate counts for the internal stats endpoint.
    async fn get_stats(&self) -> Result<StorageStats, AppError>;

    /// Releases backend resources. The file backend also performs a final
    /// snapshot if dirty.
    async fn close(&self) -> Result<(), AppError>;
}
