//! URL shortening use-case.

use std::sync::Arc;

use crate::domain::delete_worker::{DeleteRequest, DeleteWorker};
use crate::domain::entities::{NewUrl, Url};
use crate::domain::repositories::{StorageStats, UrlRepository};
use crate::error::AppError;
use crate::utils::idgen::generate_short_id;

/// Orchestrates the identifier generator, the storage backend, and the
/// delete worker.
///
/// The repository is the runtime-selected backend; the worker is optional so
/// the service can run without asynchronous deletion (tests, tooling).
pub struct UrlService {
    repository: Arc<dyn UrlRepository>,
    worker: Option<Arc<DeleteWorker>>,
}

impl UrlService {
    pub fn new(repository: Arc<dyn UrlRepository>, worker: Option<Arc<DeleteWorker>>) -> Self {
        Self { repository, worker }
    }

    /// Shortens a single URL for `user_id` and returns the short identifier.
    ///
    /// # Duplicate originals
    ///
    /// When the backend reports the original URL as already mapped, either
    /// directly ([`AppError::UrlExists`], in-memory and file backends) or as
    /// a raw uniqueness violation (Postgres), the existing short URL is
    /// looked up and returned inside [`AppError::UrlExists`]. A uniqueness
    /// violation on the short-URL key itself is not retried and surfaces as
    /// a backend error.
    pub async fn add(&self, user_id: &str, original_url: &str) -> Result<String, AppError> {
        let short_url = generate_short_id()?;

        match self.repository.add(user_id, &short_url, original_url).await {
            Ok(short_url) => Ok(short_url),
            Err(AppError::UrlExists { short_url }) => Err(AppError::UrlExists { short_url }),
            Err(AppError::UniqueViolation { constraint })
                if constraint.as_deref() != Some("urls_pkey") =>
            {
                let existing = self.repository.get_by_original_url(original_url).await?;
                Err(AppError::UrlExists {
                    short_url: existing,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves a short URL to the original URL.
    pub async fn get_by_short_url(&self, short_url: &str) -> Result<String, AppError> {
        self.repository.get_by_short_url(short_url).await
    }

    /// Resolves an original URL to its short URL.
    pub async fn get_by_original_url(&self, original_url: &str) -> Result<String, AppError> {
        self.repository.get_by_original_url(original_url).await
    }

    /// Shortens a batch of URLs, reusing existing mappings.
    ///
    /// Each input is probed by original URL first: known originals join the
    /// response with their existing short URL, unknown ones get a freshly
    /// generated identifier and are inserted in one backend batch. The
    /// response preserves input order.
    pub async fn add_batch(
        &self,
        user_id: &str,
        original_urls: &[String],
    ) -> Result<Vec<NewUrl>, AppError> {
        let mut to_insert = Vec::with_capacity(original_urls.len());
        let mut result = Vec::with_capacity(original_urls.len());

        for original_url in original_urls {
            match self.repository.get_by_original_url(original_url).await {
                Ok(existing) => {
                    result.push(NewUrl {
                        short_url: existing,
                        original_url: original_url.clone(),
                    });
                }
                Err(AppError::UrlNotFound) => {
                    let short_url = generate_short_id()?;
                    to_insert.push(NewUrl {
                        short_url: short_url.clone(),
                        original_url: original_url.clone(),
                    });
                    result.push(NewUrl {
                        short_url,
                        original_url: original_url.clone(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if !to_insert.is_empty() {
            self.repository.add_batch(user_id, &to_insert).await?;
        }

        Ok(result)
    }

    /// Returns every record owned by `user_id`, live and tombstoned.
    pub async fn get_user_urls(&self, user_id: &str) -> Result<Vec<Url>, AppError> {
        self.repository.get_user_urls(user_id).await
    }

    /// Queues the user's short URLs for asynchronous deletion.
    ///
    /// Always succeeds from the caller's perspective; the 202 answered
    /// upstream is not a durability promise.
    pub fn delete_user_urls(&self, user_id: &str, short_urls: Vec<String>) {
        tracing::info!(
            user_id = %user_id,
            count = short_urls.len(),
            "queueing user URLs for deletion"
        );
        if let Some(worker) = &self.worker {
            worker.enqueue_delete(DeleteRequest {
                user_id: user_id.to_string(),
                short_urls,
            });
        }
    }

    /// Reports storage liveness.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }

    /// Aggregate counts for the internal stats endpoint.
    pub async fn get_stats(&self) -> Result<StorageStats, AppError> {
        self.repository.get_stats().await
    }

    /// Drains the delete worker and releases the storage backend.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        if let Some(worker) = &self.worker {
            worker.shutdown().await;
        }
        self.repository.close().await
    }
}
