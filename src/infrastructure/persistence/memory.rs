//! In-memory URL storage.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::entities::{NewUrl, Url};
use crate::domain::repositories::{StorageStats, UrlRepository};
use crate::error::AppError;

/// Map-backed store guarded by a reader-writer lock.
///
/// Lookups by short URL are O(1); lookups by original URL, per-user listing,
/// and stats walk the map. The lock is never held across an await point.
#[derive(Default)]
pub struct MemoryUrlRepository {
    urls: RwLock<HashMap<String, Url>>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn add(
        &self,
        user_id: &str,
        short_url: &str,
        original_url: &str,
    ) -> Result<String, AppError> {
        let mut urls = self.urls.write().expect("urls lock");

        if let Some(existing) = urls.values().find(|url| url.original_url == original_url) {
            return Err(AppError::UrlExists {
                short_url: existing.short_url.clone(),
            });
        }

        urls.insert(
            short_url.to_string(),
            Url::new(
                short_url.to_string(),
                original_url.to_string(),
                user_id.to_string(),
                Utc::now(),
                false,
            ),
        );
        tracing::debug!(short_url, original_url, "stored URL");
        Ok(short_url.to_string())
    }

    async fn get_by_short_url(&self, short_url: &str) -> Result<String, AppError> {
        let urls = self.urls.read().expect("urls lock");

        let url = urls.get(short_url).ok_or(AppError::UrlNotFound)?;
        if url.is_deleted {
            return Err(AppError::UrlDeleted);
        }
        Ok(url.original_url.clone())
    }

    async fn get_by_original_url(&self, original_url: &str) -> Result<String, AppError> {
        let urls = self.urls.read().expect("urls lock");

        urls.values()
            .find(|url| url.original_url == original_url)
            .map(|url| url.short_url.clone())
            .ok_or(AppError::UrlNotFound)
    }

    async fn add_batch(&self, user_id: &str, batch: &[NewUrl]) -> Result<(), AppError> {
        let mut urls = self.urls.write().expect("urls lock");

        let now = Utc::now();
        for new_url in batch {
            urls.insert(
                new_url.short_url.clone(),
                Url::new(
                    new_url.short_url.clone(),
                    new_url.original_url.clone(),
                    user_id.to_string(),
                    now,
                    false,
                ),
            );
        }
        tracing::debug!(user_id, count = batch.len(), "stored URL batch");
        Ok(())
    }

    async fn get_user_urls(&self, user_id: &str) -> Result<Vec<Url>, AppError> {
        let urls = self.urls.read().expect("urls lock");

        Ok(urls
            .values()
            .filter(|url| url.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_deleted_batch(
        &self,
        user_id: &str,
        short_urls: &[String],
    ) -> Result<(), AppError> {
        let mut urls = self.urls.write().expect("urls lock");

        for short_url in short_urls {
            if let Some(url) = urls.get_mut(short_url)
                && url.user_id == user_id
            {
                url.is_deleted = true;
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_stats(&self) -> Result<StorageStats, AppError> {
        let urls = self.urls.read().expect("urls lock");

        let mut users = HashSet::new();
        let mut live = 0i64;
        for url in urls.values() {
            if !url.is_deleted {
                live += 1;
            }
            users.insert(url.user_id.as_str());
        }

        Ok(StorageStats {
            urls: live,
            users: users.len() as i64,
        })
    }

    async fn close(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_then_lookup_both_ways() {
        let repo = MemoryUrlRepository::new();

        let stored = repo
            .add("user-1", "abCD1234", "https://example.com")
            .await
            .unwrap();
        assert_eq!(stored, "abCD1234");

        assert_eq!(
            repo.get_by_short_url("abCD1234").await.unwrap(),
            "https://example.com"
        );
        assert_eq!(
            repo.get_by_original_url("https://example.com").await.unwrap(),
            "abCD1234"
        );
    }

    #[tokio::test]
    async fn test_duplicate_original_reports_existing_short_url() {
        let repo = MemoryUrlRepository::new();
        repo.add("user-1", "abCD1234", "https://example.com")
            .await
            .unwrap();

        let err = repo
            .add("user-2", "zzZZ9999", "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::UrlExists { short_url } if short_url == "abCD1234"
        ));

        // No second record was created.
        assert!(repo.get_by_short_url("zzZZ9999").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_short_url_is_not_found() {
        let repo = MemoryUrlRepository::new();

        assert!(matches!(
            repo.get_by_short_url("missing1").await.unwrap_err(),
            AppError::UrlNotFound
        ));
    }

    #[tokio::test]
    async fn test_deleted_record_behavior() {
        let repo = MemoryUrlRepository::new();
        repo.add("user-1", "abCD1234", "https://example.com")
            .await
            .unwrap();

        repo.mark_deleted_batch("user-1", &["abCD1234".to_string()])
            .await
            .unwrap();

        // Short-URL lookup reports the tombstone.
        assert!(matches!(
            repo.get_by_short_url("abCD1234").await.unwrap_err(),
            AppError::UrlDeleted
        ));
        // Original-URL lookup still resolves.
        assert_eq!(
            repo.get_by_original_url("https://example.com").await.unwrap(),
            "abCD1234"
        );
        // The record still belongs to its owner.
        let urls = repo.get_user_urls("user-1").await.unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].is_deleted);
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_a_no_op() {
        let repo = MemoryUrlRepository::new();
        repo.add("user-1", "abCD1234", "https://example.com")
            .await
            .unwrap();

        repo.mark_deleted_batch("user-2", &["abCD1234".to_string()])
            .await
            .unwrap();

        assert_eq!(
            repo.get_by_short_url("abCD1234").await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn test_mark_deleted_is_idempotent_and_skips_missing() {
        let repo = MemoryUrlRepository::new();
        repo.add("user-1", "abCD1234", "https://example.com")
            .await
            .unwrap();

        let batch = ["abCD1234".to_string(), "missing1".to_string()];
        repo.mark_deleted_batch("user-1", &batch).await.unwrap();
        repo.mark_deleted_batch("user-1", &batch).await.unwrap();

        assert!(matches!(
            repo.get_by_short_url("abCD1234").await.unwrap_err(),
            AppError::UrlDeleted
        ));
    }

    #[tokio::test]
    async fn test_get_user_urls_empty_for_unknown_user() {
        let repo = MemoryUrlRepository::new();

        assert!(repo.get_user_urls("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_exclude_deleted_urls_but_keep_their_owners() {
        let repo = MemoryUrlRepository::new();
        repo.add("user-1", "aaaa1111", "https://a.example")
            .await
            .unwrap();
        repo.add("user-2", "bbbb2222", "https://b.example")
            .await
            .unwrap();
        repo.mark_deleted_batch("user-2", &["bbbb2222".to_string()])
            .await
            .unwrap();

        let stats = repo.get_stats().await.unwrap();
        assert_eq!(stats.urls, 1);
        assert_eq!(stats.users, 2);
    }

    #[tokio::test]
    async fn test_add_batch_stores_all_records() {
        let repo = MemoryUrlRepository::new();

        repo.add_batch(
            "user-1",
            &[
                NewUrl {
                    short_url: "aaaa1111".to_string(),
                    original_url: "https://a.example".to_string(),
                },
                NewUrl {
                    short_url: "bbbb2222".to_string(),
                    original_url: "https://b.example".to_string(),
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            repo.get_by_short_url("aaaa1111").await.unwrap(),
            "https://a.example"
        );
        assert_eq!(repo.get_user_urls("user-1").await.unwrap().len(), 2);
    }
}
