//! URL entity representing a short-to-original mapping.

use chrono::{DateTime, Utc};

/// A stored URL mapping.
///
/// `short_url` is the 8-character identifier and the primary key of every
/// backend; `original_url` is uniquely indexed. `user_id` is set at insert
/// and never changes. `is_deleted` is a tombstone: it only ever transitions
/// from `false` to `true`, and the record is retained afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    pub short_url: String,
    pub original_url: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Url {
    pub fn new(
        short_url: String,
        original_url: String,
        user_id: String,
        created_at: DateTime<Utc>,
        is_deleted: bool,
    ) -> Self {
        Self {
            short_url,
            original_url,
            user_id,
            created_at,
            is_deleted,
        }
    }
}

/// Input pair for batch inserts. The short URL is pre-generated by the URL
/// service before the pair reaches a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUrl {
    pub short_url: String,
    pub original_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_creation() {
        let now = Utc::now();
        let url = Url::new(
            "abCD1234".to_string(),
            "https://example.com".to_string(),
            "user-1".to_string(),
            now,
            false,
        );

        assert_eq!(url.short_url, "abCD1234");
        assert_eq!(url.original_url, "https://example.com");
        assert_eq!(url.user_id, "user-1");
        assert_eq!(url.created_at, now);
        assert!(!url.is_deleted);
    }
}
