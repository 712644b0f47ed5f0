//! File-backed URL storage.
//!
//! Holds the same in-memory map as the memory backend and persists it as
//! newline-delimited JSON. A background task rewrites the whole file
//! whenever the state is dirty, on a fixed interval; `close` performs one
//! final snapshot.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::entities::{NewUrl, Url};
use crate::domain::repositories::{StorageStats, UrlRepository};
use crate::error::AppError;

const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(10);

/// One persisted URL mapping.
///
/// `user_id` and `is_deleted` extend the original on-disk schema; both
/// default when absent so files written without them still load. Lines that
/// fail to parse entirely are skipped.
#[derive(Debug, Serialize, Deserialize)]
struct UrlRecord {
    uuid: String,
    short_url: String,
    original_url: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    is_deleted: bool,
}

struct StoredUrl {
    uuid: u64,
    url: Url,
}

#[derive(Default)]
struct FileState {
    urls: HashMap<String, StoredUrl>,
    last_uuid: u64,
}

/// Tuning knobs for [`FileUrlRepository`].
#[derive(Debug, Clone)]
pub struct FileRepositoryConfig {
    /// How often the saver task checks the dirty flag.
    pub save_interval: Duration,
}

impl Default for FileRepositoryConfig {
    fn default() -> Self {
        Self {
            save_interval: DEFAULT_SAVE_INTERVAL,
        }
    }
}

/// URL store persisted to a JSON-lines file.
///
/// Mutations set a dirty flag under the write lock; the saver task clones
/// the map under the read lock and writes the file with no lock held.
pub struct FileUrlRepository {
    state: Arc<RwLock<FileState>>,
    dirty: Arc<AtomicBool>,
    path: Arc<PathBuf>,
    stop_tx: watch::Sender<bool>,
    saver: Mutex<Option<JoinHandle<()>>>,
}

impl FileUrlRepository {
    /// Opens (or creates) the storage file at `path`, restores its records,
    /// and starts the periodic saver.
    pub async fn new(
        path: impl Into<PathBuf>,
        config: FileRepositoryConfig,
    ) -> Result<Self, AppError> {
        let path = Arc::new(path.into());
        let state = Arc::new(RwLock::new(restore(&path).await?));
        let dirty = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = watch::channel(false);

        let saver = tokio::spawn(periodic_save(
            state.clone(),
            dirty.clone(),
            path.clone(),
            stop_rx,
            config.save_interval,
        ));

        Ok(Self {
            state,
            dirty,
            path,
            stop_tx,
            saver: Mutex::new(Some(saver)),
        })
    }

    fn snapshot(&self) -> Vec<UrlRecord> {
        let state = self.state.read().expect("file state lock");
        records_of(&state)
    }
}

#[async_trait]
impl UrlRepository for FileUrlRepository {
    async fn add(
        &self,
        user_id: &str,
        short_url: &str,
        original_url: &str,
    ) -> Result<String, AppError> {
        {
            let mut state = self.state.write().expect("file state lock");

            if let Some(existing) = state
                .urls
                .values()
                .find(|stored| stored.url.original_url == original_url)
            {
                return Err(AppError::UrlExists {
                    short_url: existing.url.short_url.clone(),
                });
            }

            state.last_uuid += 1;
            let uuid = state.last_uuid;
            state.urls.insert(
                short_url.to_string(),
                StoredUrl {
                    uuid,
                    url: Url::new(
                        short_url.to_string(),
                        original_url.to_string(),
                        user_id.to_string(),
                        Utc::now(),
                        false,
                    ),
                },
            );
        }
        self.dirty.store(true, Ordering::Release);
        tracing::debug!(short_url, original_url, "stored URL");
        Ok(short_url.to_string())
    }

    async fn get_by_short_url(&self, short_url: &str) -> Result<String, AppError> {
        let state = self.state.read().expect("file state lock");

        let stored = state.urls.get(short_url).ok_or(AppError::UrlNotFound)?;
        if stored.url.is_deleted {
            return Err(AppError::UrlDeleted);
        }
        Ok(stored.url.original_url.clone())
    }

    async fn get_by_original_url(&self, original_url: &str) -> Result<String, AppError> {
        let state = self.state.read().expect("file state lock");

        state
            .urls
            .values()
            .find(|stored| stored.url.original_url == original_url)
            .map(|stored| stored.url.short_url.clone())
            .ok_or(AppError::UrlNotFound)
    }

    async fn add_batch(&self, user_id: &str, batch: &[NewUrl]) -> Result<(), AppError> {
        {
            let mut state = self.state.write().expect("file state lock");

            let now = Utc::now();
            for new_url in batch {
                state.last_uuid += 1;
                let uuid = state.last_uuid;
                state.urls.insert(
                    new_url.short_url.clone(),
                    StoredUrl {
                        uuid,
                        url: Url::new(
                            new_url.short_url.clone(),
                            new_url.original_url.clone(),
                            user_id.to_string(),
                            now,
                            false,
                        ),
                    },
                );
            }
        }
        self.dirty.store(true, Ordering::Release);
        tracing::debug!(user_id, count = batch.len(), "stored URL batch");
        Ok(())
    }

    async fn get_user_urls(&self, user_id: &str) -> Result<Vec<Url>, AppError> {
        let state = self.state.read().expect("file state lock");

        Ok(state
            .urls
            .values()
            .filter(|stored| stored.url.user_id == user_id)
            .map(|stored| stored.url.clone())
            .collect())
    }

    async fn mark_deleted_batch(
        &self,
        user_id: &str,
        short_urls: &[String],
    ) -> Result<(), AppError> {
        let mut marked = false;
        {
            let mut state = self.state.write().expect("file state lock");

            for short_url in short_urls {
                if let Some(stored) = state.urls.get_mut(short_url)
                    && stored.url.user_id == user_id
                {
                    stored.url.is_deleted = true;
                    marked = true;
                }
            }
        }
        if marked {
            self.dirty.store(true, Ordering::Release);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_stats(&self) -> Result<StorageStats, AppError> {
        let state = self.state.read().expect("file state lock");

        let mut users = HashSet::new();
        let mut live = 0i64;
        for stored in state.urls.values() {
            if !stored.url.is_deleted {
                live += 1;
            }
            users.insert(stored.url.user_id.as_str());
        }

        Ok(StorageStats {
            urls: live,
            users: users.len() as i64,
        })
    }

    async fn close(&self) -> Result<(), AppError> {
        let _ = self.stop_tx.send(true);

        let saver = self.saver.lock().expect("saver handle lock").take();
        if let Some(saver) = saver {
            let _ = saver.await;
        }

        if self.dirty.swap(false, Ordering::AcqRel) {
            save(&self.path, self.snapshot()).await?;
        }
        Ok(())
    }
}

/// Loads the state from the storage file. A missing file yields an empty
/// state; unparseable lines are skipped.
async fn restore(path: &PathBuf) -> Result<FileState, AppError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(AppError::internal(
                "Failed to read storage file",
                json!({ "path": path.display().to_string(), "cause": e.to_string() }),
            ));
        }
    };

    let mut state = FileState::default();
    for line in contents.lines() {
        let Ok(record) = serde_json::from_str::<UrlRecord>(line) else {
            continue;
        };

        let uuid: u64 = record.uuid.parse().unwrap_or(0);
        state.last_uuid = state.last_uuid.max(uuid);
        state.urls.insert(
            record.short_url.clone(),
            StoredUrl {
                uuid,
                url: Url::new(
                    record.short_url,
                    record.original_url,
                    record.user_id,
                    Utc::now(),
                    record.is_deleted,
                ),
            },
        );
    }

    Ok(state)
}

fn records_of(state: &FileState) -> Vec<UrlRecord> {
    state
        .urls
        .values()
        .map(|stored| UrlRecord {
            uuid: stored.uuid.to_string(),
            short_url: stored.url.short_url.clone(),
            original_url: stored.url.original_url.clone(),
            user_id: stored.url.user_id.clone(),
            is_deleted: stored.url.is_deleted,
        })
        .collect()
}

/// Rewrites the whole storage file from a snapshot: truncate, sequential
/// write, flush.
async fn save(path: &PathBuf, records: Vec<UrlRecord>) -> Result<(), AppError> {
    let io_error = |e: std::io::Error| {
        AppError::internal(
            "Failed to write storage file",
            json!({ "path": path.display().to_string(), "cause": e.to_string() }),
        )
    };

    let file = tokio::fs::File::create(path).await.map_err(io_error)?;
    let mut writer = tokio::io::BufWriter::new(file);

    for record in records {
        let line = serde_json::to_vec(&record).map_err(|e| {
            AppError::internal(
                "Failed to serialize storage record",
                json!({ "cause": e.to_string() }),
            )
        })?;
        writer.write_all(&line).await.map_err(io_error)?;
        writer.write_all(b"\n").await.map_err(io_error)?;
    }

    writer.flush().await.map_err(io_error)?;
    Ok(())
}

/// Saver task: snapshot under the read lock, write with no lock held.
async fn periodic_save(
    state: Arc<RwLock<FileState>>,
    dirty: Arc<AtomicBool>,
    path: Arc<PathBuf>,
    mut stop_rx: watch::Receiver<bool>,
    save_interval: Duration,
) {
    let mut ticker = tokio::time::interval(save_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if dirty.swap(false, Ordering::AcqRel) {
                    let records = {
                        let state = state.read().expect("file state lock");
                        records_of(&state)
                    };
                    if let Err(e) = save(&path, records).await {
                        // Keep the state marked dirty so the next tick retries.
                        dirty.store(true, Ordering::Release);
                        tracing::error!(error = %e, "periodic save failed");
                    }
                }
            }
            _ = stop_rx.changed() => return,
        }
    }
}
