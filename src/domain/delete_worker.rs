//! Background worker coalescing per-user URL deletions into batches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};

use crate::domain::repositories::UrlRepository;

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_BATCH_SIZE: usize = 50;
const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Maximum time a single `mark_deleted_batch` call may take. Independent of
/// the originating request, which has already been answered with 202.
const BATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// A request to tombstone a user's short URLs.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub user_id: String,
    pub short_urls: Vec<String>,
}

/// Tuning knobs for [`DeleteWorker`].
#[derive(Debug, Clone)]
pub struct DeleteWorkerConfig {
    /// Intake channel capacity. Requests beyond it are processed inline.
    pub queue_capacity: usize,
    /// A user's pending list of this size is dispatched immediately.
    pub batch_size: usize,
    /// Pending entries older than this are flushed on the next tick.
    pub flush_interval: Duration,
}

impl Default for DeleteWorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

/// Fan-in batcher for URL deletions.
///
/// Requests enter through a bounded channel and are coalesced per user by a
/// single long-lived task. A user's batch is dispatched to the store once it
/// reaches `batch_size`, and every pending entry is dispatched once
/// `flush_interval` has passed since the last dispatch. Dispatch errors are
/// logged, never retried, and never reported upstream.
///
/// # Back-pressure
///
/// [`DeleteWorker::enqueue_delete`] never blocks. When the intake channel is
/// full the request is handed to a freshly spawned task that invokes the
/// store directly, and the call reports that the request was not buffered.
///
/// # Shutdown
///
/// [`DeleteWorker::shutdown`] signals the loop, which dispatches all pending
/// entries and exits; the call returns after the loop task has been joined.
/// Requests enqueued after shutdown are dropped.
///
/// # Metrics
///
/// - `delete_worker_received_total` - requests taken from the channel
/// - `delete_worker_inline_total`   - requests processed inline on overflow
/// - `delete_worker_batches_total`  - batches dispatched to the store
/// - `delete_worker_failed_total`   - batches that failed or timed out
pub struct DeleteWorker {
    repository: Arc<dyn UrlRepository>,
    tx: mpsc::Sender<DeleteRequest>,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DeleteWorker {
    /// Creates the worker and spawns its processing loop.
    pub fn new(repository: Arc<dyn UrlRepository>, config: DeleteWorkerConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(process_delete_requests(
            repository.clone(),
            rx,
            shutdown_rx,
            config.batch_size,
            config.flush_interval,
        ));

        Self {
            repository,
            tx,
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queues a delete request.
    ///
    /// Returns `true` when the request was buffered for batching, `false`
    /// when the channel was full and it was processed inline instead, or
    /// when the worker has already shut down (the request is dropped).
    pub fn enqueue_delete(&self, request: DeleteRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                metrics::counter!("delete_worker_inline_total").increment(1);
                tracing::warn!(
                    user_id = %request.user_id,
                    url_count = request.short_urls.len(),
                    "delete queue is full, processing inline"
                );
                let repository = self.repository.clone();
                tokio::spawn(async move {
                    process_batch(repository.as_ref(), &request.user_id, &request.short_urls)
                        .await;
                });
                false
            }
            Err(TrySendError::Closed(request)) => {
                tracing::warn!(
                    user_id = %request.user_id,
                    url_count = request.short_urls.len(),
                    "delete worker is stopped, dropping request"
                );
                false
            }
        }
    }

    /// Signals the loop to flush and exit, then waits for it.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down delete worker");
        let _ = self.shutdown_tx.send(true);

        let handle = self.handle.lock().expect("worker handle lock").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        tracing::info!("delete worker shutdown complete");
    }
}

/// The worker loop: fan-in over the intake channel with size- and
/// time-triggered dispatch.
async fn process_delete_requests(
    repository: Arc<dyn UrlRepository>,
    mut rx: mpsc::Receiver<DeleteRequest>,
    mut shutdown_rx: watch::Receiver<bool>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut pending: HashMap<String, Vec<String>> = HashMap::new();
    let mut last_flush = Instant::now();

    let mut ticker = tokio::time::interval(flush_interval / 5);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            request = rx.recv() => {
                match request {
                    Some(request) => {
                        metrics::counter!("delete_worker_received_total").increment(1);
                        pending
                            .entry(request.user_id)
                            .or_default()
                            .extend(request.short_urls);

                        let full: Vec<String> = pending
                            .iter()
                            .filter(|(_, urls)| urls.len() >= batch_size)
                            .map(|(user_id, _)| user_id.clone())
                            .collect();
                        for user_id in full {
                            if let Some(short_urls) = pending.remove(&user_id) {
                                process_batch(repository.as_ref(), &user_id, &short_urls).await;
                                last_flush = Instant::now();
                            }
                        }
                    }
                    // Intake closed: same as shutdown.
                    None => {
                        flush_all(repository.as_ref(), &mut pending).await;
                        return;
                    }
                }
            }
            _ = ticker.tick() => {
                if last_flush.elapsed() >= flush_interval && !pending.is_empty() {
                    flush_all(repository.as_ref(), &mut pending).await;
                    last_flush = Instant::now();
                }
            }
            _ = shutdown_rx.changed() => {
                tracing::info!("stopping delete request processor");
                flush_all(repository.as_ref(), &mut pending).await;
                return;
            }
        }
    }
}

/// Dispatches one user's batch with the per-batch timeout. Failures are
/// logged and discarded.
async fn process_batch(repository: &dyn UrlRepository, user_id: &str, short_urls: &[String]) {
    metrics::counter!("delete_worker_batches_total").increment(1);

    match timeout(
        BATCH_TIMEOUT,
        repository.mark_deleted_batch(user_id, short_urls),
    )
    .await
    {
        Ok(Ok(())) => {
            tracing::info!(
                user_id = %user_id,
                count = short_urls.len(),
                "marked URLs as deleted"
            );
        }
        Ok(Err(e)) => {
            metrics::counter!("delete_worker_failed_total").increment(1);
            tracing::error!(
                user_id = %user_id,
                count = short_urls.len(),
                error = %e,
                "failed to mark URLs as deleted"
            );
        }
        Err(_) => {
            metrics::counter!("delete_worker_failed_total").increment(1);
            tracing::error!(
                user_id = %user_id,
                count = short_urls.len(),
                "timed out marking URLs as deleted"
            );
        }
    }
}

async fn flush_all(repository: &dyn UrlRepository, pending: &mut HashMap<String, Vec<String>>) {
    for (user_id, short_urls) in pending.drain() {
        if !short_urls.is_empty() {
            process_batch(repository, &user_id, &short_urls).await;
        }
    }
}
