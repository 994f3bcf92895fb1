//! Worker pool implementation.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::WorkItem;
use crate::config::ConfigError;
use crate::events::{BatchEvent, EventSink, TracingSink};
use crate::fetcher::{FetchError, FetchRequest, Fetcher};

use super::config::DispatcherConfig;
use super::types::{DispatcherStatus, Outcome, OutcomeStatus};

/// Items sharing one output file stem. Only the first is fetched; the others
/// receive a copy of its outcome.
type StemGroup = Vec<WorkItem>;

/// Shared queue of groups not yet taken by a worker.
type WorkQueue = Arc<Mutex<VecDeque<StemGroup>>>;

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicUsize,
    peak_active: AtomicUsize,
    queued: AtomicUsize,
    total_succeeded: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, concurrency: usize) -> DispatcherStatus {
        DispatcherStatus {
            concurrency,
            active: self.active.load(Ordering::Relaxed),
            peak_active: self.peak_active.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            total_succeeded: self.total_succeeded.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }

    /// Marks a group as taken; the fetch counts as active until the slot drops.
    fn started(self: &Arc<Self>, items: usize) -> ActiveSlot {
        self.queued.fetch_sub(items, Ordering::Relaxed);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ActiveSlot(Arc::clone(self))
    }

    fn record(&self, outcome: &Outcome) {
        if outcome.is_success() {
            self.total_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// One in-flight fetch. Releases its slot even if the worker panics.
struct ActiveSlot(Arc<PoolStats>);

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything a worker needs, cloned once per worker.
struct WorkerContext<F: Fetcher> {
    worker_id: usize,
    fetcher: Arc<F>,
    queue: WorkQueue,
    output_dir: PathBuf,
    timeout: Option<Duration>,
    stats: Arc<PoolStats>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
}

/// Runs fetches for a batch of work items with bounded concurrency.
pub struct Dispatcher<F: Fetcher> {
    config: DispatcherConfig,
    fetcher: Arc<F>,
    sink: Arc<dyn EventSink>,
    stats: Arc<PoolStats>,
}

impl<F: Fetcher + 'static> Dispatcher<F> {
    /// Creates a new dispatcher.
    ///
    /// Fails fast when the configured concurrency is 0.
    pub fn new(config: DispatcherConfig, fetcher: Arc<F>) -> Result<Self, ConfigError> {
        if config.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "dispatcher.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            config,
            fetcher,
            sink: Arc::new(TracingSink),
            stats: Arc::new(PoolStats::default()),
        })
    }

    /// Sets the event sink for per-item events.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Returns the current pool counters.
    pub fn status(&self) -> DispatcherStatus {
        self.stats.to_status(self.config.concurrency)
    }

    /// Fetches every item and returns exactly one outcome per item.
    ///
    /// Completion order is not input order. Items with the same file stem are
    /// fetched once and share the outcome, so no two fetches in flight write
    /// to the same path. When `cancel` fires, workers stop taking new items
    /// but let in-flight fetches finish; items never started come back as
    /// failures so they stay pending.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Vec<Outcome> {
        if items.is_empty() {
            return Vec::new();
        }

        let total = items.len();
        let groups = group_by_stem(&items);
        let worker_count = self.config.concurrency.min(groups.len());
        let queue: WorkQueue = Arc::new(Mutex::new(groups.into_iter().collect()));
        self.stats.queued.fetch_add(total, Ordering::Relaxed);

        info!(total, workers = worker_count, "Dispatching work items");

        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let ctx = WorkerContext {
                worker_id,
                fetcher: Arc::clone(&self.fetcher),
                queue: Arc::clone(&queue),
                output_dir: output_dir.to_path_buf(),
                timeout: self.config.fetch_timeout(),
                stats: Arc::clone(&self.stats),
                sink: Arc::clone(&self.sink),
                cancel: cancel.clone(),
                outcome_tx: outcome_tx.clone(),
            };
            workers.push(tokio::spawn(worker_loop(ctx)));
        }
        // Channel closes once every worker has dropped its sender
        drop(outcome_tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = outcome_rx.recv().await {
            outcomes.push(outcome);
        }

        for (worker_id, result) in futures::future::join_all(workers)
            .await
            .into_iter()
            .enumerate()
        {
            if let Err(e) = result {
                error!(worker_id, "Dispatcher worker terminated abnormally: {}", e);
            }
        }

        let undispatched: Vec<WorkItem> = lock_queue(&queue).drain(..).flatten().collect();
        if !undispatched.is_empty() {
            self.stats
                .queued
                .fetch_sub(undispatched.len(), Ordering::Relaxed);
            let reason = if cancel.is_cancelled() {
                self.sink.warn(BatchEvent::BatchCancelled {
                    undispatched: undispatched.len(),
                });
                FetchError::Cancelled.reason()
            } else {
                FetchError::WorkerTerminated.reason()
            };
            for item in undispatched {
                let outcome = Outcome::failure(item, reason.clone());
                self.stats.record(&outcome);
                outcomes.push(outcome);
            }
        }

        let lost = missing_items(&items, &outcomes);
        if !lost.is_empty() {
            warn!(lost = lost.len(), "Items lost by terminated workers");
            for item in lost {
                let outcome = Outcome::failure(item, FetchError::WorkerTerminated.reason());
                self.stats.record(&outcome);
                report_outcome(self.sink.as_ref(), &outcome);
                outcomes.push(outcome);
            }
        }

        debug!(outcomes = outcomes.len(), "Dispatch finished");
        outcomes
    }
}

/// Groups items by file stem, keeping first-seen order.
fn group_by_stem(items: &[WorkItem]) -> Vec<StemGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<StemGroup> = Vec::new();
    for item in items {
        let next = groups.len();
        let i = *index.entry(item.file_stem()).or_insert(next);
        if i == next {
            groups.push(Vec::new());
        }
        groups[i].push(item.clone());
    }
    groups
}

/// Input items without a matching outcome, counting duplicates.
fn missing_items(items: &[WorkItem], outcomes: &[Outcome]) -> Vec<WorkItem> {
    let mut reported: HashMap<&WorkItem, usize> = HashMap::new();
    for outcome in outcomes {
        *reported.entry(&outcome.item).or_default() += 1;
    }

    items
        .iter()
        .filter(|item| match reported.get_mut(item) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

fn lock_queue(queue: &WorkQueue) -> std::sync::MutexGuard<'_, VecDeque<StemGroup>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Long-lived worker: take a group, fetch it once, report every member, repeat.
async fn worker_loop<F: Fetcher + 'static>(ctx: WorkerContext<F>) {
    loop {
        if ctx.cancel.is_cancelled() {
            debug!(worker_id = ctx.worker_id, "Worker stopping on cancellation");
            break;
        }

        let Some(group) = lock_queue(&ctx.queue).pop_front() else {
            break;
        };
        let Some(lead) = group.first().cloned() else {
            continue;
        };

        let slot = ctx.stats.started(group.len());
        ctx.sink.info(BatchEvent::ItemStarted {
            artist: lead.artist.clone(),
            title: lead.title.clone(),
        });

        let outcome = fetch_one(
            Arc::clone(&ctx.fetcher),
            lead,
            &ctx.output_dir,
            ctx.timeout,
        )
        .await;
        drop(slot);

        if group.len() > 1 {
            debug!(
                stem = %outcome.item.file_stem(),
                copies = group.len() - 1,
                "Sharing outcome with items of the same file stem"
            );
        }

        for item in group {
            let outcome = Outcome {
                item,
                status: outcome.status.clone(),
            };
            ctx.stats.record(&outcome);
            report_outcome(ctx.sink.as_ref(), &outcome);

            if ctx.outcome_tx.send(outcome).is_err() {
                // Receiver gone; nobody is collecting any more
                return;
            }
        }
    }
}

/// Fetches one item in its own task so a panic or timeout becomes a failure outcome.
async fn fetch_one<F: Fetcher + 'static>(
    fetcher: Arc<F>,
    item: WorkItem,
    output_dir: &Path,
    timeout: Option<Duration>,
) -> Outcome {
    let request = FetchRequest::for_item(&item, output_dir);
    let handle = tokio::spawn(async move { fetcher.fetch(request).await });
    let abort = handle.abort_handle();

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // Dropping the fetch future kills any child process it owns
                abort.abort();
                let err = FetchError::Timeout {
                    timeout_secs: limit.as_secs(),
                };
                return Outcome::failure(item, err.reason());
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(artifact)) => Outcome::success(item, artifact),
        Ok(Err(e)) => Outcome::failure(item, e.reason()),
        Err(e) => Outcome::failure(item, FetchError::Panicked(join_error_message(e)).reason()),
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn report_outcome(sink: &dyn EventSink, outcome: &Outcome) {
    match &outcome.status {
        OutcomeStatus::Success { artifact } => sink.info(BatchEvent::ItemSucceeded {
            artist: outcome.item.artist.clone(),
            title: outcome.item.title.clone(),
            path: artifact
                .path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            elapsed_ms: artifact.elapsed_ms,
        }),
        OutcomeStatus::Failure { reason } => sink.error(BatchEvent::ItemFailed {
            artist: outcome.item.artist.clone(),
            title: outcome.item.title.clone(),
            reason: reason.clone(),
        }),
    }
}
