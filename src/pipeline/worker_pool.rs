use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use log::{debug, error, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::fetcher::adapter::ComicFetcher;
use crate::metrics::METRICS;
use crate::schema::{FetchOutcome, Job};

/// A running set of workers.
///
/// Hand it to `lifecycle::await_all` to join every worker and close
/// the result queue.
pub struct WorkerPool {
    pub(crate) workers: JoinSet<usize>,
    pub(crate) spawned: usize,
}

/// Starts `worker_count` workers sharing one fetcher.
///
/// Each worker owns a clone of both queue handles. Workers never
/// talk to each other; all coordination goes through the queues.
///
/// The caller keeps its own result sender and must not close it
/// before the pool has been joined.
pub fn spawn(
    worker_count: usize,
    fetcher: Arc<dyn ComicFetcher>,
    jobs: Receiver<Job>,
    results: &Sender<FetchOutcome>,
    cancel: &CancellationToken,
) -> WorkerPool {
    let mut workers = JoinSet::new();

    for worker_id in 0..worker_count {
        workers.spawn(run_worker(
            worker_id,
            fetcher.clone(),
            jobs.clone(),
            results.clone(),
            cancel.clone(),
        ));
    }

    debug!("spawned {} {} workers", worker_count, fetcher.name());

    WorkerPool {
        workers,
        spawned: worker_count,
    }
}

/// Worker loop.
///
/// - Claims the next job (suspends while the work queue is empty)
/// - Fetches it and converts the result into an outcome
/// - Pushes every outcome, empty or failed included, to the result queue
///
/// Exits when the work queue is closed and drained, or on cancellation.
/// A fetch failure is logged and forwarded, never fatal to the worker.
///
/// Returns how many outcomes this worker delivered.
async fn run_worker(
    worker_id: usize,
    fetcher: Arc<dyn ComicFetcher>,
    jobs: Receiver<Job>,
    results: Sender<FetchOutcome>,
    cancel: CancellationToken,
) -> usize {
    METRICS.workers_active.fetch_add(1, Ordering::Relaxed);
    let mut delivered = 0;

    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = jobs.recv() => match next {
                Ok(job) => job,
                // closed and drained
                Err(_) => break,
            },
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("worker {} abandoning comic #{}", worker_id, job.id);
                break;
            }
            result = fetcher.fetch_one(job.id) => result,
        };

        let outcome = FetchOutcome::from_result(job, result);
        match &outcome {
            FetchOutcome::Success(_) => {
                METRICS.records_fetched.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Empty { id } => {
                debug!("comic #{} not available, forwarding empty outcome", id);
                METRICS.empty_responses.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Failure { id, error } => {
                warn!("Error fetching resource (job #{}): {}", id, error);
                METRICS.fetch_failures.fetch_add(1, Ordering::Relaxed);
            }
        }

        if results.send(outcome).await.is_err() {
            // Only possible if the result queue was closed under a live worker.
            error!("worker {} found the result queue closed, exiting", worker_id);
            break;
        }
        delivered += 1;
    }

    METRICS.workers_active.fetch_sub(1, Ordering::Relaxed);
    debug!("worker {} exiting after {} jobs", worker_id, delivered);
    delivered
}
