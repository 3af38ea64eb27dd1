use std::sync::atomic::Ordering;

use async_channel::Sender;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::metrics::METRICS;
use crate::schema::Job;

/// Job source: emits ids `1..=n` in increasing order, then closes the
/// work queue.
///
/// Suspends while the queue is full. Stops early, still closing
/// the queue, when the run is cancelled or every worker is gone.
///
/// This is the only task allowed to close the work queue.
///
/// Returns the number of jobs actually emitted.
pub async fn generate(n: u32, queue: Sender<Job>, cancel: CancellationToken) -> u32 {
    let mut emitted = 0;

    for id in 1..=n {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("job source cancelled after {} of {} jobs", emitted, n);
                break;
            }

            sent = queue.send(Job { id }) => {
                if sent.is_err() {
                    debug!("work queue has no consumers left, stopping at job #{}", id);
                    break;
                }
                emitted += 1;
                METRICS.jobs_dispatched.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    queue.close();
    debug!("job source finished, {} jobs emitted", emitted);
    emitted
}
