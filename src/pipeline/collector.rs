use std::sync::atomic::Ordering;

use async_channel::Receiver;
use log::info;
use tokio::sync::oneshot;

use crate::metrics::METRICS;
use crate::schema::{FetchOutcome, ResultCollection};

/// What the collector saw over a whole run.
#[derive(Debug, Default)]
pub struct CollectionReport {
    /// Accepted comics, in arrival order
    pub records: ResultCollection,

    /// Every outcome received, accepted or not
    pub outcomes_received: usize,

    /// Empty, failed and zero-numbered outcomes
    pub discarded: usize,
}

/// Drains the result queue into a collection.
///
/// Suspends while the queue is empty and open, and returns once it
/// is closed and drained. The collection is owned here and nowhere
/// else until it is returned.
pub async fn collect(results: Receiver<FetchOutcome>) -> CollectionReport {
    let mut report = CollectionReport::default();

    while let Ok(outcome) = results.recv().await {
        report.outcomes_received += 1;

        match outcome.into_record() {
            Some(comic) => {
                info!("Retrieved comic #{} titled '{}'", comic.num, comic.title);
                METRICS.records_collected.fetch_add(1, Ordering::Relaxed);
                report.records.push(comic);
            }
            None => report.discarded += 1,
        }
    }

    report
}

/// Runs `collect` on its own task.
///
/// The returned receiver is the collector's done signal: it resolves
/// with the finished report once every outcome has been accounted for.
pub fn spawn_collector(results: Receiver<FetchOutcome>) -> oneshot::Receiver<CollectionReport> {
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let report = collect(results).await;
        // The orchestrator may have gone away on a fatal path.
        let _ = done_tx.send(report);
    });

    done_rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::adapter::FetchError;
    use crate::schema::Comic;

    fn comic(num: u32, title: &str) -> Comic {
        Comic {
            num,
            title: title.to_string(),
            ..Comic::default()
        }
    }

    #[tokio::test]
    async fn keeps_successes_in_arrival_order() {
        let (tx, rx) = async_channel::bounded(8);
        tx.send(FetchOutcome::Success(comic(7, "Girl Sleeping"))).await.unwrap();
        tx.send(FetchOutcome::Empty { id: 404 }).await.unwrap();
        tx.send(FetchOutcome::Success(comic(2, "Petit Trees"))).await.unwrap();
        tx.send(FetchOutcome::Failure {
            id: 5,
            error: FetchError::Transport { id: 5, reason: "reset".into() },
        })
        .await
        .unwrap();
        tx.send(FetchOutcome::Success(Comic::default())).await.unwrap();
        tx.close();

        let report = collect(rx).await;
        let nums: Vec<u32> = report.records.iter().map(|c| c.num).collect();
        assert_eq!(nums, vec![7, 2]);
        assert_eq!(report.outcomes_received, 5);
        assert_eq!(report.discarded, 3);
    }

    #[tokio::test]
    async fn done_signal_fires_only_after_close() {
        let (tx, rx) = async_channel::bounded(1);
        let mut done = spawn_collector(rx);

        tx.send(FetchOutcome::Success(comic(1, "Barrel - Part 1"))).await.unwrap();
        tokio::task::yield_now().await;
        assert!(done.try_recv().is_err());

        tx.close();
        let report = done.await.unwrap();
        assert_eq!(report.records.len(), 1);
    }
}
