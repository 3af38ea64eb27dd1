use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    fetcher::adapter::ComicFetcher,
    schema::{FetchOutcome, Job},
};

use super::{
    collector::{self, CollectionReport},
    jobs,
    lifecycle::{self, PoolSummary},
    worker_pool,
};

/// Everything a finished run knows about itself.
#[derive(Debug)]
pub struct PipelineReport {
    pub collection: CollectionReport,
    pub pool: PoolSummary,
    pub jobs_emitted: u32,

    /// The run was cut short by the cancellation token
    pub cancelled: bool,
}

/// Runs one harvest: ids `1..=cfg.total_jobs` through `cfg.workers`
/// workers into a single collection.
///
/// ORDER:
/// 1. spawn the job source and the collector
/// 2. spawn the worker pool and join it (closes the result queue)
/// 3. await the collector's done signal
///
/// Each step happens-after the previous one, so when this returns
/// every outcome produced by a worker is in the report.
///
/// Record order in the collection follows completion, not job id.
pub async fn run_pipeline(
    cfg: &Config,
    fetcher: Arc<dyn ComicFetcher>,
    cancel: CancellationToken,
) -> anyhow::Result<PipelineReport> {
    let (job_tx, job_rx) = async_channel::bounded::<Job>(cfg.queue_capacity);
    let (result_tx, result_rx) = async_channel::bounded::<FetchOutcome>(cfg.queue_capacity);

    // --------------------------------------------------------
    // Producer and consumer ends first
    // --------------------------------------------------------
    let source = tokio::spawn(jobs::generate(cfg.total_jobs, job_tx, cancel.clone()));
    let collector_done = collector::spawn_collector(result_rx);

    // --------------------------------------------------------
    // Worker pool: run to completion, then close results
    // --------------------------------------------------------
    let pool = worker_pool::spawn(cfg.workers, fetcher, job_rx, &result_tx, &cancel);
    let pool = lifecycle::await_all(pool, result_tx).await;

    // --------------------------------------------------------
    // Collector has seen the closed queue once this resolves
    // --------------------------------------------------------
    let collection = collector_done
        .await
        .context("result collector stopped before signalling completion")?;

    // Finished by now: every worker is gone, so the source has
    // either emitted everything or seen its queue lose all receivers.
    let jobs_emitted = source.await.context("job source task failed")?;

    Ok(PipelineReport {
        collection,
        pool,
        jobs_emitted,
        cancelled: cancel.is_cancelled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::adapter::FetchError;
    use crate::output;
    use crate::schema::Comic;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::time::Duration;

    type Script = fn(u32) -> Result<Comic, FetchError>;

    /// Fetcher double that records every id it is asked for.
    struct ScriptedFetcher {
        calls: Mutex<Vec<u32>>,
        script: Script,
    }

    impl ScriptedFetcher {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                script,
            })
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ComicFetcher for ScriptedFetcher {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_one(&self, id: u32) -> Result<Comic, FetchError> {
            self.calls.lock().unwrap().push(id);
            // Let other workers interleave so completion order varies.
            tokio::task::yield_now().await;
            (self.script)(id)
        }
    }

    fn always_ok(id: u32) -> Result<Comic, FetchError> {
        Ok(Comic {
            num: id,
            title: format!("comic {}", id),
            ..Comic::default()
        })
    }

    fn config(total_jobs: u32, workers: usize) -> Config {
        Config {
            total_jobs,
            workers,
            queue_capacity: 4,
            ..Config::default()
        }
    }

    fn ids(report: &PipelineReport) -> BTreeSet<u32> {
        report.collection.records.iter().map(|c| c.num).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_id_is_fetched_exactly_once() {
        let fetcher = ScriptedFetcher::new(always_ok);
        let report = run_pipeline(&config(250, 8), fetcher.clone(), CancellationToken::new())
            .await
            .unwrap();

        let mut calls = fetcher.calls();
        calls.sort_unstable();
        assert_eq!(calls, (1..=250).collect::<Vec<_>>());

        assert_eq!(report.jobs_emitted, 250);
        assert_eq!(report.pool.jobs_processed, 250);
        assert_eq!(report.collection.outcomes_received, 250);
        assert_eq!(report.collection.records.len(), 250);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn empty_outcomes_are_filtered_out() {
        fn script(id: u32) -> Result<Comic, FetchError> {
            match id {
                3 => Err(FetchError::Remote { id, status: 404 }),
                _ => always_ok(id),
            }
        }

        let report = run_pipeline(&config(3, 2), ScriptedFetcher::new(script), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&report), BTreeSet::from([1, 2]));
        assert_eq!(report.collection.discarded, 1);

        let encoded = output::encode(&report.collection.records).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn transport_failures_never_abort_the_batch() {
        fn script(id: u32) -> Result<Comic, FetchError> {
            Err(FetchError::Transport { id, reason: "connection refused".into() })
        }

        let report = run_pipeline(&config(5, 2), ScriptedFetcher::new(script), CancellationToken::new())
            .await
            .unwrap();

        assert!(report.collection.records.is_empty());
        assert_eq!(report.collection.outcomes_received, 5);
        assert_eq!(report.pool.jobs_processed, 5);
        assert_eq!(output::encode(&report.collection.records).unwrap(), b"[]");
    }

    #[tokio::test]
    async fn zero_jobs_yields_empty_collection() {
        let fetcher = ScriptedFetcher::new(always_ok);
        let report = run_pipeline(&config(0, 3), fetcher.clone(), CancellationToken::new())
            .await
            .unwrap();

        assert!(fetcher.calls().is_empty());
        assert_eq!(report.jobs_emitted, 0);
        assert!(report.collection.records.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn worker_count_does_not_change_the_result_set() {
        fn script(id: u32) -> Result<Comic, FetchError> {
            if id % 7 == 0 {
                Err(FetchError::Remote { id, status: 500 })
            } else {
                always_ok(id)
            }
        }

        let single = run_pipeline(&config(120, 1), ScriptedFetcher::new(script), CancellationToken::new())
            .await
            .unwrap();
        let many = run_pipeline(&config(120, 100), ScriptedFetcher::new(script), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&single), ids(&many));
        assert_eq!(single.collection.records.len(), 120 - 17);
    }

    #[tokio::test]
    async fn single_worker_preserves_id_order() {
        let report = run_pipeline(&config(20, 1), ScriptedFetcher::new(always_ok), CancellationToken::new())
            .await
            .unwrap();

        let nums: Vec<u32> = report.collection.records.iter().map(|c| c.num).collect();
        assert_eq!(nums, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn cancellation_drains_pipeline_without_deadlock() {
        struct StalledFetcher;

        #[async_trait::async_trait]
        impl ComicFetcher for StalledFetcher {
            fn name(&self) -> &'static str {
                "stalled"
            }

            async fn fetch_one(&self, _id: u32) -> Result<Comic, FetchError> {
                std::future::pending().await
            }
        }

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            run_pipeline(&config(1000, 4), Arc::new(StalledFetcher), cancel),
        )
        .await
        .expect("pipeline did not shut down after cancellation")
        .unwrap();

        assert!(report.cancelled);
        assert!(report.jobs_emitted < 1000);
        assert_eq!(report.pool.jobs_processed, 0);
        assert!(report.collection.records.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_worker_does_not_lose_the_rest() {
        struct FragileFetcher;

        #[async_trait::async_trait]
        impl ComicFetcher for FragileFetcher {
            fn name(&self) -> &'static str {
                "fragile"
            }

            async fn fetch_one(&self, id: u32) -> Result<Comic, FetchError> {
                if id == 3 {
                    panic!("fetcher bug on comic #3");
                }
                tokio::task::yield_now().await;
                always_ok(id)
            }
        }

        let report = run_pipeline(&config(30, 3), Arc::new(FragileFetcher), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.pool.panicked, 1);
        assert_eq!(report.collection.records.len(), 29);
        assert!(!ids(&report).contains(&3));
    }
}
