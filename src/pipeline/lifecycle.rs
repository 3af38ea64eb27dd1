//! Pool lifecycle coordination.
//!
//! The coordinator is the single owner allowed to close the result
//! queue. It does so exactly once, and only after every spawned
//! worker has returned, so the collector can never miss an outcome
//! and never waits on a queue nobody will close.
//!
//! State machine:
//!
//! ```text
//! Running(k) --worker exits--> Running(k-1) ... --last exit--> AllDone --close--> Closed
//! ```

use async_channel::Sender;
use log::{debug, error};

use crate::schema::FetchOutcome;

use super::worker_pool::WorkerPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Running(usize),
    AllDone,
    Closed,
}

/// Tracks live workers and holds the result queue's closing handle.
pub struct PoolLifecycle {
    state: PoolState,
    results: Option<Sender<FetchOutcome>>,
}

impl PoolLifecycle {
    pub fn new(active: usize, results: Sender<FetchOutcome>) -> Self {
        let state = if active == 0 {
            PoolState::AllDone
        } else {
            PoolState::Running(active)
        };

        Self {
            state,
            results: Some(results),
        }
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Records one worker exit.
    pub fn worker_exited(&mut self) {
        self.state = match self.state {
            PoolState::Running(1) => PoolState::AllDone,
            PoolState::Running(k) => PoolState::Running(k - 1),
            other => {
                error!("worker exit reported in state {:?}", other);
                other
            }
        };
    }

    /// Closes the result queue if every worker is done.
    ///
    /// Returns true only on the call that actually closed it. Calls
    /// while workers are still running, or after the close, do nothing.
    pub fn close_results(&mut self) -> bool {
        if self.state != PoolState::AllDone {
            return false;
        }

        match self.results.take() {
            Some(results) => {
                results.close();
                self.state = PoolState::Closed;
                true
            }
            None => false,
        }
    }
}

/// Join summary for a worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSummary {
    pub workers: usize,

    /// Outcomes delivered to the result queue, summed over workers
    pub jobs_processed: usize,

    /// Workers that terminated by panicking
    pub panicked: usize,
}

/// Waits for every worker in `pool`, then closes the result queue.
///
/// A panicked worker counts as exited. Its in-flight job is lost,
/// but the pool still terminates and the queue is still closed.
pub async fn await_all(mut pool: WorkerPool, results: Sender<FetchOutcome>) -> PoolSummary {
    let mut lifecycle = PoolLifecycle::new(pool.spawned, results);
    let mut summary = PoolSummary {
        workers: pool.spawned,
        ..PoolSummary::default()
    };

    while let Some(joined) = pool.workers.join_next().await {
        match joined {
            Ok(delivered) => summary.jobs_processed += delivered,
            Err(e) => {
                error!("worker terminated abnormally: {}", e);
                summary.panicked += 1;
            }
        }
        lifecycle.worker_exited();
    }

    if lifecycle.close_results() {
        debug!("all {} workers done, result queue closed", summary.workers);
    } else {
        error!("result queue not closed, pool in state {:?}", lifecycle.state());
    }

    summary
}
