use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Global runtime metrics for a harvest run.
///
/// Purpose:
/// - Feed the end-of-run summary
/// - Give operators a view of how many items degraded
///
/// These counters are observability only. Pipeline correctness
/// never depends on them; workers and the collector communicate
/// exclusively through their queues.
#[derive(Default)]
pub struct RuntimeMetrics {
    pub jobs_dispatched: AtomicUsize,

    // Worker level
    pub workers_active: AtomicUsize,
    pub records_fetched: AtomicUsize,
    pub empty_responses: AtomicUsize,
    pub fetch_failures: AtomicUsize,

    // Collector level
    pub records_collected: AtomicUsize,
}

impl RuntimeMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
            empty_responses: self.empty_responses.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            records_collected: self.records_collected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub jobs_dispatched: usize,
    pub records_fetched: usize,
    pub empty_responses: usize,
    pub fetch_failures: usize,
    pub records_collected: usize,
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));
