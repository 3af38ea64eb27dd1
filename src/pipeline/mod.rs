/// Pipeline module
///
/// This module groups the concurrent harvest pipeline:
/// - `jobs`:        job source feeding the work queue
/// - `worker_pool`: workers turning jobs into outcomes
/// - `lifecycle`:   joining the pool and closing the result queue once
/// - `collector`:   filtering outcomes into the final collection
/// - `runner`:      wiring the stages together in a fixed order
///
/// Stages share nothing but two bounded async-channel queues:
///
///     job source -> work queue -> workers -> result queue -> collector
///
/// Exactly one actor closes each queue: the job source closes the
/// work queue, the lifecycle coordinator closes the result queue.
pub mod collector;
pub mod jobs;
pub mod lifecycle;
pub mod runner;
pub mod worker_pool;
