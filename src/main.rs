// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:   Run configuration loaded from JSON
// - schema:   Job, comic record and outcome types
// - fetcher:  Comic fetcher abstraction and the xkcd HTTP client
// - pipeline: Job source, worker pool, lifecycle and collector
// - output:   JSON encoding and the output file sink
// - metrics:  Process-wide counters for the run summary
//
mod config;
mod fetcher;
mod metrics;
mod output;
mod pipeline;
mod schema;

// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use anyhow::{Context, bail};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use config::load_config;
use fetcher::xkcd::{XkcdFetcher, install_crypto_provider};
use metrics::METRICS;
use pipeline::runner::run_pipeline;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Batch harvester for xkcd comic metadata.
//
// Responsibilities:
// - Initialize logging and the rustls crypto backend
// - Load configuration
// - Run the concurrent fetch pipeline
// - Encode and write the collected comics
// - Report a summary
//
// Any error returned from here exits the process non-zero.
// Per-comic failures never reach this level.
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --------------------------------------------------------
    // rustls >= 0.23 requires an explicit CryptoProvider.
    // Install it before the first client is built.
    // --------------------------------------------------------
    install_crypto_provider();

    // --------------------------------------------------------
    // Configuration: first CLI argument or ./config.json
    // --------------------------------------------------------
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = load_config(&config_path)?;

    let start = Instant::now();

    info!("-------------------------------------------------------------");
    info!(
        "Harvesting metadata for {} comics from {} with {} workers",
        config.total_jobs, config.base_url, config.workers
    );
    info!("-------------------------------------------------------------");

    let fetcher = XkcdFetcher::new(&config.base_url, config.request_timeout())
        .context("failed to build HTTP client")?;

    // --------------------------------------------------------
    // Ctrl-C stops job generation and abandons in-flight fetches
    // --------------------------------------------------------
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, shutting down");
                cancel.cancel();
            }
        }
    });

    let report = run_pipeline(&config, Arc::new(fetcher), cancel).await?;

    if report.cancelled {
        bail!(
            "run interrupted after {} of {} jobs were dispatched, {} not written",
            report.jobs_emitted,
            config.total_jobs,
            config.output_path
        );
    }

    // --------------------------------------------------------
    // Encoding and sink failures are fatal to the run
    // --------------------------------------------------------
    let data = output::encode(&report.collection.records)?;
    output::write_output(&config.output_path, &data)?;

    if report.pool.panicked > 0 {
        warn!("{} workers terminated abnormally", report.pool.panicked);
    }

    let snapshot = METRICS.snapshot();
    info!("-------------------------------------------------------------");
    info!(
        "Jobs: {} - Workers: {} - Outcomes: {}",
        snapshot.jobs_dispatched, report.pool.workers, report.collection.outcomes_received,
    );
    info!(
        "Fetched: {} - Collected: {} - Empty: {} - Failed: {} - Discarded: {}",
        snapshot.records_fetched,
        snapshot.records_collected,
        snapshot.empty_responses,
        snapshot.fetch_failures,
        report.collection.discarded,
    );
    info!("Wrote {} ({} bytes)", config.output_path, data.len());
    info!("Elapsed: {:.2?}", start.elapsed());
    info!("-------------------------------------------------------------");

    Ok(())
}
