use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Loaded from `config.json` (or the path given as the first
// command line argument).
//
// Every field has a default, so an absent file or a partial
// document is valid. Defaults reproduce the classic run:
// 3000 comics, 100 workers, 5 minute request timeout.
//
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of comics to fetch, ids 1..=total_jobs
    pub total_jobs: u32,

    /// Number of concurrent workers
    pub workers: usize,

    /// Capacity of both the work queue and the result queue
    pub queue_capacity: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Base URL of the comic API (no trailing path)
    pub base_url: String,

    /// Output document, overwritten on every successful run
    pub output_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_jobs: 3000,
            workers: 100,
            queue_capacity: 100,
            request_timeout_secs: 300,
            base_url: "https://xkcd.com".to_string(),
            output_path: "xkcd.json".to_string(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects settings that would stall or misdirect the pipeline.
    ///
    /// Zero workers with pending jobs would never drain the work
    /// queue, and zero capacity is not a valid bounded queue.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            bail!("`workers` must be at least 1");
        }
        if self.queue_capacity == 0 {
            bail!("`queue_capacity` must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("`request_timeout_secs` must be at least 1");
        }
        if self.base_url.trim().is_empty() {
            bail!("`base_url` must not be empty");
        }
        if self.output_path.trim().is_empty() {
            bail!("`output_path` must not be empty");
        }
        Ok(())
    }
}

/// Reads and validates the configuration file.
///
/// A missing file yields the defaults. Any other read error or a
/// malformed document is fatal.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let cfg: Config = match fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data)
            .with_context(|| format!("invalid configuration in {}", path.display()))?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("{} not found, using default configuration", path.display());
            Config::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    cfg.validate()?;
    Ok(cfg)
}
