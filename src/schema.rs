use serde::{Deserialize, Serialize};

use crate::fetcher::adapter::FetchError;

/// A unit of work: one comic to fetch.
///
/// Jobs are created by the job source and claimed by exactly one
/// worker through the work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Job {
    /// Comic number, 1-based
    pub id: u32,
}

// ------------------------------------------------------------
// Comic record
// ------------------------------------------------------------
//
// Mirrors the payload served at `/{id}/info.0.json`.
//
// Field order matches the remote document and is preserved on
// serialization, so the output file reads like the API.
//
// Missing fields decode to their zero value. The remote service
// omits some of them for older comics.
//
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comic {
    pub month: String,

    /// Comic number. Zero means "no comic" and is filtered out.
    pub num: u32,

    pub link: String,
    pub year: String,
    pub news: String,
    pub safe_title: String,
    pub transcript: String,
    pub alt: String,

    /// Image URL
    pub img: String,

    pub title: String,
    pub day: String,
}

impl Comic {
    /// Returns true when the record carries a real comic number.
    pub fn is_present(&self) -> bool {
        self.num != 0
    }
}

/// Result of attempting one job.
///
/// - `Success`: the remote returned a decodable comic
/// - `Empty`: the remote answered with a non-success status
/// - `Failure`: transport or decode error, already logged by the worker
#[derive(Debug)]
pub enum FetchOutcome {
    Success(Comic),
    Empty { id: u32 },
    Failure { id: u32, error: FetchError },
}

impl FetchOutcome {
    /// Converts a fetcher result into an outcome.
    ///
    /// Remote status errors degrade to `Empty` so one missing comic
    /// never stops the batch.
    pub fn from_result(job: Job, result: Result<Comic, FetchError>) -> Self {
        match result {
            Ok(comic) => FetchOutcome::Success(comic),
            Err(FetchError::Remote { .. }) => FetchOutcome::Empty { id: job.id },
            Err(error) => FetchOutcome::Failure { id: job.id, error },
        }
    }

    /// Returns the comic when this outcome should be kept.
    pub fn into_record(self) -> Option<Comic> {
        match self {
            FetchOutcome::Success(comic) if comic.is_present() => Some(comic),
            _ => None,
        }
    }
}

/// Records accepted by the collector, in arrival order.
///
/// Arrival order reflects which worker finished first, not the job id.
pub type ResultCollection = Vec<Comic>;
