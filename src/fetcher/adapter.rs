use thiserror::Error;

use crate::schema::Comic;

/// Per-item fetch failures.
///
/// None of these abort a run. Workers convert them into
/// `FetchOutcome` values and keep going.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    #[error("transport error fetching comic #{id}: {reason}")]
    Transport { id: u32, reason: String },

    /// Non-success HTTP status
    #[error("comic #{id} answered with HTTP {status}")]
    Remote { id: u32, status: u16 },

    /// Response body is not a comic document
    #[error("malformed payload for comic #{id}: {reason}")]
    Decode { id: u32, reason: String },
}

/// ComicFetcher is the seam between the pipeline and the network.
///
/// Implementations perform exactly one request per call and must
/// bound it with their own timeout.
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - One instance is shared by every worker
///
#[async_trait::async_trait]
pub trait ComicFetcher: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Fetches and decodes a single comic.
    ///
    /// RETURNS:
    /// - `Ok(Comic)` on a 2xx response with a valid body
    /// - `Err(FetchError::Remote)` on any other status
    /// - `Err(FetchError::Transport | Decode)` otherwise
    ///
    /// MUST NOT panic on bad input from the remote.
    async fn fetch_one(&self, id: u32) -> Result<Comic, FetchError>;
}
