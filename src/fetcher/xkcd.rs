use std::time::Duration;

use reqwest::Client;
use rustls::crypto::{CryptoProvider, ring};

use crate::schema::Comic;

use super::adapter::{ComicFetcher, FetchError};

/// xkcd JSON API fetcher
///
/// Endpoint:
///     {base_url}/{id}/info.0.json
///
/// One `reqwest::Client` is built up front and shared by all
/// workers, so connections are pooled across jobs. The timeout
/// applies to each request as a whole (connect + body).
pub struct XkcdFetcher {
    client: Client,
    base_url: String,
}

/// Installs the `ring` rustls provider as the process default.
///
/// rustls >= 0.23 needs an explicit provider when more than one is
/// compiled in. Idempotent: an already installed provider is kept.
pub fn install_crypto_provider() {
    if CryptoProvider::get_default().is_none() {
        let _ = CryptoProvider::install_default(ring::default_provider());
    }
}

impl XkcdFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        install_crypto_provider();

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn comic_url(&self, id: u32) -> String {
        format!("{}/{}/info.0.json", self.base_url, id)
    }
}

#[async_trait::async_trait]
impl ComicFetcher for XkcdFetcher {
    fn name(&self) -> &'static str {
        "xkcd"
    }

    async fn fetch_one(&self, id: u32) -> Result<Comic, FetchError> {
        let resp = self
            .client
            .get(self.comic_url(id))
            .send()
            .await
            .map_err(|e| FetchError::Transport { id, reason: e.to_string() })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Remote { id, status: status.as_u16() });
        }

        // Read the body first so a dropped connection is reported as
        // transport, and only a bad document as decode.
        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport { id, reason: e.to_string() })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode { id, reason: e.to_string() })
    }
}
