//! Raw reads of a locator: HTTP(S) URLs or local files.
//!
//! The `Transport` trait is the seam between the fetcher and the outside
//! world, so the retry loop and the adapters can be tested against a mock.

use super::error::DataError;
use crate::config::HttpConfig;
use std::time::Duration;

/// Reads the bytes behind a locator.
pub trait Transport: Send + Sync {
    /// Human-readable name of this transport.
    fn name(&self) -> &str;

    /// Read the full body. A non-success HTTP status is an error.
    fn read(&self, locator: &str) -> Result<Vec<u8>, DataError>;
}

/// Whether a locator points at the network rather than the file system.
pub fn is_remote(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Blocking `reqwest` transport with a local-file fallback.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DataError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                locator: url.to_string(),
            });
        }

        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| DataError::Transport(format!("failed to read body from {url}: {e}")))
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn read(&self, locator: &str) -> Result<Vec<u8>, DataError> {
        if is_remote(locator) {
            self.get(locator.trim())
        } else {
            std::fs::read(locator)
                .map_err(|e| DataError::Transport(format!("failed to read {locator}: {e}")))
        }
    }
}
