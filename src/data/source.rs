//! HTTP source for the daily dataset.
//!
//! The cache only needs "fetch bytes from a URL", so the seam is a small
//! trait; tests swap in an in-memory source and never touch the network.

use reqwest::blocking::Client;

use crate::error::AppError;

/// Anything that can produce the full dataset as raw bytes.
pub trait DataSource {
    fn fetch_raw(&self) -> Result<Vec<u8>, AppError>;
}

/// Blocking HTTP GET against the configured dataset URL.
///
/// No retries and no timeout beyond what the transport enforces; a failed
/// fetch surfaces immediately and is retried by a later run.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DataSource for HttpSource {
    fn fetch_raw(&self) -> Result<Vec<u8>, AppError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::fetch(format!("Dataset request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::fetch(format!(
                "Dataset request failed with status {}.",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| AppError::fetch(format!("Failed to read dataset body: {e}")))?;

        Ok(bytes.to_vec())
    }
}
