use std::time::Duration;

use log::{debug, error};
use reqwest::blocking::Client;

use crate::errors::SourceError;

use super::Fetcher;

/// Blocking HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client for making requests
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with a request timeout; `verify_ssl = false` accepts
    /// any certificate
    pub fn new(timeout_secs: u64, verify_ssl: bool) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| SourceError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpFetcher { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, SourceError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SourceError::RequestFailed(format!("Failed to send request to {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            error!("HTTP error ({}) for {}", status, url);
            return Err(SourceError::HttpStatus {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .map_err(|e| SourceError::RequestFailed(format!("Failed to read response body from {}: {}", url, e)))
    }
}
