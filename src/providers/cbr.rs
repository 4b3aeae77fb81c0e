use crate::core::{RateError, RateSource};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches the daily rates document from the Bank of Russia (or a compatible URL).
pub struct CbrProvider {
    api_url: String,
    client: reqwest::Client,
}

impl CbrProvider {
    pub fn new(api_url: &str) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .user_agent("kursbot/1.0")
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| RateError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(CbrProvider {
            api_url: api_url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl RateSource for CbrProvider {
    #[instrument(name = "CbrFetch", skip(self), fields(url = %self.api_url))]
    async fn fetch_document(&self) -> Result<String, RateError> {
        debug!("Requesting rate document");

        let response = self
            .client
            .get(&self.api_url)
            .send()
            .await
            .map_err(|e| RateError::Network(format!("Request error: {e} for URL: {}", self.api_url)))?;

        if !response.status().is_success() {
            return Err(RateError::Network(format!(
                "HTTP error: {} for URL: {}",
                response.status(),
                self.api_url
            )));
        }

        // Decodes with the charset from Content-Type, windows-1251 for the CBR feed
        let text = response
            .text()
            .await
            .map_err(|e| RateError::Network(format!("Failed to read response body: {e}")))?;

        debug!(bytes = text.len(), "Received rate document");
        Ok(text)
    }
}
