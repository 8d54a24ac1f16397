//! HTTP client for the silo inventory API.
//!
//! Fetch calls return typed records or a [`FetchError`]; deciding what to do
//! on failure (demo data, toasts) is left to the refresh boundary.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{HistoryPoint, NewSilo, RawReading};
use crate::Config;

// ---

#[derive(Debug, Clone)]
pub struct SiloApiClient {
    client: Client,
    base_url: Url,
}

/// Error body shape used by the inventory API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl SiloApiClient {
    // ---
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        // ---
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(SiloApiClient { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(&config.api_url, config.fetch_timeout())
    }

    /// Fetch the latest reading of every device.
    ///
    /// The payload must be a JSON array. Individual items that cannot be read
    /// as a reading are logged and skipped.
    pub async fn fetch_readings(&self) -> Result<Vec<RawReading>, FetchError> {
        // ---
        let url = self.endpoint(&["api", "volume_data"])?;
        debug!("Fetching readings from: {}", url);

        let response = check_status(self.client.get(url).send().await?).await?;
        let body: Value = serde_json::from_str(&response.text().await?)?;

        let Some(items) = body.as_array() else {
            return Err(FetchError::Malformed(
                "expected an array of readings".to_string(),
            ));
        };

        let mut readings = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match RawReading::deserialize(item) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    debug!("Failed to parse item {}: {} - Raw item: {}", i, e, item);
                }
            }
        }

        debug!(
            "Fetched {} readings ({} skipped)",
            readings.len(),
            items.len() - readings.len()
        );
        Ok(readings)
    }

    /// Volume history of one device, oldest first as served upstream.
    pub async fn fetch_history(&self, device_id: &str) -> Result<Vec<HistoryPoint>, FetchError> {
        // ---
        let url = self.endpoint(&["api", "volume_history", device_id])?;
        debug!("Fetching history from: {}", url);

        let response = check_status(self.client.get(url).send().await?).await?;
        let body: Value = serde_json::from_str(&response.text().await?)?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn create_silo(&self, silo: &NewSilo) -> Result<(), FetchError> {
        // ---
        let url = self.endpoint(&["api", "admin", "silos"])?;
        debug!("Creating silo {} via {}", silo.device_id, url);

        check_status(self.client.post(url).json(silo).send().await?).await?;
        Ok(())
    }

    pub async fn delete_silo(&self, device_id: &str) -> Result<(), FetchError> {
        // ---
        let url = self.endpoint(&["api", "admin", "silos", "by_device", device_id])?;
        debug!("Deleting silo via {}", url);

        check_status(self.client.delete(url).send().await?).await?;
        Ok(())
    }

    pub async fn delete_branch(&self, branch_id: &str) -> Result<(), FetchError> {
        // ---
        let url = self.endpoint(&["api", "admin", "branches", branch_id])?;
        debug!("Deleting branch via {}", url);

        check_status(self.client.delete(url).send().await?).await?;
        Ok(())
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-2xx response into `FetchError::Status`, keeping the upstream
/// `{"error": ...}` message when there is one.
async fn check_status(response: Response) -> Result<Response, FetchError> {
    // ---
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    debug!("Upstream error {}: {}", status, text);
    Err(FetchError::Status {
        status: status.as_u16(),
        message,
    })
}
