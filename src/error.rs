//! Error types for talking to the silo inventory API.

use thiserror::Error;

/// Failures surfaced by the Data Fetcher.
///
/// Every variant is recoverable at the refresh boundary: the dashboard logs
/// it, queues a notification and falls back to demo data.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Upstream answered with a non-success HTTP status.
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Configured base URL cannot address an endpoint.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// Body was not the JSON shape we expect.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

impl FetchError {
    /// Short message suitable for a user-facing toast.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Status { message, .. } if !message.is_empty() => message.clone(),
            FetchError::Status { status, .. } => format!("HTTP error! status: {}", status),
            FetchError::Http(_) => "Could not reach the silo API".to_string(),
            FetchError::InvalidUrl(_) => "Silo API is misconfigured".to_string(),
            FetchError::Malformed(_) => "Invalid data format from volume_data".to_string(),
        }
    }
}
