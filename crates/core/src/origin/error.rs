//! Error types for the origin module.

use thiserror::Error;

/// Errors raised before a response status is available.
#[derive(Debug, Error)]
pub enum OriginError {
    /// Request timed out.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Could not connect to the origin.
    #[error("Connection to {url} failed: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// Any other transport failure.
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl OriginError {
    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if e.is_connect() {
            Self::ConnectionFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
