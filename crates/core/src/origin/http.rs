//! reqwest-backed origin implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::config::MirrorConfig;

use super::error::OriginError;
use super::traits::{Origin, OriginResponse};

/// HTTP origin backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: Client,
}

impl HttpOrigin {
    /// Create a new HttpOrigin using the mirror's timeout and user agent.
    pub fn new(config: &MirrorConfig) -> Result<Self, OriginError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OriginError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    fn name(&self) -> &str {
        "http"
    }

    async fn get(&self, url: &str) -> Result<OriginResponse, OriginError> {
        debug!(url = url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OriginError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let stream = response.bytes_stream().map_err(std::io::Error::other);

        Ok(OriginResponse::new(status, Box::pin(StreamReader::new(stream))))
    }
}
