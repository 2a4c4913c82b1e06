//! Mock origin for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::io::StreamReader;

use crate::origin::{Origin, OriginBody, OriginError, OriginResponse};

/// A scripted response for one URL.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Whether the body errors out after `body` has been delivered.
    pub broken: bool,
}

impl MockResponse {
    /// 200 with the given body.
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            broken: false,
        }
    }

    /// Empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            broken: false,
        }
    }

    /// 200 whose body fails after delivering `prefix`.
    pub fn broken(prefix: Vec<u8>) -> Self {
        Self {
            status: 200,
            body: prefix,
            broken: true,
        }
    }

    fn into_body(self) -> OriginBody {
        if self.broken {
            let chunks = vec![
                Ok(Cursor::new(self.body)),
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by mock origin",
                )),
            ];
            Box::pin(StreamReader::new(futures::stream::iter(chunks)))
        } else {
            Box::pin(Cursor::new(self.body))
        }
    }
}

/// Mock implementation of the Origin trait.
///
/// Provides controllable behavior for testing:
/// - Scripted responses per URL (unknown URLs answer 404)
/// - Simulated transport failures and latency
/// - Recorded requests and peak concurrency for assertions
///
/// # Example
///
/// ```rust,ignore
/// use imgmirror_core::testing::{MockOrigin, MockResponse};
///
/// let origin = MockOrigin::new();
/// origin.respond_with("http://cdn/uploads/a.png", MockResponse::ok(b"png".to_vec())).await;
///
/// // ... run the fetcher ...
///
/// assert_eq!(origin.request_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockOrigin {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    requests: Arc<RwLock<Vec<String>>>,
    latency: Arc<RwLock<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockOrigin {
    /// Create a new mock origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for `url`.
    pub async fn respond_with(&self, url: &str, response: MockResponse) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), response);
    }

    /// Make requests for `url` fail at the transport level.
    pub async fn fail_url(&self, url: &str) {
        self.failing.write().await.insert(url.to_string());
    }

    /// Delay every response by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// All requested URLs, in request order.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    /// Number of requests made.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Number of requests made for `url`.
    pub async fn request_count_for(&self, url: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    /// Highest number of requests that were in flight at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Origin for MockOrigin {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get(&self, url: &str) -> Result<OriginResponse, OriginError> {
        self.requests.write().await.push(url.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = if self.failing.read().await.contains(url) {
            Err(OriginError::ConnectionFailed {
                url: url.to_string(),
                reason: "mock connection refused".to_string(),
            })
        } else {
            let response = self
                .responses
                .read()
                .await
                .get(url)
                .cloned()
                .unwrap_or_else(|| MockResponse::status(404));
            Ok(OriginResponse::new(response.status, response.into_body()))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
