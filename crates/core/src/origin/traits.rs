//! Trait definitions for the origin module.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::OriginError;

/// Response body, read incrementally so large images are never buffered whole.
pub type OriginBody = Pin<Box<dyn AsyncRead + Send>>;

/// Status and body of a GET against the origin.
pub struct OriginResponse {
    pub status: u16,
    pub body: OriginBody,
}

impl OriginResponse {
    pub fn new(status: u16, body: OriginBody) -> Self {
        Self { status, body }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

impl fmt::Debug for OriginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// A remote host images can be fetched from.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Returns the name of this origin implementation.
    fn name(&self) -> &str;

    /// Issues a GET for `url`. Any status is a successful response; only
    /// transport failures are errors.
    async fn get(&self, url: &str) -> Result<OriginResponse, OriginError>;
}
