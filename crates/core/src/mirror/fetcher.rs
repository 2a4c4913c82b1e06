//! Single-job fetch: dedup, existence check, GET, stream to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, info, warn};

use crate::origin::{Origin, OriginBody};

use super::registry::DedupRegistry;
use super::types::{FetchOutcome, Job};

/// Write buffer for image bodies.
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Local write failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Destination could not be created (parent missing, permissions...).
    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Body could not be read or written. The partial file is left behind.
    #[error("Failed to copy body into {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Downloads one job at a time on behalf of a worker.
pub struct Fetcher {
    origin: Arc<dyn Origin>,
    registry: Arc<DedupRegistry>,
}

impl Fetcher {
    pub fn new(origin: Arc<dyn Origin>, registry: Arc<DedupRegistry>) -> Self {
        Self { origin, registry }
    }

    pub fn registry(&self) -> &Arc<DedupRegistry> {
        &self.registry
    }

    /// Fetches `job` unless it is already in flight or already on disk.
    ///
    /// Never returns an error: every failure is logged and reported as
    /// [`FetchOutcome::Failed`].
    pub async fn fetch(&self, job: &Job, worker: usize) -> FetchOutcome {
        let path = job.destination_path.as_str();

        let Some(_in_flight) = self.registry.acquire(path) else {
            info!(worker, path, "Duplicate");
            return FetchOutcome::SkippedDuplicate;
        };

        // Existing content is trusted as-is, even if stale or partial
        if fs::metadata(path).await.is_ok() {
            info!(worker, path, "Already exists");
            return FetchOutcome::SkippedExists;
        }

        let url = job.url();
        let response = match self.origin.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                error!(worker, url = %url, error = %e, "Request failed");
                return FetchOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if !response.is_ok() {
            warn!(worker, path, url = %url, status = response.status, "Not found");
            return FetchOutcome::SkippedNotFound {
                status: response.status,
            };
        }

        match write_body(Path::new(path), response.body).await {
            Ok(bytes) => {
                info!(worker, path, bytes, "Download success");
                FetchOutcome::Success { bytes }
            }
            Err(e) => {
                error!(worker, path, error = %e, "Download failed");
                FetchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Creates or truncates `path` and streams `body` into it.
async fn write_body(path: &Path, mut body: OriginBody) -> Result<u64, FetchError> {
    let file = File::create(path).await.map_err(|e| FetchError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

    let copy_failed = |e| FetchError::Copy {
        path: path.to_path_buf(),
        source: e,
    };
    let bytes = tokio::io::copy(&mut body, &mut writer)
        .await
        .map_err(copy_failed)?;
    writer.flush().await.map_err(copy_failed)?;

    Ok(bytes)
}
