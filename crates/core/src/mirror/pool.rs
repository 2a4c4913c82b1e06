//! Fixed-size worker pool draining the worker-visible stage.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::fetcher::Fetcher;
use super::queue::JobReceiver;
use super::stats::OutcomeStats;

/// Result of joining the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    /// Jobs handed to the fetcher.
    pub processed: u64,
    /// Workers that ended in a panic.
    pub panicked: usize,
}

/// `N` workers started once; never resized.
pub struct WorkerPool {
    handles: Vec<JoinHandle<u64>>,
}

impl WorkerPool {
    /// Starts `size` workers (at least one).
    pub fn spawn(
        size: usize,
        receiver: JobReceiver,
        fetcher: Arc<Fetcher>,
        stats: Arc<OutcomeStats>,
        cancel: CancellationToken,
    ) -> Self {
        let size = size.max(1);
        let handles = (0..size)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    receiver.clone(),
                    Arc::clone(&fetcher),
                    Arc::clone(&stats),
                    cancel.clone(),
                ))
            })
            .collect();

        info!(workers = size, "Worker pool started");
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to stop. Workers stop once the worker stage is
    /// closed and drained, or on cancellation.
    pub async fn wait(self) -> PoolReport {
        let workers = self.handles.len();
        let mut report = PoolReport {
            workers,
            ..Default::default()
        };

        for (worker, result) in join_all(self.handles).await.into_iter().enumerate() {
            match result {
                Ok(processed) => report.processed += processed,
                Err(e) => {
                    error!(worker, error = %e, "Worker terminated abnormally");
                    report.panicked += 1;
                }
            }
        }

        info!(
            workers = report.workers,
            processed = report.processed,
            "Worker pool stopped"
        );
        report
    }
}

async fn run_worker(
    worker: usize,
    receiver: JobReceiver,
    fetcher: Arc<Fetcher>,
    stats: Arc<OutcomeStats>,
    cancel: CancellationToken,
) -> u64 {
    let mut processed = 0;

    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = receiver.recv() => job,
        };

        let Some(job) = job else {
            break;
        };

        // Cancellation wins over a job received in the same instant
        if cancel.is_cancelled() {
            break;
        }

        let outcome = fetcher.fetch(&job, worker).await;
        stats.record(&outcome);
        processed += 1;
    }

    debug!(worker, processed, "Worker stopped");
    processed
}
