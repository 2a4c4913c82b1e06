//! Wires queue, forwarder and worker pool into one running pipeline.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::config::MirrorConfig;

use super::fetcher::Fetcher;
use super::pool::{PoolReport, WorkerPool};
use super::queue::{ForwardStats, JobQueue, JobSubmitter};
use super::stats::{OutcomeSnapshot, OutcomeStats};

/// Final numbers for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub forward: ForwardStats,
    pub pool: PoolReport,
    pub outcomes: OutcomeSnapshot,
}

/// A started mirroring pipeline.
///
/// # Example
///
/// ```ignore
/// let pipeline = MirrorPipeline::start(&config.mirror, fetcher, cancel);
/// let submitter = pipeline.submitter();
/// submitter.submit(Job::new("uploads/a.png", "https://cdn/")).await?;
/// submitter.close();
/// let report = pipeline.wait().await;
/// ```
pub struct MirrorPipeline {
    submitter: JobSubmitter,
    forwarder: JoinHandle<ForwardStats>,
    pool: WorkerPool,
    stats: Arc<OutcomeStats>,
}

impl MirrorPipeline {
    /// Starts the forwarder and `config.pool_size` workers.
    pub fn start(config: &MirrorConfig, fetcher: Arc<Fetcher>, cancel: CancellationToken) -> Self {
        let queue = JobQueue::new(config.input_buffer, config.pool_size, cancel.clone());
        let submitter = queue.submitter();
        let (forwarder, receiver) = queue.split();
        let stats = Arc::new(OutcomeStats::new());

        let forwarder = forwarder.spawn();
        let pool = WorkerPool::spawn(
            config.pool_size,
            receiver,
            fetcher,
            Arc::clone(&stats),
            cancel,
        );

        Self {
            submitter,
            forwarder,
            pool,
            stats,
        }
    }

    /// A producer handle. Every handle must be dropped or closed before
    /// [`wait`](Self::wait) can complete.
    pub fn submitter(&self) -> JobSubmitter {
        self.submitter.clone()
    }

    /// Live outcome counters.
    pub fn stats(&self) -> OutcomeSnapshot {
        self.stats.snapshot()
    }

    /// Drops the pipeline's own producer handle and waits for the forwarder
    /// and every worker to stop.
    pub async fn wait(self) -> PipelineReport {
        let Self {
            submitter,
            forwarder,
            pool,
            stats,
        } = self;
        submitter.close();

        let pool = pool.wait().await;
        let forward = forwarder.await.unwrap_or_else(|e| {
            error!(error = %e, "Forwarder terminated abnormally");
            ForwardStats::default()
        });

        PipelineReport {
            forward,
            pool,
            outcomes: stats.snapshot(),
        }
    }
}
