//! Two-stage job queue.
//!
//! Producers submit into a large input stage; a single forwarder task
//! relays jobs into a small worker-visible stage sized to the pool. The
//! forwarder stops on input close or cancellation and closes the
//! worker-visible stage behind it.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::types::Job;

/// Errors returned to producers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The forwarder has stopped and no longer accepts jobs.
    #[error("Job queue is closed")]
    Closed,

    /// Shutdown was requested.
    #[error("Job queue cancelled")]
    Cancelled,
}

/// Producer handle for the input stage.
///
/// Cloneable; the input stage closes once every clone (and the queue's
/// own handle) has been dropped.
#[derive(Debug, Clone)]
pub struct JobSubmitter {
    tx: mpsc::Sender<Job>,
    cancel: CancellationToken,
}

impl JobSubmitter {
    /// Enqueues `job`, waiting while the input stage is full.
    pub async fn submit(&self, job: Job) -> Result<(), QueueError> {
        if self.cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(QueueError::Cancelled),
            sent = self.tx.send(job) => sent.map_err(|_| QueueError::Closed),
        }
    }

    /// Blocking variant of [`submit`](Self::submit) for producers running
    /// outside the async runtime (e.g. inside `spawn_blocking`).
    ///
    /// Must not be called from an async context.
    pub fn submit_blocking(&self, job: Job) -> Result<(), QueueError> {
        if self.cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }
        self.tx.blocking_send(job).map_err(|_| QueueError::Closed)
    }

    /// Signals that this producer has no more jobs.
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer handle for the worker-visible stage, shared by all workers.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl JobReceiver {
    /// Next job, or `None` once the stage is closed and drained.
    pub async fn recv(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }
}

/// What the forwarder did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub forwarded: u64,
    /// Jobs left in the input stage when cancellation fired.
    pub discarded: u64,
    pub cancelled: bool,
}

/// Relays jobs from the input stage to the worker-visible stage.
#[derive(Debug)]
pub struct Forwarder {
    input: mpsc::Receiver<Job>,
    output: mpsc::Sender<Job>,
    cancel: CancellationToken,
}

impl Forwarder {
    /// Spawns the relay loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<ForwardStats> {
        tokio::spawn(self.run())
    }

    /// Runs until the input stage is closed and drained or cancellation
    /// fires. Dropping `self.output` on return closes the worker stage.
    pub async fn run(mut self) -> ForwardStats {
        let mut stats = ForwardStats::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    stats.cancelled = true;
                    break;
                }
                next = self.input.recv() => next,
            };

            let Some(job) = next else {
                debug!("Input stage closed and drained");
                break;
            };

            if self.cancel.is_cancelled() {
                stats.discarded += 1;
                stats.cancelled = true;
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    stats.discarded += 1;
                    stats.cancelled = true;
                    break;
                }
                sent = self.output.send(job) => {
                    if sent.is_err() {
                        debug!("Worker stage closed, stopping forwarder");
                        break;
                    }
                    stats.forwarded += 1;
                }
            }
        }

        if stats.cancelled {
            // Refuse further submissions, then count what never got forwarded
            self.input.close();
            while self.input.try_recv().is_ok() {
                stats.discarded += 1;
            }
        }

        info!(
            forwarded = stats.forwarded,
            discarded = stats.discarded,
            cancelled = stats.cancelled,
            "Forwarder stopped"
        );
        stats
    }
}

/// The two bounded stages plus the cancellation token they observe.
#[derive(Debug)]
pub struct JobQueue {
    submitter: JobSubmitter,
    forwarder: Forwarder,
    receiver: JobReceiver,
}

impl JobQueue {
    /// Creates the queue. `worker_capacity` is normally the pool size.
    ///
    /// Capacities of zero are bumped to one.
    pub fn new(input_capacity: usize, worker_capacity: usize, cancel: CancellationToken) -> Self {
        let (input_tx, input_rx) = mpsc::channel(input_capacity.max(1));
        let (jobs_tx, jobs_rx) = mpsc::channel(worker_capacity.max(1));

        Self {
            submitter: JobSubmitter {
                tx: input_tx,
                cancel: cancel.clone(),
            },
            forwarder: Forwarder {
                input: input_rx,
                output: jobs_tx,
                cancel,
            },
            receiver: JobReceiver {
                rx: Arc::new(Mutex::new(jobs_rx)),
            },
        }
    }

    /// A new producer handle.
    pub fn submitter(&self) -> JobSubmitter {
        self.submitter.clone()
    }

    /// Splits into the forwarder and the worker-side receiver. The queue's
    /// own producer handle is dropped, so the input stage closes once every
    /// handle from [`submitter`](Self::submitter) is gone.
    pub fn split(self) -> (Forwarder, JobReceiver) {
        (self.forwarder, self.receiver)
    }
}
