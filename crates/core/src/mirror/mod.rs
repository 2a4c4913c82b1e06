//! Mirror module: the concurrent download pipeline.
//!
//! This module provides:
//! - `DedupRegistry`: in-flight destination paths shared by all workers
//! - `Fetcher`: existence check, GET and streaming write for one job
//! - `JobQueue`: bounded input stage relayed into a pool-sized worker stage
//! - `WorkerPool`: fixed number of workers draining the worker stage
//! - `MirrorPipeline`: all of the above started together
//!
//! Every blocking wait also observes a shared `CancellationToken`; once it
//! fires no new job is started, while in-flight transfers run to completion.

mod fetcher;
mod pipeline;
mod pool;
mod queue;
mod registry;
mod stats;
mod types;

pub use fetcher::{FetchError, Fetcher};
pub use pipeline::{MirrorPipeline, PipelineReport};
pub use pool::{PoolReport, WorkerPool};
pub use queue::{ForwardStats, Forwarder, JobQueue, JobReceiver, JobSubmitter, QueueError};
pub use registry::{DedupRegistry, InFlightGuard};
pub use stats::{OutcomeSnapshot, OutcomeStats};
pub use types::{FetchOutcome, Job};
