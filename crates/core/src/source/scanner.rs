//! Turns records into queued jobs.

use std::ops::ControlFlow;
use std::path::{Component, Path};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::mirror::{Job, JobSubmitter};

use super::models::{Collection, ImageRecord};
use super::{RecordSource, ScanStats, SourceError};

/// Maps image references to destination paths and request origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationLayout {
    local_dest: String,
    origin_host: String,
}

impl DestinationLayout {
    pub fn new(local_dest: impl Into<String>, origin_host: impl Into<String>) -> Self {
        Self {
            local_dest: local_dest.into(),
            origin_host: origin_host.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.mirror.local_dest, &config.origin_host)
    }

    /// `local_dest + "/" + image_ref`, fetched from the origin host.
    ///
    /// Returns `None` for references with a `..` component, which would
    /// land outside `local_dest`.
    pub fn job_for(&self, image_ref: &str) -> Option<Job> {
        if Path::new(image_ref)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }
        Some(Job::new(
            format!("{}/{}", self.local_dest, image_ref),
            self.origin_host.as_str(),
        ))
    }
}

/// Submits one job per non-empty image reference in `collection`.
///
/// Stops early, without error, once `cancel` fires or the queue stops
/// accepting jobs. Must run on a blocking thread.
pub fn scan_collection(
    source: &dyn RecordSource,
    collection: Collection,
    submitter: &JobSubmitter,
    layout: &DestinationLayout,
    cancel: &CancellationToken,
) -> Result<ScanStats, SourceError> {
    let mut submitted = 0;
    let mut rejected = 0;

    let mut stats = source.scan(collection, &mut |record: ImageRecord| {
        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }
        for image_ref in record.image_refs() {
            let Some(job) = layout.job_for(image_ref) else {
                warn!(
                    collection = %collection,
                    image_ref,
                    "Image reference escapes destination, skipping"
                );
                rejected += 1;
                continue;
            };
            if let Err(e) = submitter.submit_blocking(job) {
                debug!(collection = %collection, error = %e, "Queue refused job, stopping scan");
                return ControlFlow::Break(());
            }
            submitted += 1;
        }
        ControlFlow::Continue(())
    })?;
    stats.submitted = submitted;
    stats.rejected = rejected;

    info!(
        collection = %collection,
        source = source.name(),
        records = stats.records,
        skipped = stats.skipped,
        submitted = stats.submitted,
        rejected = stats.rejected,
        "Collection scanned"
    );
    Ok(stats)
}

/// Scans brands then games, then closes `submitter`.
///
/// A collection that cannot be queried is logged and the next one is
/// still scanned.
pub fn scan_all(
    source: &dyn RecordSource,
    submitter: JobSubmitter,
    layout: &DestinationLayout,
    cancel: &CancellationToken,
) -> ScanStats {
    let mut total = ScanStats::default();

    for collection in Collection::ALL {
        if cancel.is_cancelled() {
            info!(collection = %collection, "Cancelled, skipping collection");
            continue;
        }
        match scan_collection(source, collection, &submitter, layout, cancel) {
            Ok(stats) => total += stats,
            Err(e) => error!(collection = %collection, error = %e, "Collection scan failed"),
        }
    }

    submitter.close();
    total
}
