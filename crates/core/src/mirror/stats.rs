//! Outcome counters shared by the worker pool.

use std::sync::atomic::{AtomicU64, Ordering};

use super::types::FetchOutcome;

/// Counts fetch outcomes across all workers.
#[derive(Debug, Default)]
pub struct OutcomeStats {
    skipped_exists: AtomicU64,
    skipped_duplicate: AtomicU64,
    skipped_not_found: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
    bytes: AtomicU64,
}

/// Point-in-time copy of [`OutcomeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeSnapshot {
    pub skipped_exists: u64,
    pub skipped_duplicate: u64,
    pub skipped_not_found: u64,
    pub success: u64,
    pub failed: u64,
    pub bytes: u64,
}

impl OutcomeSnapshot {
    /// Number of jobs a worker picked up.
    pub fn total(&self) -> u64 {
        self.skipped_exists
            + self.skipped_duplicate
            + self.skipped_not_found
            + self.success
            + self.failed
    }
}

impl OutcomeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &FetchOutcome) {
        let counter = match outcome {
            FetchOutcome::SkippedExists => &self.skipped_exists,
            FetchOutcome::SkippedDuplicate => &self.skipped_duplicate,
            FetchOutcome::SkippedNotFound { .. } => &self.skipped_not_found,
            FetchOutcome::Success { bytes } => {
                self.bytes.fetch_add(*bytes, Ordering::Relaxed);
                &self.success
            }
            FetchOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> OutcomeSnapshot {
        OutcomeSnapshot {
            skipped_exists: self.skipped_exists.load(Ordering::Relaxed),
            skipped_duplicate: self.skipped_duplicate.load(Ordering::Relaxed),
            skipped_not_found: self.skipped_not_found.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}
