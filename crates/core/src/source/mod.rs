//! Record sources: where image references come from.
//!
//! A [`RecordSource`] walks one [`Collection`] and hands each decoded
//! document to a visitor. Documents that fail to decode are logged and
//! skipped; only failing to query the collection at all is an error.

mod models;
mod scanner;
mod sqlite;

pub use models::{Collection, Game, GameBrand, ImageRecord};
pub use scanner::{scan_all, scan_collection, DestinationLayout};
pub use sqlite::SqliteRecordSource;

use std::ops::{AddAssign, ControlFlow};

use thiserror::Error;
use tracing::warn;

/// Record source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open record database {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Failed to query collection {collection}: {reason}")]
    Query {
        collection: Collection,
        reason: String,
    },
}

/// Counters for one or more collection scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Documents decoded and visited.
    pub records: u64,
    /// Documents that failed to decode.
    pub skipped: u64,
    /// Jobs submitted to the queue.
    pub submitted: u64,
    /// Image references refused because they escape the destination.
    pub rejected: u64,
}

impl AddAssign for ScanStats {
    fn add_assign(&mut self, other: Self) {
        self.records += other.records;
        self.skipped += other.skipped;
        self.submitted += other.submitted;
        self.rejected += other.rejected;
    }
}

/// Visitor called with each decoded record. Returning `Break` ends the scan.
pub type RecordVisitor<'a> = dyn FnMut(ImageRecord) -> ControlFlow<()> + 'a;

/// Trait for record stores.
///
/// Scans are synchronous; callers run them on a blocking thread.
pub trait RecordSource: Send + Sync {
    /// Source name for logs.
    fn name(&self) -> &str;

    /// Visits every document of `collection` in storage order.
    ///
    /// The returned stats fill `records` and `skipped`; `submitted` is
    /// left to the caller.
    fn scan(
        &self,
        collection: Collection,
        visit: &mut RecordVisitor<'_>,
    ) -> Result<ScanStats, SourceError>;
}

/// Decodes one raw document and passes it to `visit`, counting it in
/// `stats`. A document that does not decode is logged and skipped.
pub(crate) fn decode_and_visit(
    collection: Collection,
    document: &str,
    stats: &mut ScanStats,
    visit: &mut RecordVisitor<'_>,
) -> ControlFlow<()> {
    match collection.decode(document) {
        Ok(record) => {
            stats.records += 1;
            visit(record)
        }
        Err(e) => {
            warn!(collection = %collection, error = %e, "Skipping undecodable record");
            stats.skipped += 1;
            ControlFlow::Continue(())
        }
    }
}
