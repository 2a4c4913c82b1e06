//! In-memory record source for testing.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::{Mutex, PoisonError};

use crate::source::{
    decode_and_visit, Collection, RecordSource, RecordVisitor, ScanStats, SourceError,
};

/// In-memory implementation of the RecordSource trait.
///
/// Provides controllable behavior for testing:
/// - Raw documents per collection (malformed JSON included)
/// - Collections that fail to query
/// - Recorded scan order for assertions
///
/// # Example
///
/// ```rust,ignore
/// use imgmirror_core::testing::MemoryRecordSource;
///
/// let source = MemoryRecordSource::new()
///     .with_records(Collection::Game, vec![json!({"image": "g.png"})]);
///
/// // ... scan_all(&source, submitter, &layout, &cancel) ...
///
/// assert_eq!(source.scanned(), vec![Collection::GameBrand, Collection::Game]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryRecordSource {
    documents: HashMap<Collection, Vec<String>>,
    failing: HashSet<Collection>,
    scanned: Mutex<Vec<Collection>>,
}

impl MemoryRecordSource {
    /// Create an empty source. Collections without documents scan as empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append JSON records to `collection`.
    pub fn with_records(self, collection: Collection, records: Vec<serde_json::Value>) -> Self {
        let documents = records.iter().map(|r| r.to_string()).collect();
        self.with_documents(collection, documents)
    }

    /// Append raw documents to `collection`, decoded only when scanned.
    pub fn with_documents(mut self, collection: Collection, documents: Vec<String>) -> Self {
        self.documents
            .entry(collection)
            .or_default()
            .extend(documents);
        self
    }

    /// Make scans of `collection` fail with a query error.
    pub fn with_failing(mut self, collection: Collection) -> Self {
        self.failing.insert(collection);
        self
    }

    /// Collections scanned so far, in order.
    pub fn scanned(&self) -> Vec<Collection> {
        self.scanned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RecordSource for MemoryRecordSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn scan(
        &self,
        collection: Collection,
        visit: &mut RecordVisitor<'_>,
    ) -> Result<ScanStats, SourceError> {
        self.scanned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(collection);

        if self.failing.contains(&collection) {
            return Err(SourceError::Query {
                collection,
                reason: "mock query failure".to_string(),
            });
        }

        let mut stats = ScanStats::default();
        for document in self.documents.get(&collection).into_iter().flatten() {
            if let ControlFlow::Break(()) = decode_and_visit(collection, document, &mut stats, visit)
            {
                break;
            }
        }
        Ok(stats)
    }
}
