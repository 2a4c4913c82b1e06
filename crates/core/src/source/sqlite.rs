//! SQLite-backed record source.
//!
//! Each collection is a table named after it with a `document TEXT`
//! column holding one JSON document per row.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use super::{decode_and_visit, Collection, RecordSource, RecordVisitor, ScanStats, SourceError};

/// Read-only record database.
pub struct SqliteRecordSource {
    conn: Mutex<Connection>,
}

impl SqliteRecordSource {
    /// Opens an existing database read-only. A missing file is an error.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SourceError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), "Record database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn query_error(collection: Collection, e: rusqlite::Error) -> SourceError {
    SourceError::Query {
        collection,
        reason: e.to_string(),
    }
}

impl RecordSource for SqliteRecordSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn scan(
        &self,
        collection: Collection,
        visit: &mut RecordVisitor<'_>,
    ) -> Result<ScanStats, SourceError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        let sql = format!("SELECT document FROM {} ORDER BY rowid", collection.table());
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| query_error(collection, e))?;
        let mut rows = stmt.query([]).map_err(|e| query_error(collection, e))?;

        let mut stats = ScanStats::default();
        while let Some(row) = rows.next().map_err(|e| query_error(collection, e))? {
            let document: String = match row.get(0) {
                Ok(document) => document,
                Err(e) => {
                    warn!(collection = %collection, error = %e, "Skipping unreadable row");
                    stats.skipped += 1;
                    continue;
                }
            };

            if decode_and_visit(collection, &document, &mut stats, visit).is_break() {
                debug!(collection = %collection, "Scan stopped by visitor");
                break;
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageRecord;
    use crate::testing::fixtures::write_records_db;
    use std::ops::ControlFlow;
    use serde_json::json;
    use tempfile::TempDir;

    fn collect(
        source: &SqliteRecordSource,
        collection: Collection,
    ) -> (Result<ScanStats, SourceError>, Vec<ImageRecord>) {
        let mut records = Vec::new();
        let result = source.scan(collection, &mut |record| {
            records.push(record);
            ControlFlow::Continue(())
        });
        (result, records)
    }

    #[test]
    fn test_open_missing_database_fails() {
        let dir = TempDir::new().unwrap();
        let result = SqliteRecordSource::open(&dir.path().join("missing.db"));
        assert!(matches!(result, Err(SourceError::Open { .. })));
    }

    #[test]
    fn test_scan_decodes_in_row_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.db");
        write_records_db(
            &path,
            &[
                json!({"code": "a", "logo": "a.png"}).to_string(),
                json!({"code": "b", "logo": "b.png"}).to_string(),
            ],
            &[json!({"image": "g.png"}).to_string()],
        )
        .unwrap();

        let source = SqliteRecordSource::open(&path).unwrap();
        let (result, records) = collect(&source, Collection::GameBrand);
        let stats = result.unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.skipped, 0);
        let refs: Vec<_> = records.iter().flat_map(|r| r.image_refs()).collect();
        assert_eq!(refs, vec!["a.png", "b.png"]);

        let (result, records) = collect(&source, Collection::Game);
        assert_eq!(result.unwrap().records, 1);
        assert_eq!(records[0].image_refs(), vec!["g.png"]);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.db");
        write_records_db(
            &path,
            &[],
            &[
                "{broken".to_string(),
                json!({"image": 7}).to_string(),
                json!({"image": "ok.png"}).to_string(),
            ],
        )
        .unwrap();

        let source = SqliteRecordSource::open(&path).unwrap();
        let (result, records) = collect(&source, Collection::Game);
        let stats = result.unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_table_is_query_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE game (document TEXT)")
            .unwrap();

        let source = SqliteRecordSource::open(&path).unwrap();
        let (result, _) = collect(&source, Collection::GameBrand);
        assert!(matches!(
            result,
            Err(SourceError::Query {
                collection: Collection::GameBrand,
                ..
            })
        ));
    }

    #[test]
    fn test_visitor_can_stop_scan() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.db");
        let games: Vec<_> = (0..10)
            .map(|i| json!({ "image": format!("{}.png", i) }).to_string())
            .collect();
        write_records_db(&path, &[], &games).unwrap();

        let source = SqliteRecordSource::open(&path).unwrap();
        let mut seen = 0;
        let stats = source
            .scan(Collection::Game, &mut |_| {
                seen += 1;
                if seen == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(seen, 3);
        assert_eq!(stats.records, 3);
    }
}
