//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the origin and record
//! source traits, so the full pipeline can be exercised without a network
//! or a record database.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgmirror_core::testing::{MemoryRecordSource, MockOrigin, MockResponse};
//!
//! let origin = MockOrigin::new();
//! origin.respond_with("https://cdn/uploads/logo.png", MockResponse::ok(vec![1, 2, 3])).await;
//!
//! let source = MemoryRecordSource::new()
//!     .with_records(Collection::GameBrand, vec![json!({"logo": "logo.png"})]);
//! ```

mod mock_origin;
mod mock_source;

pub use mock_origin::{MockOrigin, MockResponse};
pub use mock_source::MemoryRecordSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use rusqlite::{params, Connection};

    use crate::source::Collection;

    /// Create a record database at `path` with both collection tables,
    /// filled with the given raw documents.
    pub fn write_records_db(
        path: &Path,
        brands: &[String],
        games: &[String],
    ) -> rusqlite::Result<()> {
        let mut conn = Connection::open(path)?;
        let tx = conn.transaction()?;
        for (collection, documents) in [(Collection::GameBrand, brands), (Collection::Game, games)] {
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (document TEXT)",
                collection.table()
            ))?;
            let sql = format!("INSERT INTO {} (document) VALUES (?1)", collection.table());
            for document in documents {
                tx.execute(&sql, params![document])?;
            }
        }
        tx.commit()
    }

    /// A brand document with the given logo.
    pub fn brand_with_logo(code: &str, logo: &str) -> String {
        serde_json::json!({
            "code": code,
            "status": "active",
            "logo": logo,
        })
        .to_string()
    }

    /// A game document with the given image.
    pub fn game_with_image(code: &str, image: &str) -> String {
        serde_json::json!({
            "game_code": code,
            "name": code,
            "image": image,
        })
        .to_string()
    }
}
