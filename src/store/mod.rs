use anyhow::Result;
use serde_json::Value;

use crate::model::IncidentRow;

mod rest;
mod sqlite;

pub use rest::RestSink;
pub use sqlite::SqliteSink;

/// Destination for batched incident inserts.
///
/// A call inserts every row or fails as a whole. On success it returns the
/// rows as stored, so callers can count what actually landed.
pub trait RowSink {
    fn insert_rows(&mut self, table: &str, rows: &[IncidentRow]) -> Result<Vec<Value>>;
}
