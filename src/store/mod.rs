//! Record persistence backends.
//!
//! The harvester hands each season's records to a [`RecordStore`] as one
//! batch, from the single aggregation step; implementations never see
//! concurrent callers. A batch write either fully succeeds or fails the
//! run. There is no partial-success contract.

use crate::GameRecord;

pub mod csv;
pub mod sqlite;

pub use csv::CsvClueStore;
pub use sqlite::SqliteStore;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// SQLite error
    #[error("SQL error: {0}")]
    SqlError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persists batches of game records.
pub trait RecordStore: Send {
    /// Write one season's batch of records durably.
    fn write_batch(&mut self, season_id: &str, records: &[GameRecord]) -> StoreResult<()>;
}
