//! CSV persistence backend.
//!
//! Writes one row per clue, flattening the round/category structure the
//! same way the SQLite backend does. Useful for feeding the harvest
//! straight into spreadsheet or dataframe tooling.

use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::GameRecord;

use super::{RecordStore, StoreError, StoreResult};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// CSV row: one clue with its game and category context.
#[derive(Debug, Serialize)]
struct ClueRow<'a> {
    season_id: &'a str,
    game_id: u32,
    round_name: &'static str,
    category: &'a str,
    position: &'a str,
    value: &'a str,
    order_number: Option<u32>,
    text: &'a str,
    correct_response: &'a str,
    correct_contestant: &'a str,
}

/// CSV-backed record store.
pub struct CsvClueStore {
    writer: Writer<BufWriter<File>>,
    rows_written: u64,
}

impl CsvClueStore {
    /// Create the output file, truncating any existing content.
    pub fn create<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::IoError(format!("Failed to create directory: {e}"))
            })?;
        }

        let file = File::create(path)
            .map_err(|e| StoreError::IoError(format!("Failed to create file: {e}")))?;
        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        info!(path = %path.display(), "Created CSV store");
        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            rows_written: 0,
        })
    }

    /// Number of clue rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl RecordStore for CsvClueStore {
    fn write_batch(&mut self, season_id: &str, records: &[GameRecord]) -> StoreResult<()> {
        for record in records {
            for round in &record.rounds {
                for (index, clue) in round.clues.iter().enumerate() {
                    let row = ClueRow {
                        season_id,
                        game_id: record.game_id,
                        round_name: round.kind.label(),
                        category: round.category_for(index).unwrap_or_default(),
                        position: &clue.position,
                        value: &clue.value,
                        order_number: clue.order_number,
                        text: &clue.text,
                        correct_response: &clue.correct_response,
                        correct_contestant: &clue.correct_contestant,
                    };
                    self.writer
                        .serialize(&row)
                        .map_err(|e| StoreError::CsvError(format!("Failed to write clue: {e}")))?;
                    self.rows_written += 1;
                }
            }
        }

        // One flush per batch keeps the file consistent at season
        // boundaries without per-row syscall overhead
        self.writer
            .flush()
            .map_err(|e| StoreError::CsvError(format!("Failed to flush: {e}")))?;

        info!(
            season = season_id,
            records = records.len(),
            rows = self.rows_written,
            "Season batch written to CSV"
        );
        Ok(())
    }
}
