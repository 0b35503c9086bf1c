//! SQLite persistence backend.
//!
//! Schema: `gamelist` (one row per game), `clues`, `game_roster`,
//! `categories`, plus a `contestants` view of distinct players. Each
//! season batch is written in a single transaction so a failed write
//! leaves no partial season behind.

use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

use crate::GameRecord;

use super::{RecordStore, StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS gamelist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    season_id TEXT NOT NULL,
    game_id INTEGER NOT NULL UNIQUE,
    show_num INTEGER,
    air_date TEXT,
    tape_date TEXT
);

CREATE TABLE IF NOT EXISTS clues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    season_id TEXT NOT NULL,
    game_id INTEGER NOT NULL,
    round_name TEXT NOT NULL,
    category TEXT NOT NULL,
    position TEXT,
    value TEXT,
    order_number INTEGER,
    text TEXT NOT NULL,
    correct_response TEXT,
    correct_contestant TEXT
);

CREATE TABLE IF NOT EXISTS game_roster (
    player_id TEXT NOT NULL,
    season_id TEXT NOT NULL,
    game_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    nickname TEXT,
    bio TEXT,
    UNIQUE(player_id, game_id)
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    season_id TEXT NOT NULL,
    game_id INTEGER NOT NULL,
    round_name TEXT NOT NULL,
    category_name TEXT NOT NULL,
    UNIQUE(game_id, round_name, category_name)
);

CREATE VIEW IF NOT EXISTS contestants AS
    SELECT DISTINCT player_id, name FROM game_roster;
"#;

/// SQLite-backed record store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| StoreError::SqlError(format!("Failed to open {}: {e}", path.display())))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::SqlError(format!("Failed to create schema: {e}")))?;
        info!(path = %path.display(), "Opened SQLite store");
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::SqlError(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::SqlError(format!("Failed to create schema: {e}")))?;
        Ok(Self { conn })
    }

    /// Borrow the underlying connection (tests and ad-hoc queries).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_game(tx: &rusqlite::Transaction<'_>, record: &GameRecord) -> rusqlite::Result<()> {
        tx.execute(
            "INSERT OR IGNORE INTO gamelist (season_id, game_id, show_num, air_date, tape_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.season_id,
                record.game_id,
                record.show_num,
                record.air_date.map(|d| d.to_string()),
                record.tape_date.map(|d| d.to_string()),
            ],
        )?;

        for round in &record.rounds {
            for name in &round.categories {
                tx.execute(
                    "INSERT OR IGNORE INTO categories (season_id, game_id, round_name, category_name)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![record.season_id, record.game_id, round.kind.label(), name],
                )?;
            }

            for (index, clue) in round.clues.iter().enumerate() {
                tx.execute(
                    "INSERT INTO clues (season_id, game_id, round_name, category, position,
                                        value, order_number, text, correct_response, correct_contestant)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        record.season_id,
                        record.game_id,
                        round.kind.label(),
                        round.category_for(index).unwrap_or_default(),
                        clue.position,
                        clue.value,
                        clue.order_number,
                        clue.text,
                        clue.correct_response,
                        clue.correct_contestant,
                    ],
                )?;
            }
        }

        for contestant in &record.contestants {
            tx.execute(
                "INSERT OR IGNORE INTO game_roster (player_id, season_id, game_id, name, nickname, bio)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    contestant.player_id,
                    record.season_id,
                    record.game_id,
                    contestant.name,
                    contestant.nickname,
                    contestant.bio,
                ],
            )?;
        }

        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn write_batch(&mut self, season_id: &str, records: &[GameRecord]) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| StoreError::SqlError(format!("Failed to begin transaction: {e}")))?;

        for record in records {
            Self::insert_game(&tx, record).map_err(|e| {
                StoreError::SqlError(format!(
                    "Failed to insert game {} of season {season_id}: {e}",
                    record.game_id
                ))
            })?;
        }

        tx.commit()
            .map_err(|e| StoreError::SqlError(format!("Failed to commit batch: {e}")))?;

        info!(
            season = season_id,
            records = records.len(),
            "Season batch written to SQLite"
        );
        Ok(())
    }
}
