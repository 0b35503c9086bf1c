//! Harvest checkpoint persistence and management.
//!
//! The state file is a single JSON document. Writes are atomic: serialize
//! to a temp file in the target directory, fsync, rename, fsync the
//! directory. An in-place overwrite could leave a corrupt checkpoint on
//! crash mid-write, which would cost an entire re-run.

use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Maximum allowed state file size (10 MB) to prevent memory exhaustion
pub const MAX_STATE_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Per-season completion bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonProgress {
    /// Games whose records were produced and handed to the store
    pub completed_game_ids: BTreeSet<u32>,
    /// Games that terminally failed in some run
    pub failed_game_ids: BTreeSet<u32>,
}

/// Durable progress record for a harvest, surviving process restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarvestState {
    /// Most recent season whose batch was durably stored
    pub last_fully_completed_season: Option<String>,
    /// Per-season completion state, keyed by season id
    pub per_season: BTreeMap<String, SeasonProgress>,
    /// When the state was last mutated
    pub last_updated: DateTime<Utc>,
}

impl Default for HarvestState {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestState {
    /// Create a fresh, empty state.
    pub fn new() -> Self {
        Self {
            last_fully_completed_season: None,
            per_season: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Progress for one season, if any has been recorded.
    pub fn season(&self, season_id: &str) -> Option<&SeasonProgress> {
        self.per_season.get(season_id)
    }

    /// Whether a season is the one recorded as fully completed.
    pub fn is_fully_completed(&self, season_id: &str) -> bool {
        self.last_fully_completed_season.as_deref() == Some(season_id)
    }

    /// Record a game as completed: its record was produced and is part of
    /// the batch handed to the store this season.
    ///
    /// A game completed on retry leaves the failed set.
    pub fn record_completed(&mut self, season_id: &str, game_id: u32) {
        let progress = self.per_season.entry(season_id.to_string()).or_default();
        progress.completed_game_ids.insert(game_id);
        progress.failed_game_ids.remove(&game_id);
        self.last_updated = Utc::now();
    }

    /// Record a game as failed. Failed games stay recorded; they are not
    /// retried unless the operator asks for it.
    pub fn record_failed(&mut self, season_id: &str, game_id: u32) {
        let progress = self.per_season.entry(season_id.to_string()).or_default();
        progress.failed_game_ids.insert(game_id);
        self.last_updated = Utc::now();
    }

    /// Mark a season's batch as durably stored.
    pub fn mark_season_complete(&mut self, season_id: &str) {
        self.last_fully_completed_season = Some(season_id.to_string());
        self.last_updated = Utc::now();
    }
}

/// Checkpoint persistence errors
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// State file too large
    #[error("state file too large: {size} bytes (max: {max} bytes)")]
    StateTooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    DeserializationError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),
}

/// Loads and saves [`HarvestState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store backed by `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, returning a fresh empty state when no file exists.
    /// Absence is not an error; a first run starts from nothing.
    pub fn load(&self) -> Result<HarvestState, CheckpointError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No checkpoint found, starting with empty state");
            return Ok(HarvestState::new());
        }

        let lock_file = self.open_lock_file()?;
        let lock = RwLock::new(lock_file);
        let _guard = lock
            .read()
            .map_err(|e| CheckpointError::LockError(format!("Failed to acquire read lock: {e}")))?;

        let metadata = std::fs::metadata(&self.path)
            .map_err(|e| CheckpointError::IoError(e.to_string()))?;
        if metadata.len() > MAX_STATE_FILE_SIZE {
            return Err(CheckpointError::StateTooLarge {
                size: metadata.len(),
                max: MAX_STATE_FILE_SIZE,
            });
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| CheckpointError::IoError(e.to_string()))?;

        let state: HarvestState = serde_json::from_str(&contents).map_err(|e| {
            warn!(error = %e, "Failed to deserialize checkpoint");
            CheckpointError::DeserializationError(e.to_string())
        })?;

        info!(
            seasons_tracked = state.per_season.len(),
            last_fully_completed = ?state.last_fully_completed_season,
            "Checkpoint loaded"
        );
        Ok(state)
    }

    /// Save the state atomically.
    ///
    /// The state is small (ids, not content), so writing it whole on every
    /// save keeps the I/O cost bounded even at a per-10-outcomes cadence.
    pub fn save(&self, state: &HarvestState) -> Result<(), CheckpointError> {
        debug!(
            path = %self.path.display(),
            seasons_tracked = state.per_season.len(),
            "Saving checkpoint"
        );

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CheckpointError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| CheckpointError::SerializationError(e.to_string()))?;

        let lock_file = self.open_lock_file()?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock.write().map_err(|e| {
            CheckpointError::LockError(format!("Failed to acquire write lock: {e}"))
        })?;

        let parent_dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| CheckpointError::IoError(format!("Failed to create temp file: {e}")))?;

        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| CheckpointError::IoError(format!("Failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| CheckpointError::IoError(format!("Failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| CheckpointError::IoError(format!("Failed to sync temp file: {e}")))?;

        temp_file
            .persist(&self.path)
            .map_err(|e| CheckpointError::IoError(format!("Failed to persist temp file: {e}")))?;

        // Fsync parent directory to ensure the rename is durable
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(path = %self.path.display(), "Checkpoint saved");
        Ok(())
    }

    fn open_lock_file(&self) -> Result<std::fs::File, CheckpointError> {
        let lock_path = self.path.with_extension("lock");
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CheckpointError::LockError(format!("Failed to create lock file: {e}")))
    }
}
