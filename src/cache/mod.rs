//! On-disk page cache for raw game documents.
//!
//! Layout: one subdirectory per season (`season_<id>`), one file per game
//! (`<gameID>_<seasonID>_j-archive.html`). Entries are immutable once
//! written; there is no eviction. Cache growth is the operator's concern.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filename suffix for cached documents.
const CACHE_SUFFIX: &str = "j-archive.html";

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// IO error reading or writing an entry
    #[error("cache IO error: {0}")]
    IoError(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Content cache mapping (season id, game id) to raw document bytes.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    /// Create a cache rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn season_dir(&self, season_id: &str) -> PathBuf {
        self.root.join(format!("season_{season_id}"))
    }

    fn entry_path(&self, season_id: &str, game_id: u32) -> PathBuf {
        self.season_dir(season_id)
            .join(format!("{game_id}_{season_id}_{CACHE_SUFFIX}"))
    }

    /// Look up the cached document for a game.
    ///
    /// Returns `Ok(None)` when no entry exists; only genuine IO failures
    /// are errors.
    pub fn get(&self, season_id: &str, game_id: u32) -> CacheResult<Option<Bytes>> {
        let path = self.entry_path(season_id, game_id);
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!(season = season_id, game_id, path = %path.display(), "Cache hit");
                Ok(Some(Bytes::from(bytes)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::IoError(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Store the document for a game, creating directories as needed.
    ///
    /// Writing identical content over an existing entry is a no-op.
    /// Different content silently overwrites: source content is assumed
    /// immutable, so last-writer-wins is acceptable.
    pub fn put(&self, season_id: &str, game_id: u32, bytes: &[u8]) -> CacheResult<()> {
        let dir = self.season_dir(season_id);
        std::fs::create_dir_all(&dir).map_err(|e| {
            CacheError::IoError(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let path = self.entry_path(season_id, game_id);
        if let Ok(existing) = std::fs::read(&path) {
            if existing == bytes {
                debug!(season = season_id, game_id, "Cache entry unchanged, skipping write");
                return Ok(());
            }
        }

        std::fs::write(&path, bytes).map_err(|e| {
            CacheError::IoError(format!("Failed to write {}: {e}", path.display()))
        })?;
        debug!(
            season = season_id,
            game_id,
            bytes = bytes.len(),
            "Cached document"
        );
        Ok(())
    }

    /// Whether an entry exists for a game.
    pub fn contains(&self, season_id: &str, game_id: u32) -> bool {
        self.entry_path(season_id, game_id).exists()
    }
}
