//! Season and game enumeration.
//!
//! The frontier produces the work list: which seasons to harvest, and
//! which games each season contains. Seasons come from a static list file
//! when one is supplied, otherwise from the archive's season index. Game
//! ids always come from the season's listing page.
//!
//! The frontier mutates nothing; a failure here means the work list is
//! unknowable and is reported up rather than papered over.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::extractor::{season, ExtractError};
use crate::fetcher::{DocumentFetcher, FetcherError};

/// Frontier errors
#[derive(Debug, thiserror::Error)]
pub enum FrontierError {
    /// Static season list could not be read
    #[error("failed to read season list file: {0}")]
    IoError(String),

    /// Remote listing fetch failed
    #[error("fetch error: {0}")]
    FetchError(#[from] FetcherError),

    /// Listing page could not be parsed
    #[error("extract error: {0}")]
    ExtractError(#[from] ExtractError),
}

/// Result type for frontier operations
pub type FrontierResult<T> = Result<T, FrontierError>;

/// Where season ids come from.
enum SeasonSource {
    /// Discover from the archive's season index page
    Discover,
    /// Newline-delimited file of season ids
    File(PathBuf),
    /// Explicit list, e.g. from a CLI flag
    List(Vec<String>),
}

/// Enumerates seasons and their games.
pub struct Frontier {
    fetcher: Arc<dyn DocumentFetcher>,
    source: SeasonSource,
}

impl Frontier {
    /// Frontier that discovers seasons from the archive's index page.
    pub fn discover(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            fetcher,
            source: SeasonSource::Discover,
        }
    }

    /// Frontier that reads season ids from a newline-delimited file,
    /// overriding remote discovery.
    pub fn from_file(fetcher: Arc<dyn DocumentFetcher>, path: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            source: SeasonSource::File(path.into()),
        }
    }

    /// Frontier over an explicit season list.
    pub fn from_list(fetcher: Arc<dyn DocumentFetcher>, seasons: Vec<String>) -> Self {
        Self {
            fetcher,
            source: SeasonSource::List(seasons),
        }
    }

    /// List season ids in processing order.
    pub async fn list_seasons(&self) -> FrontierResult<Vec<String>> {
        match &self.source {
            SeasonSource::File(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    FrontierError::IoError(format!("{}: {e}", path.display()))
                })?;
                let seasons: Vec<String> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                info!(
                    path = %path.display(),
                    seasons = seasons.len(),
                    "Loaded static season list"
                );
                Ok(seasons)
            }
            SeasonSource::List(seasons) => Ok(seasons.clone()),
            SeasonSource::Discover => {
                let bytes = self.fetcher.fetch_season_index().await?;
                let seasons = season::extract_season_ids(&bytes)?;
                info!(seasons = seasons.len(), "Discovered seasons from archive index");
                Ok(seasons)
            }
        }
    }

    /// List the game ids of one season, in listing order.
    pub async fn list_games(&self, season_id: &str) -> FrontierResult<Vec<u32>> {
        let bytes = self.fetcher.fetch_season(season_id).await?;
        let games = season::extract_game_ids(&bytes)?;
        debug!(season = season_id, games = games.len(), "Listed season games");
        Ok(games)
    }
}
