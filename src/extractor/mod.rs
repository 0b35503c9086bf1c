//! HTML-to-record extraction.
//!
//! The [`GameExtractor`] trait is the parsing seam consumed by the
//! harvester; [`HtmlGameExtractor`] implements the archive's actual
//! markup conventions. Season listing pages are handled by the free
//! functions in [`season`], used by the frontier.

pub mod game;
pub mod season;

pub use game::HtmlGameExtractor;

use crate::GameRecord;

/// Extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Document is not valid UTF-8
    #[error("document is not valid UTF-8: {0}")]
    Utf8Error(String),

    /// Document carries no recognizable game content
    #[error("no game content found: {0}")]
    MissingContent(String),

    /// Extracted record failed validation
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Parses one raw game document into a domain record.
pub trait GameExtractor: Send + Sync {
    /// Parse the bytes of a game page.
    fn parse(&self, season_id: &str, game_id: u32, bytes: &[u8]) -> ExtractResult<GameRecord>;
}
