//! # J-Archive Harvester Library
//!
//! A resumable, rate-limited harvester for the J-Archive trivia game
//! archive. Designed for long batch runs that survive interruption and
//! never re-fetch work that already completed.
//!
//! ## Features
//!
//! - **Resumable**: durable JSON checkpoint tracking per-season completion
//! - **Bounded Concurrency**: fixed worker pool per season, one season at a time
//! - **Content Cache**: on-disk HTML cache, check-before-fetch
//! - **Fault Isolation**: one bad game never aborts the rest of its season
//! - **Pluggable Persistence**: SQLite or CSV backends behind one trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use jarchive_harvester::extractor::HtmlGameExtractor;
//! use jarchive_harvester::fetcher::HttpFetcher;
//! use jarchive_harvester::frontier::Frontier;
//! use jarchive_harvester::harvester::{Harvester, HarvesterConfig};
//! use jarchive_harvester::store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new());
//! let frontier = Frontier::discover(fetcher.clone());
//! let store = Box::new(SqliteStore::open("jeopardy.db")?);
//!
//! let mut harvester = Harvester::new(
//!     fetcher,
//!     Arc::new(HtmlGameExtractor::new()),
//!     store,
//!     HarvesterConfig::default(),
//! );
//! let summary = harvester.run(&frontier).await?;
//! println!("{} games harvested", summary.games_completed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`frontier`] - Season and game enumeration (static list or discovery)
//! - [`harvester`] - Harvest orchestration: worker pool, outcomes, checkpoints
//! - [`checkpoint`] - Durable progress state with atomic writes
//! - [`cache`] - On-disk page cache
//! - [`fetcher`] - HTTP document fetching with retry and rate limiting
//! - [`extractor`] - HTML-to-record parsing
//! - [`store`] - Record persistence (SQLite, CSV)

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// On-disk page cache
pub mod cache;

/// Durable harvest progress state
pub mod checkpoint;

/// CLI command implementations
pub mod cli;

/// HTML-to-record extraction
pub mod extractor;

/// Document fetching over HTTP
pub mod fetcher;

/// Season and game enumeration
pub mod frontier;

/// Harvest orchestration
pub mod harvester;

/// Harvest observability metrics
pub mod metrics;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Record persistence backends
pub mod store;

/// One parsed game: the domain record handed to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRecord {
    /// Numeric game id as used by `showgame.php?game_id=`
    pub game_id: u32,
    /// Season the game belongs to (e.g. "40")
    pub season_id: String,
    /// Show number extracted from the page title
    pub show_num: Option<u32>,
    /// Original air date
    pub air_date: Option<NaiveDate>,
    /// Taping date, when published
    pub tape_date: Option<NaiveDate>,
    /// Rounds in play order (single, double, final)
    pub rounds: Vec<Round>,
    /// Contestants on the game's roster
    pub contestants: Vec<Contestant>,
}

impl GameRecord {
    /// Validate record integrity before it is handed to a store.
    pub fn validate(&self) -> Result<(), String> {
        if self.game_id == 0 {
            return Err("Game id cannot be zero".to_string());
        }

        if self.season_id.is_empty() {
            return Err("Season id cannot be empty".to_string());
        }

        if self.rounds.len() > 3 {
            return Err(format!(
                "A game has at most 3 rounds, got {}",
                self.rounds.len()
            ));
        }

        for round in &self.rounds {
            round.validate()?;
        }

        Ok(())
    }
}

/// Round kind within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundKind {
    /// First round
    #[serde(rename = "J")]
    Single,
    /// Second round with doubled values
    #[serde(rename = "DJ")]
    Double,
    /// Final round (single clue, no board)
    #[serde(rename = "FJ")]
    Final,
}

impl RoundKind {
    /// Display name matching the archive's own labels.
    pub fn label(&self) -> &'static str {
        match self {
            RoundKind::Single => "Jeopardy! Round",
            RoundKind::Double => "Double Jeopardy! Round",
            RoundKind::Final => "Final Jeopardy",
        }
    }
}

impl std::fmt::Display for RoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One round of a game: its categories and clues.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Round {
    /// Which round this is
    pub kind: RoundKind,
    /// Category names in board order
    pub categories: Vec<String>,
    /// Clues in document order
    pub clues: Vec<Clue>,
}

impl Round {
    /// Category a clue at `clue_index` belongs to.
    ///
    /// The board lays clues out row-major, so the column (and therefore
    /// category) is the index modulo the category count.
    pub fn category_for(&self, clue_index: usize) -> Option<&str> {
        if self.categories.is_empty() {
            return None;
        }
        Some(self.categories[clue_index % self.categories.len()].as_str())
    }

    /// Validate round integrity.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind != RoundKind::Final && !self.clues.is_empty() && self.categories.is_empty() {
            return Err(format!(
                "{} has {} clues but no categories",
                self.kind,
                self.clues.len()
            ));
        }
        Ok(())
    }
}

/// One clue on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Clue {
    /// Board position id (e.g. "J_3_2")
    pub position: String,
    /// Dollar value as displayed (e.g. "$400", "DD: $2,000")
    pub value: String,
    /// Order in which the clue was revealed during play
    pub order_number: Option<u32>,
    /// Clue text
    pub text: String,
    /// Correct response
    pub correct_response: String,
    /// Contestant credited with the correct response, when recorded
    pub correct_contestant: String,
}

/// One contestant on a game's roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contestant {
    /// Archive player id
    pub player_id: String,
    /// Full name
    pub name: String,
    /// First name as used on air
    pub nickname: String,
    /// One-line bio from the contestant table
    pub bio: String,
}
