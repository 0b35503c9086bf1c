//! Per-game processing outcomes.
//!
//! Every worker emits exactly one [`GameOutcome`] per game it takes off
//! the queue: a parsed record or a classified failure. A failure is
//! data, not control flow; it never unwinds the pool.

use crate::GameRecord;

/// Why a game failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The document could not be fetched
    Transport,
    /// The document could not be parsed into a record
    Parse,
    /// An unexpected fault inside the worker
    Internal,
}

impl FailureKind {
    /// Stable lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Parse => "parse",
            FailureKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of processing one game.
#[derive(Debug)]
pub struct GameOutcome {
    /// Which game this outcome belongs to
    pub game_id: u32,
    /// What happened
    pub kind: OutcomeKind,
}

/// Outcome payload: a record or a classified failure.
#[derive(Debug)]
pub enum OutcomeKind {
    /// The game parsed into a record
    Record(Box<GameRecord>),
    /// The game terminally failed this run
    Failure {
        /// Failure classification
        kind: FailureKind,
        /// Human-readable context for re-investigation
        message: String,
    },
}

impl GameOutcome {
    /// Build a success outcome.
    pub fn record(game_id: u32, record: GameRecord) -> Self {
        Self {
            game_id,
            kind: OutcomeKind::Record(Box::new(record)),
        }
    }

    /// Build a failure outcome.
    pub fn failure(game_id: u32, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            game_id,
            kind: OutcomeKind::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    /// Whether this outcome carries a record.
    pub fn is_record(&self) -> bool {
        matches!(self.kind, OutcomeKind::Record(_))
    }
}
