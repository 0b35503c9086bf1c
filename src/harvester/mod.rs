//! Harvest orchestration.
//!
//! This module owns the run loop that turns a list of seasons into a
//! bounded set of concurrently processed games, survives interruption,
//! and attempts each game at most once per run.
//!
//! # Overview
//!
//! 1. **Enumeration**: the [`crate::frontier::Frontier`] lists seasons and games
//! 2. **Partitioning**: the checkpoint decides what is still pending
//! 3. **Draining**: a fixed worker pool processes pending games
//! 4. **Aggregation**: outcomes fan in to a single bookkeeping step
//! 5. **Persistence**: each season's records are stored as one batch
//!
//! # Error handling
//!
//! Per-game faults (transport, parse, internal) become
//! [`outcome::GameOutcome`] failures and never stop the pool. Store and
//! season-list failures are fatal; checkpoint and cache write failures
//! are logged and absorbed.

pub mod config;
pub mod orchestrator;
pub mod outcome;
pub mod progress;

pub use orchestrator::{FrontierErrorPolicy, Harvester, HarvesterConfig, HarvestSummary};
pub use outcome::{FailureKind, GameOutcome, OutcomeKind};
pub use progress::PoolProgress;

use crate::checkpoint::CheckpointError;
use crate::frontier::FrontierError;
use crate::store::StoreError;

/// Harvest errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Work list could not be enumerated
    #[error("frontier error: {0}")]
    Frontier(#[from] FrontierError),

    /// A season batch could not be durably stored
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The checkpoint could not be loaded at startup
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Shutdown was requested before the run finished
    #[error("harvest interrupted by shutdown request")]
    Interrupted,
}
