//! CLI error types and conversions

use crate::checkpoint::CheckpointError;
use crate::frontier::FrontierError;
use crate::harvester::HarvestError;
use crate::store::StoreError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Harvest error
    #[error("harvest error: {0}")]
    HarvestError(#[from] HarvestError),

    /// Frontier error
    #[error("frontier error: {0}")]
    FrontierError(#[from] FrontierError),

    /// Store error
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    /// Checkpoint error
    #[error("checkpoint error: {0}")]
    CheckpointError(#[from] CheckpointError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
