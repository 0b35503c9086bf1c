//! Durable harvest progress state.
//!
//! Provides the crash-resumable checkpoint record with atomic writes and
//! file locking.

pub mod state;

pub use state::{CheckpointError, CheckpointStore, HarvestState, SeasonProgress};
