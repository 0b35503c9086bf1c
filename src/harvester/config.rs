//! Harvest configuration constants.

use std::time::Duration;

/// Maximum number of retries for a failed fetch.
/// 5 retries with exponential backoff rides out transient network issues
/// without looping forever on a dead host (max total wait ~1 minute).
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// Caps exponential growth so a long retry chain stays responsive.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Checkpoint cadence: save the progress state every N aggregated
/// outcomes, in addition to the save at every season boundary.
pub const CHECKPOINT_INTERVAL_OUTCOMES: u64 = 10;

/// Default worker pool size per season.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default pause between seasons, bounding sustained request rate
/// against the archive.
pub const DEFAULT_SEASON_DELAY: Duration = Duration::from_secs(2);

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS * 2u64.pow(retry_count);
    let delay_ms = delay_ms.min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}
