//! Progress reporting for long-running harvests.
//!
//! The aggregation step feeds every outcome through a [`PoolProgress`]
//! state; emission is gated by time and percentage so a 300-game season
//! logs a handful of progress lines instead of 300.

use std::time::{Duration, Instant};

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_MIN_PERCENTAGE_STEP: f64 = 10.0;

/// Progress state for one season's worker pool drain.
#[derive(Debug, Clone)]
pub struct PoolProgress {
    /// Outcomes aggregated so far (records and failures both count)
    pub outcomes_seen: u64,
    /// Failures among them
    pub failures_seen: u64,
    /// Pending games at pool start
    pub total_expected: u64,
    start_time: Instant,
    last_update: Instant,
    update_interval: Duration,
    last_reported_percentage: f64,
    min_percentage_step: f64,
}

impl PoolProgress {
    /// Create progress state expecting `total_expected` outcomes.
    pub fn new(total_expected: u64) -> Self {
        let now = Instant::now();
        Self {
            outcomes_seen: 0,
            failures_seen: 0,
            total_expected,
            start_time: now,
            last_update: now,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            last_reported_percentage: 0.0,
            min_percentage_step: DEFAULT_MIN_PERCENTAGE_STEP,
        }
    }

    /// Record one aggregated outcome.
    pub fn record_outcome(&mut self, is_failure: bool) {
        self.outcomes_seen += 1;
        if is_failure {
            self.failures_seen += 1;
        }
    }

    /// Completion percentage (0-100).
    pub fn percentage(&self) -> f64 {
        if self.total_expected == 0 {
            return 100.0;
        }
        (self.outcomes_seen as f64 / self.total_expected as f64) * 100.0
    }

    /// Outcomes per second since the pool started.
    pub fn rate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.outcomes_seen as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Whether a progress line should be emitted now.
    pub fn should_emit_update(&self) -> bool {
        if self.outcomes_seen == 0 {
            return false;
        }
        if self.percentage() - self.last_reported_percentage >= self.min_percentage_step {
            return true;
        }
        self.last_update.elapsed() >= self.update_interval
    }

    /// Call after emitting a progress line.
    pub fn mark_emitted(&mut self) {
        self.last_update = Instant::now();
        self.last_reported_percentage = self.percentage();
    }

    /// Human-readable progress line.
    pub fn format_progress(&self) -> String {
        let mut line = format!(
            "Processed {}/{} games - {:.1}% complete",
            self.outcomes_seen,
            self.total_expected,
            self.percentage()
        );
        if self.failures_seen > 0 {
            line.push_str(&format!(" ({} failed)", self.failures_seen));
        }
        let rate = self.rate();
        if rate > 0.0 {
            line.push_str(&format!(" at {rate:.1} games/sec"));
        }
        line
    }
}
