//! Harvest observability metrics.
//!
//! Thin wrappers over the `metrics` facade so call sites stay one-liners.
//! A Prometheus scrape endpoint can be installed at startup via
//! [`init_metrics`]; without it, recording is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

/// Initialize the Prometheus exporter and register metric descriptions.
///
/// Call once at startup; typically gated on a `METRICS_ADDR` env var.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    info!("Initializing metrics endpoint on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "archive_http_requests_total",
        Unit::Count,
        "Total HTTP requests made to the archive"
    );
    describe_counter!(
        "archive_http_throttled_total",
        Unit::Count,
        "Total 429 responses received from the archive"
    );
    describe_counter!(
        "harvest_games_completed_total",
        Unit::Count,
        "Games successfully parsed and batched for storage"
    );
    describe_counter!(
        "harvest_games_failed_total",
        Unit::Count,
        "Games that terminally failed in a run"
    );
    describe_counter!(
        "harvest_cache_hits_total",
        Unit::Count,
        "Game documents served from the on-disk cache"
    );
    describe_histogram!(
        "harvest_season_duration_seconds",
        Unit::Seconds,
        "Wall-clock time to drain one season"
    );

    Ok(())
}

/// Record one outbound HTTP request.
pub fn record_http_request() {
    counter!("archive_http_requests_total").increment(1);
}

/// Record one 429 response.
pub fn record_http_throttled() {
    counter!("archive_http_throttled_total").increment(1);
}

/// Record a completed game outcome.
pub fn record_game_completed() {
    counter!("harvest_games_completed_total").increment(1);
}

/// Record a failed game outcome, labeled by failure kind.
pub fn record_game_failed(kind: &'static str) {
    counter!("harvest_games_failed_total", "kind" => kind).increment(1);
}

/// Record a cache hit.
pub fn record_cache_hit() {
    counter!("harvest_cache_hits_total").increment(1);
}

/// Tracks one season's wall-clock duration.
pub struct SeasonTimer {
    season_id: String,
    started: Instant,
}

impl SeasonTimer {
    /// Start timing a season.
    pub fn start(season_id: impl Into<String>) -> Self {
        Self {
            season_id: season_id.into(),
            started: Instant::now(),
        }
    }

    /// Record the elapsed duration.
    pub fn finish(self) {
        histogram!("harvest_season_duration_seconds", "season" => self.season_id)
            .record(self.started.elapsed().as_secs_f64());
    }
}
