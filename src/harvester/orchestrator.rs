//! Harvest orchestration: the core state machine.
//!
//! Per run, for each season in frontier order: partition its games
//! against the checkpoint, drain a bounded worker pool over the pending
//! set, aggregate outcomes into the single-owner progress state, hand the
//! season's records to the store as one batch, then advance the
//! checkpoint. Seasons are never pipelined against each other.
//!
//! Item lifecycle: pending, fetching (cache hit or transport), parsing,
//! then completed or failed. Failed is terminal within a run.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn, Instrument};

use crate::cache::PageCache;
use crate::checkpoint::{CheckpointStore, HarvestState};
use crate::extractor::GameExtractor;
use crate::fetcher::DocumentFetcher;
use crate::frontier::Frontier;
use crate::metrics::{self, SeasonTimer};
use crate::shutdown::{self, SharedShutdown};
use crate::store::RecordStore;
use crate::GameRecord;

use super::config::{CHECKPOINT_INTERVAL_OUTCOMES, DEFAULT_CONCURRENCY, DEFAULT_SEASON_DELAY};
use super::outcome::{FailureKind, GameOutcome, OutcomeKind};
use super::progress::PoolProgress;
use super::HarvestError;

/// What to do when a season's game list cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontierErrorPolicy {
    /// Abort the whole run
    #[default]
    Abort,
    /// Log, skip the season, continue with the next
    SkipSeason,
}

impl std::str::FromStr for FrontierErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FrontierErrorPolicy::Abort),
            "skip" => Ok(FrontierErrorPolicy::SkipSeason),
            _ => Err(format!(
                "Invalid frontier error policy: {s}. Valid options: abort, skip"
            )),
        }
    }
}

/// Harvester configuration.
#[derive(Debug, Clone)]
pub struct HarvesterConfig {
    /// Worker pool size per season
    pub concurrency: usize,
    /// Root directory for the page cache
    pub cache_dir: PathBuf,
    /// Path of the checkpoint file
    pub checkpoint_path: PathBuf,
    /// Pause between seasons
    pub season_delay: Duration,
    /// Save the checkpoint every N aggregated outcomes
    pub checkpoint_interval: u64,
    /// Re-surface previously failed games into the pending set
    pub retry_failed: bool,
    /// Policy when a season's game list cannot be fetched
    pub frontier_error_policy: FrontierErrorPolicy,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            cache_dir: PathBuf::from("data"),
            checkpoint_path: PathBuf::from("data/checkpoint.json"),
            season_delay: DEFAULT_SEASON_DELAY,
            checkpoint_interval: CHECKPOINT_INTERVAL_OUTCOMES,
            retry_failed: false,
            frontier_error_policy: FrontierErrorPolicy::default(),
        }
    }
}

/// Totals for one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Seasons whose batch was stored this run
    pub seasons_processed: u64,
    /// Seasons skipped (already fully completed, or frontier-skipped)
    pub seasons_skipped: u64,
    /// Games completed this run
    pub games_completed: u64,
    /// Games failed this run
    pub games_failed: u64,
}

/// The harvest orchestrator.
///
/// Owns the checkpoint state exclusively: workers only ever see game ids
/// and emit outcomes; all bookkeeping happens in the aggregation step, so
/// the state needs no locking.
pub struct Harvester {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn GameExtractor>,
    store: Box<dyn RecordStore>,
    cache: PageCache,
    checkpoints: CheckpointStore,
    config: HarvesterConfig,
    shutdown: Option<SharedShutdown>,
}

impl Harvester {
    /// Create a harvester from its collaborators and configuration.
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn GameExtractor>,
        store: Box<dyn RecordStore>,
        config: HarvesterConfig,
    ) -> Self {
        let cache = PageCache::new(&config.cache_dir);
        let checkpoints = CheckpointStore::new(&config.checkpoint_path);
        Self {
            fetcher,
            extractor,
            store,
            cache,
            checkpoints,
            config,
            shutdown: shutdown::get_global_shutdown(),
        }
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Run the harvest over every season the frontier lists.
    pub async fn run(&mut self, frontier: &Frontier) -> Result<HarvestSummary, HarvestError> {
        let mut state = self.checkpoints.load()?;

        let seasons = frontier.list_seasons().await?;
        info!(
            seasons = seasons.len(),
            resuming_from = ?state.last_fully_completed_season,
            "Harvest plan ready"
        );

        let mut summary = HarvestSummary::default();
        let season_count = seasons.len();

        for (index, season_id) in seasons.iter().enumerate() {
            if self.shutdown_requested() {
                return self.abort_interrupted(&state);
            }

            // Coarse resume: the recorded fully-completed season is skipped
            // outright, without even listing its games
            if state.is_fully_completed(season_id) {
                info!(season = %season_id, "Season already fully completed, skipping");
                summary.seasons_skipped += 1;
                continue;
            }

            let span = tracing::info_span!("harvest_season", season = %season_id);
            let outcome = self
                .harvest_season(frontier, season_id, &mut state, &mut summary)
                .instrument(span)
                .await?;

            if outcome == SeasonOutcome::Interrupted {
                return self.abort_interrupted(&state);
            }

            if index + 1 < season_count && !self.config.season_delay.is_zero() {
                self.delay_between_seasons().await;
            }
        }

        info!(
            seasons_processed = summary.seasons_processed,
            games_completed = summary.games_completed,
            games_failed = summary.games_failed,
            "Harvest run finished"
        );
        Ok(summary)
    }

    fn abort_interrupted(&self, state: &HarvestState) -> Result<HarvestSummary, HarvestError> {
        info!("Shutdown requested - saving checkpoint before exiting");
        if let Err(e) = self.checkpoints.save(state) {
            warn!(error = %e, "Failed to save checkpoint during shutdown");
        }
        Err(HarvestError::Interrupted)
    }

    async fn delay_between_seasons(&self) {
        let delay = self.config.season_delay;
        debug!(delay_ms = delay.as_millis(), "Pausing before next season");
        if let Some(shutdown) = &self.shutdown {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.wait_for_shutdown() => {}
            }
        } else {
            tokio::time::sleep(delay).await;
        }
    }

    /// Process one season end to end: list, partition, drain, store,
    /// advance the checkpoint.
    async fn harvest_season(
        &mut self,
        frontier: &Frontier,
        season_id: &str,
        state: &mut HarvestState,
        summary: &mut HarvestSummary,
    ) -> Result<SeasonOutcome, HarvestError> {
        let games = match frontier.list_games(season_id).await {
            Ok(games) => games,
            Err(e) => match self.config.frontier_error_policy {
                FrontierErrorPolicy::Abort => {
                    error!(season = season_id, error = %e, "Cannot list season games, aborting run");
                    return Err(e.into());
                }
                FrontierErrorPolicy::SkipSeason => {
                    warn!(season = season_id, error = %e, "Cannot list season games, skipping season");
                    summary.seasons_skipped += 1;
                    return Ok(SeasonOutcome::Completed);
                }
            },
        };

        let pending = self.partition_pending(season_id, &games, state);
        info!(
            games = games.len(),
            pending = pending.len(),
            retry_failed = self.config.retry_failed,
            "Season work computed"
        );

        if pending.is_empty() {
            state.mark_season_complete(season_id);
            if let Err(e) = self.checkpoints.save(state) {
                warn!(error = %e, "Failed to save checkpoint, continuing with in-memory state");
            }
            summary.seasons_processed += 1;
            return Ok(SeasonOutcome::Completed);
        }

        let timer = SeasonTimer::start(season_id);
        let drain = self.drain_worker_pool(season_id, pending, state).await;

        summary.games_completed += drain.records.len() as u64;
        summary.games_failed += drain.failures;

        if drain.interrupted {
            return Ok(SeasonOutcome::Interrupted);
        }

        // The batch write is the durability boundary for the season. A
        // failed write is fatal: the run must stop rather than advance
        // the fully-completed marker past records that never landed.
        self.store.write_batch(season_id, &drain.records)?;

        state.mark_season_complete(season_id);
        if let Err(e) = self.checkpoints.save(state) {
            warn!(error = %e, "Failed to save checkpoint, continuing with in-memory state");
        }
        timer.finish();

        summary.seasons_processed += 1;
        info!(
            records = drain.records.len(),
            failures = drain.failures,
            "Season completed"
        );
        Ok(SeasonOutcome::Completed)
    }

    /// Partition a season's games into the pending set.
    ///
    /// Completed games are never re-attempted. Failed games stay excluded
    /// unless the operator explicitly opted into retrying them.
    fn partition_pending(
        &self,
        season_id: &str,
        games: &[u32],
        state: &HarvestState,
    ) -> Vec<u32> {
        match state.season(season_id) {
            Some(progress) => games
                .iter()
                .copied()
                .filter(|id| !progress.completed_game_ids.contains(id))
                .filter(|id| {
                    self.config.retry_failed || !progress.failed_game_ids.contains(id)
                })
                .collect(),
            None => games.to_vec(),
        }
    }

    /// Drain one season's pending games through the bounded worker pool.
    ///
    /// A fixed set of workers pulls ids from a shared queue; acquiring an
    /// id is the sole point of backpressure. Outcomes fan in over a
    /// channel to this single aggregation step, which is the only mutator
    /// of the checkpoint state. Completion order is not relied upon.
    async fn drain_worker_pool(
        &self,
        season_id: &str,
        pending: Vec<u32>,
        state: &mut HarvestState,
    ) -> DrainResult {
        let expected = pending.len() as u64;
        let worker_count = self.config.concurrency.min(pending.len()).max(1);
        let queue = Arc::new(Mutex::new(VecDeque::from(pending)));
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<GameOutcome>(worker_count);

        let mut workers = Vec::with_capacity(worker_count);
        for worker_index in 0..worker_count {
            let queue = Arc::clone(&queue);
            let outcome_tx = outcome_tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            let cache = self.cache.clone();
            let season = season_id.to_string();
            let shutdown = self.shutdown.clone();

            workers.push(tokio::spawn(async move {
                loop {
                    if shutdown
                        .as_ref()
                        .map(|s| s.is_shutdown_requested())
                        .unwrap_or(false)
                    {
                        debug!(worker = worker_index, "Worker stopping on shutdown");
                        break;
                    }

                    let game_id = match queue.lock().await.pop_front() {
                        Some(id) => id,
                        None => break,
                    };

                    let outcome =
                        process_game(&*fetcher, &*extractor, &cache, &season, game_id).await;
                    if outcome_tx.send(outcome).await.is_err() {
                        break;
                    }
                }
            }));
        }
        // The aggregation loop ends when every worker has dropped its sender
        drop(outcome_tx);

        let mut records: Vec<GameRecord> = Vec::new();
        let mut failures = 0u64;
        let mut outcomes_seen = 0u64;
        let mut progress = PoolProgress::new(expected);

        while let Some(outcome) = outcome_rx.recv().await {
            outcomes_seen += 1;
            match outcome.kind {
                OutcomeKind::Record(record) => {
                    state.record_completed(season_id, outcome.game_id);
                    metrics::record_game_completed();
                    records.push(*record);
                    progress.record_outcome(false);
                }
                OutcomeKind::Failure { kind, message } => {
                    warn!(
                        season = season_id,
                        game_id = outcome.game_id,
                        kind = kind.as_str(),
                        reason = %message,
                        "Game failed"
                    );
                    state.record_failed(season_id, outcome.game_id);
                    metrics::record_game_failed(kind.as_str());
                    failures += 1;
                    progress.record_outcome(true);
                }
            }

            if progress.should_emit_update() {
                info!(season = season_id, "{}", progress.format_progress());
                progress.mark_emitted();
            }

            if outcomes_seen % self.config.checkpoint_interval.max(1) == 0 {
                if let Err(e) = self.checkpoints.save(state) {
                    warn!(error = %e, "Failed to save checkpoint, continuing with in-memory state");
                }
            }
        }

        for worker in workers {
            if let Err(e) = worker.await {
                // A worker task itself must not die; process_game converts
                // faults into outcomes. Surface it loudly if one does.
                error!(error = %e, "Worker task aborted unexpectedly");
            }
        }

        let interrupted = self.shutdown_requested() && outcomes_seen < expected;
        DrainResult {
            records,
            failures,
            interrupted,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SeasonOutcome {
    Completed,
    Interrupted,
}

struct DrainResult {
    records: Vec<GameRecord>,
    failures: u64,
    interrupted: bool,
}

/// Obtain, parse, and classify one game. Always returns an outcome.
async fn process_game(
    fetcher: &dyn DocumentFetcher,
    extractor: &dyn GameExtractor,
    cache: &PageCache,
    season_id: &str,
    game_id: u32,
) -> GameOutcome {
    let cached = match cache.get(season_id, game_id) {
        Ok(hit) => hit,
        Err(e) => {
            // A broken cache entry degrades to a fetch, never a failure
            warn!(season = season_id, game_id, error = %e, "Cache read failed, fetching instead");
            None
        }
    };

    let bytes = match cached {
        Some(bytes) => {
            metrics::record_cache_hit();
            bytes
        }
        None => {
            let bytes = match fetcher.fetch_game(game_id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    return GameOutcome::failure(game_id, FailureKind::Transport, e.to_string())
                }
            };
            if let Err(e) = cache.put(season_id, game_id, &bytes) {
                // Non-fatal: the in-memory bytes still feed the parser
                warn!(season = season_id, game_id, error = %e, "Cache write failed");
            }
            bytes
        }
    };

    let parsed = std::panic::catch_unwind(AssertUnwindSafe(|| {
        extractor.parse(season_id, game_id, &bytes)
    }));

    match parsed {
        Ok(Ok(record)) => GameOutcome::record(game_id, record),
        Ok(Err(e)) => GameOutcome::failure(game_id, FailureKind::Parse, e.to_string()),
        Err(panic) => GameOutcome::failure(
            game_id,
            FailureKind::Internal,
            panic_message(panic.as_ref()),
        ),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
