//! Shared test doubles: a scripted fetcher, an in-memory store, and
//! synthetic archive pages that the real extractor accepts.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jarchive_harvester::fetcher::{DocumentFetcher, FetcherError, FetcherResult};
use jarchive_harvester::harvester::HarvesterConfig;
use jarchive_harvester::store::{RecordStore, StoreError, StoreResult};
use jarchive_harvester::GameRecord;

/// Minimal but structurally faithful game page.
pub fn game_page(game_id: u32) -> String {
    format!(
        r#"<html>
<head><title>J! Archive - Show #{show}, aired 2024-01-15</title></head>
<body>
<table class="round">
  <tr><td class="category"><table><tr><td class="category_name">CATEGORY ONE</td></tr></table></td></tr>
  <tr>
    <td class="clue">
      <table>
        <tr><td class="clue_value">$200</td><td class="clue_order_number">1</td></tr>
        <tr><td class="clue_text" id="clue_J_1_1">clue for game {game_id}<em class="correct_response">response {game_id}</em></td></tr>
      </table>
    </td>
  </tr>
</table>
</body></html>"#,
        show = 9000 + game_id
    )
}

/// Season page linking the given games.
pub fn season_page(game_ids: &[u32]) -> String {
    let links: String = game_ids
        .iter()
        .map(|id| format!(r#"<a href="showgame.php?game_id={id}">game {id}</a>"#))
        .collect();
    format!("<html><body>{links}</body></html>")
}

/// Scripted in-memory fetcher with call accounting.
#[derive(Default)]
pub struct ScriptedFetcher {
    game_pages: Mutex<HashMap<u32, String>>,
    season_pages: Mutex<HashMap<String, String>>,
    index_page: Mutex<String>,
    transport_failures: Mutex<HashSet<u32>>,
    failing_seasons: Mutex<HashSet<String>>,
    game_fetches: Mutex<Vec<u32>>,
    season_fetches: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fetch_delay: Duration,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a per-fetch delay so concurrent fetches actually overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Register a season with valid pages for each listed game.
    pub fn add_season(&self, season_id: &str, game_ids: &[u32]) {
        self.season_pages
            .lock()
            .unwrap()
            .insert(season_id.to_string(), season_page(game_ids));
        let mut pages = self.game_pages.lock().unwrap();
        for &id in game_ids {
            pages.insert(id, game_page(id));
        }
    }

    /// Replace a game's page with content the extractor rejects.
    pub fn break_game(&self, game_id: u32) {
        self.game_pages
            .lock()
            .unwrap()
            .insert(game_id, "<html><body>not a game</body></html>".to_string());
    }

    /// Make a game's fetch fail at the transport level.
    pub fn fail_transport(&self, game_id: u32) {
        self.transport_failures.lock().unwrap().insert(game_id);
    }

    /// Make a season's listing fetch fail.
    pub fn fail_season(&self, season_id: &str) {
        self.failing_seasons
            .lock()
            .unwrap()
            .insert(season_id.to_string());
    }

    /// Total game fetches issued.
    pub fn game_fetch_count(&self) -> usize {
        self.game_fetches.lock().unwrap().len()
    }

    /// Game fetches issued for one id.
    pub fn fetches_for(&self, game_id: u32) -> usize {
        self.game_fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|&&id| id == game_id)
            .count()
    }

    /// Season listing fetches issued.
    pub fn season_fetches(&self) -> Vec<String> {
        self.season_fetches.lock().unwrap().clone()
    }

    /// Peak simultaneous in-flight game fetches.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for ScriptedFetcher {
    async fn fetch_game(&self, game_id: u32) -> FetcherResult<Bytes> {
        self.game_fetches.lock().unwrap().push(game_id);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.transport_failures.lock().unwrap().contains(&game_id) {
            return Err(FetcherError::NetworkError(format!(
                "injected failure for game {game_id}"
            )));
        }

        match self.game_pages.lock().unwrap().get(&game_id) {
            Some(page) => Ok(Bytes::from(page.clone())),
            None => Err(FetcherError::StatusError {
                status: 404,
                url: format!("showgame.php?game_id={game_id}"),
            }),
        }
    }

    async fn fetch_season(&self, season_id: &str) -> FetcherResult<Bytes> {
        self.season_fetches
            .lock()
            .unwrap()
            .push(season_id.to_string());

        if self.failing_seasons.lock().unwrap().contains(season_id) {
            return Err(FetcherError::NetworkError(format!(
                "injected failure for season {season_id}"
            )));
        }

        match self.season_pages.lock().unwrap().get(season_id) {
            Some(page) => Ok(Bytes::from(page.clone())),
            None => Err(FetcherError::StatusError {
                status: 404,
                url: format!("showseason.php?season={season_id}"),
            }),
        }
    }

    async fn fetch_season_index(&self) -> FetcherResult<Bytes> {
        Ok(Bytes::from(self.index_page.lock().unwrap().clone()))
    }
}

/// Batches captured by [`MemoryStore`], shared with the test body.
pub type CapturedBatches = Arc<Mutex<Vec<(String, Vec<GameRecord>)>>>;

/// In-memory record store, optionally rigged to fail.
pub struct MemoryStore {
    batches: CapturedBatches,
    fail: bool,
}

impl MemoryStore {
    /// Returns the store and a handle to inspect captured batches.
    pub fn new() -> (Self, CapturedBatches) {
        let batches: CapturedBatches = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                batches: batches.clone(),
                fail: false,
            },
            batches,
        )
    }

    /// A store whose every batch write fails.
    pub fn failing() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }
}

impl RecordStore for MemoryStore {
    fn write_batch(&mut self, season_id: &str, records: &[GameRecord]) -> StoreResult<()> {
        if self.fail {
            return Err(StoreError::IoError("injected store failure".to_string()));
        }
        self.batches
            .lock()
            .unwrap()
            .push((season_id.to_string(), records.to_vec()));
        Ok(())
    }
}

/// Harvester config pointed at a temp dir, tuned for tests: no
/// inter-season delay, otherwise defaults.
pub fn test_config(dir: &Path, concurrency: usize) -> HarvesterConfig {
    HarvesterConfig {
        concurrency,
        cache_dir: dir.join("cache"),
        checkpoint_path: dir.join("checkpoint.json"),
        season_delay: Duration::ZERO,
        ..HarvesterConfig::default()
    }
}
