//! The worker pool bound: in-flight fetches never exceed the configured
//! concurrency.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use jarchive_harvester::extractor::HtmlGameExtractor;
use jarchive_harvester::frontier::Frontier;
use jarchive_harvester::harvester::Harvester;

use super::support::{test_config, MemoryStore, ScriptedFetcher};

async fn run_with_concurrency(concurrency: usize, games: &[u32]) -> Arc<ScriptedFetcher> {
    let dir = TempDir::new().unwrap();
    let fetcher =
        Arc::new(ScriptedFetcher::new().with_delay(Duration::from_millis(25)));
    fetcher.add_season("40", games);

    let config = test_config(dir.path(), concurrency);
    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config,
    );

    harvester.run(&frontier).await.unwrap();
    assert_eq!(batches.lock().unwrap()[0].1.len(), games.len());
    fetcher
}

#[tokio::test]
async fn test_in_flight_fetches_bounded_by_pool_size() {
    let games: Vec<u32> = (101..113).collect();
    let fetcher = run_with_concurrency(3, &games).await;

    assert_eq!(fetcher.game_fetch_count(), 12);
    assert!(
        fetcher.max_in_flight() <= 3,
        "observed {} simultaneous fetches with pool of 3",
        fetcher.max_in_flight()
    );
    // With a per-fetch delay the pool actually fills up
    assert!(fetcher.max_in_flight() >= 2);
}

#[tokio::test]
async fn test_pool_of_one_serializes_fetches() {
    let games: Vec<u32> = (101..107).collect();
    let fetcher = run_with_concurrency(1, &games).await;
    assert_eq!(fetcher.max_in_flight(), 1);
}
