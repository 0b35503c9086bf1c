//! Fatality boundaries: store failures abort, frontier failures follow
//! the configured policy, shutdown interrupts cleanly.

use std::sync::Arc;
use tempfile::TempDir;

use jarchive_harvester::checkpoint::CheckpointStore;
use jarchive_harvester::extractor::HtmlGameExtractor;
use jarchive_harvester::frontier::Frontier;
use jarchive_harvester::harvester::{FrontierErrorPolicy, Harvester, HarvestError};
use jarchive_harvester::shutdown::ShutdownCoordinator;

use super::support::{test_config, MemoryStore, ScriptedFetcher};

#[tokio::test]
async fn test_store_failure_aborts_without_advancing_checkpoint() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101, 102]);

    let config = test_config(dir.path(), 2);
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(MemoryStore::failing()),
        config.clone(),
    );

    let err = harvester.run(&frontier).await.unwrap_err();
    assert!(matches!(err, HarvestError::Persistence(_)));

    // The season must not be marked fully completed
    let state = CheckpointStore::new(&config.checkpoint_path).load().unwrap();
    assert!(!state.is_fully_completed("40"));
}

#[tokio::test]
async fn test_frontier_failure_aborts_by_default() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("39", &[201]);
    fetcher.fail_season("40");

    let config = test_config(dir.path(), 2);
    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into(), "39".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config,
    );

    let err = harvester.run(&frontier).await.unwrap_err();
    assert!(matches!(err, HarvestError::Frontier(_)));
    assert!(batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_frontier_failure_skip_policy_continues() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("39", &[201]);
    fetcher.fail_season("40");

    let mut config = test_config(dir.path(), 2);
    config.frontier_error_policy = FrontierErrorPolicy::SkipSeason;

    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into(), "39".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config,
    );

    let summary = harvester.run(&frontier).await.unwrap();
    assert_eq!(summary.seasons_skipped, 1);
    assert_eq!(summary.seasons_processed, 1);

    let batches = batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].0, "39");
}

#[tokio::test]
async fn test_shutdown_before_run_interrupts_and_saves_checkpoint() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101]);

    let config = test_config(dir.path(), 1);
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config.clone(),
    )
    .with_shutdown(shutdown);

    let err = harvester.run(&frontier).await.unwrap_err();
    assert!(matches!(err, HarvestError::Interrupted));
    assert!(batches.lock().unwrap().is_empty());
    assert!(config.checkpoint_path.exists());
}
