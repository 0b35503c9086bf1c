//! Resume semantics: completed work is never re-fetched, failed work is
//! only retried on explicit request.

use std::sync::Arc;
use tempfile::TempDir;

use jarchive_harvester::checkpoint::{CheckpointStore, HarvestState};
use jarchive_harvester::extractor::HtmlGameExtractor;
use jarchive_harvester::frontier::Frontier;
use jarchive_harvester::harvester::Harvester;

use super::support::{test_config, MemoryStore, ScriptedFetcher};

#[tokio::test]
async fn test_idempotent_resume_skips_completed_work() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("39", &[201, 202]);
    fetcher.add_season("40", &[101, 102, 103, 104]);

    // Season 39 fully completed; season 40 partially completed
    let config = test_config(dir.path(), 2);
    let mut state = HarvestState::new();
    state.record_completed("39", 201);
    state.record_completed("39", 202);
    state.mark_season_complete("39");
    for id in [101, 102, 103] {
        state.record_completed("40", id);
    }
    CheckpointStore::new(&config.checkpoint_path)
        .save(&state)
        .unwrap();

    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["39".into(), "40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config.clone(),
    );

    let summary = harvester.run(&frontier).await.unwrap();

    // The fully completed season was never even listed
    assert_eq!(fetcher.season_fetches(), vec!["40".to_string()]);
    assert_eq!(summary.seasons_skipped, 1);

    // Only the one pending game was fetched
    assert_eq!(fetcher.game_fetch_count(), 1);
    assert_eq!(fetcher.fetches_for(104), 1);

    // The store saw exactly that game
    let batches = batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let (season, records) = &batches[0];
    assert_eq!(season, "40");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].game_id, 104);
    assert_eq!(records[0].show_num, Some(9104));

    // The checkpoint advanced
    let loaded = CheckpointStore::new(&config.checkpoint_path).load().unwrap();
    assert!(loaded.is_fully_completed("40"));
    let progress = loaded.season("40").unwrap();
    assert_eq!(
        progress.completed_game_ids.iter().copied().collect::<Vec<_>>(),
        vec![101, 102, 103, 104]
    );
}

#[tokio::test]
async fn test_failed_games_stay_excluded_by_default() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101, 102, 103]);

    let config = test_config(dir.path(), 2);
    let mut state = HarvestState::new();
    state.record_completed("40", 101);
    state.record_failed("40", 102);
    CheckpointStore::new(&config.checkpoint_path)
        .save(&state)
        .unwrap();

    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config.clone(),
    );

    harvester.run(&frontier).await.unwrap();

    // The recorded failure was not re-attempted
    assert_eq!(fetcher.fetches_for(102), 0);
    assert_eq!(fetcher.fetches_for(103), 1);

    let batches = batches.lock().unwrap();
    assert_eq!(batches[0].1.len(), 1);
    assert_eq!(batches[0].1[0].game_id, 103);

    let loaded = CheckpointStore::new(&config.checkpoint_path).load().unwrap();
    let progress = loaded.season("40").unwrap();
    assert!(progress.failed_game_ids.contains(&102));
}

#[tokio::test]
async fn test_retry_failed_resurfaces_recorded_failures() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101, 102, 103]);

    let mut config = test_config(dir.path(), 2);
    config.retry_failed = true;
    let mut state = HarvestState::new();
    state.record_completed("40", 101);
    state.record_failed("40", 102);
    CheckpointStore::new(&config.checkpoint_path)
        .save(&state)
        .unwrap();

    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config.clone(),
    );

    harvester.run(&frontier).await.unwrap();

    assert_eq!(fetcher.fetches_for(102), 1);

    let mut stored: Vec<u32> = batches.lock().unwrap()[0]
        .1
        .iter()
        .map(|r| r.game_id)
        .collect();
    stored.sort_unstable();
    assert_eq!(stored, vec![102, 103]);

    // The retried game moved from failed to completed
    let loaded = CheckpointStore::new(&config.checkpoint_path).load().unwrap();
    let progress = loaded.season("40").unwrap();
    assert!(progress.completed_game_ids.contains(&102));
    assert!(progress.failed_game_ids.is_empty());
}

#[tokio::test]
async fn test_checkpoint_survives_restart() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101, 102]);

    let config = test_config(dir.path(), 2);
    let (store, _batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config.clone(),
    );
    harvester.run(&frontier).await.unwrap();

    // A new process loads exactly what the first one saved
    let reloaded = CheckpointStore::new(&config.checkpoint_path).load().unwrap();
    assert!(reloaded.is_fully_completed("40"));

    // A second run over the same frontier does no new work
    let (store2, batches2) = MemoryStore::new();
    let mut harvester2 = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store2),
        config,
    );
    let summary = harvester2.run(&frontier).await.unwrap();
    assert_eq!(summary.seasons_skipped, 1);
    assert_eq!(fetcher.game_fetch_count(), 2);
    assert!(batches2.lock().unwrap().is_empty());
}
