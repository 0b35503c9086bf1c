//! Cache behavior: check-before-fetch, and no duplicate network calls
//! across runs.

use std::sync::Arc;
use tempfile::TempDir;

use jarchive_harvester::cache::PageCache;
use jarchive_harvester::extractor::HtmlGameExtractor;
use jarchive_harvester::frontier::Frontier;
use jarchive_harvester::harvester::Harvester;

use super::support::{game_page, test_config, MemoryStore, ScriptedFetcher};

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101, 102]);

    let config = test_config(dir.path(), 2);
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);

    let (store, _batches) = MemoryStore::new();
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config.clone(),
    );
    harvester.run(&frontier).await.unwrap();
    assert_eq!(fetcher.game_fetch_count(), 2);

    // Fresh checkpoint, same cache: everything is a cache hit
    let mut config2 = config;
    config2.checkpoint_path = dir.path().join("checkpoint2.json");
    let (store2, batches2) = MemoryStore::new();
    let mut harvester2 = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store2),
        config2,
    );
    harvester2.run(&frontier).await.unwrap();

    assert_eq!(
        fetcher.game_fetch_count(),
        2,
        "cached documents must not be re-fetched"
    );
    assert_eq!(batches2.lock().unwrap()[0].1.len(), 2);
}

#[tokio::test]
async fn test_only_uncached_games_are_fetched() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101, 102]);

    let config = test_config(dir.path(), 2);

    // Pre-seed the cache with one of the two games
    let cache = PageCache::new(&config.cache_dir);
    cache.put("40", 101, game_page(101).as_bytes()).unwrap();

    let (store, batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config,
    );
    harvester.run(&frontier).await.unwrap();

    assert_eq!(fetcher.fetches_for(101), 0);
    assert_eq!(fetcher.fetches_for(102), 1);
    assert_eq!(batches.lock().unwrap()[0].1.len(), 2);
}

#[tokio::test]
async fn test_fetched_documents_land_in_cache() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.add_season("40", &[101]);

    let config = test_config(dir.path(), 1);
    let (store, _batches) = MemoryStore::new();
    let frontier = Frontier::from_list(fetcher.clone(), vec!["40".into()]);
    let mut harvester = Harvester::new(
        fetcher.clone(),
        Arc::new(HtmlGameExtractor::new()),
        Box::new(store),
        config.clone(),
    );
    harvester.run(&frontier).await.unwrap();

    let cache = PageCache::new(&config.cache_dir);
    let cached = cache.get("40", 101).unwrap().expect("document cached");
    assert_eq!(&cached[..], game_page(101).as_bytes());
}
