//! Architectural Contract Test: Single-Flight Refresh
//!
//! This test verifies that overlapping refreshes share one fetch.
//!
//! Constraints verified:
//! - N concurrent refresh() calls cause exactly 1 fetch and 1 store write
//! - Every joined caller receives the same outcome, success or failure
//! - A refresh started after the previous one finished fetches again
//! - Readers keep seeing the previous list while a fetch is in flight
//!
//! If this test fails, a burst of requests on a stale cache turns into a
//! burst of downloads from the registry.

mod common;

use common::*;
use tld_core::{EngineEvent, TldEngine};
use tokio::sync::mpsc;

/// Wait until `n` callers have joined the in-flight refresh
async fn wait_for_coalesced(events: &mut mpsc::Receiver<EngineEvent>, n: usize) {
    let mut seen = 0;
    while seen < n {
        match events.recv().await {
            Some(EngineEvent::RefreshCoalesced) => seen += 1,
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }
}

fn spawn_refresh(
    engine: &TldEngine,
) -> tokio::task::JoinHandle<tld_core::Result<tld_core::RefreshReport>> {
    let engine = engine.clone();
    tokio::spawn(async move { engine.refresh().await })
}

#[tokio::test]
async fn concurrent_refreshes_share_one_fetch() {
    let source = ScriptedSource::gated(&["com", "net"]);
    let (engine, store, mut events) = memory_engine(source.clone());

    let first = spawn_refresh(&engine);
    source.wait_entered().await;
    let second = spawn_refresh(&engine);
    wait_for_coalesced(&mut events, 1).await;

    source.release(1);
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(first, second, "joined callers see the same report");
    assert_eq!(first.tld_count, 2);
    assert_eq!(source.fetch_count(), 1, "overlapping refreshes must share one fetch");
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn burst_of_refreshes_shares_one_fetch() {
    let source = ScriptedSource::gated(&["com"]);
    let (engine, store, mut events) = memory_engine(source.clone());

    let handles: Vec<_> = (0..10).map(|_| spawn_refresh(&engine)).collect();
    source.wait_entered().await;
    wait_for_coalesced(&mut events, 9).await;

    source.release(1);
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.tld_count, 1);
    }

    assert_eq!(source.fetch_count(), 1);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn coalesced_failure_reaches_every_caller() {
    let source = ScriptedSource::gated(&["com"]);
    source.set_failing(true);
    let (engine, store, mut events) = memory_engine(source.clone());

    let first = spawn_refresh(&engine);
    source.wait_entered().await;
    let second = spawn_refresh(&engine);
    wait_for_coalesced(&mut events, 1).await;

    source.release(1);
    let first = first.await.unwrap().unwrap_err();
    let second = second.await.unwrap().unwrap_err();

    assert_eq!(first.to_string(), second.to_string());
    assert!(first.is_network_failure());
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(store.write_count(), 0);
    assert!(engine.snapshot().is_empty(), "failed refresh adopts nothing");
}

#[tokio::test]
async fn sequential_refreshes_fetch_each_time() {
    let source = ScriptedSource::new(&["com"]);
    let (engine, store, _events) = memory_engine(source.clone());

    engine.refresh().await.unwrap();
    source.set_entries(&["com", "org"]);
    let report = engine.refresh().await.unwrap();

    assert_eq!(source.fetch_count(), 2);
    assert_eq!(store.write_count(), 2);
    assert_eq!(report.tld_count, 2);
}

#[tokio::test]
async fn refresh_after_failure_fetches_again() {
    let source = ScriptedSource::failing();
    let (engine, _store, _events) = memory_engine(source.clone());

    assert!(engine.refresh().await.is_err());
    source.set_failing(false);
    source.set_entries(&["com"]);
    assert!(engine.refresh().await.is_ok());

    assert_eq!(source.fetch_count(), 2);
    assert!(engine.validate("com").is_valid);
}

#[tokio::test]
async fn readers_see_previous_list_during_fetch() {
    let source = ScriptedSource::gated(&["com"]);
    let (engine, _store, _events) = memory_engine(source.clone());

    source.release(1);
    engine.refresh().await.unwrap();

    source.set_entries(&["com", "org"]);
    let pending = spawn_refresh(&engine);
    tokio::task::yield_now().await;

    // Gate is closed, so the new list cannot have been adopted yet
    assert!(engine.validate("com").is_valid);
    assert!(!engine.validate("org").is_valid);
    assert_eq!(engine.all_tlds(), vec!["COM"]);

    source.release(1);
    pending.await.unwrap().unwrap();

    assert!(engine.validate("org").is_valid);
    assert_eq!(engine.all_tlds(), vec!["COM", "ORG"]);
}

#[tokio::test]
async fn snapshot_held_across_refresh_is_unchanged() {
    let source = ScriptedSource::new(&["com"]);
    let (engine, _store, _events) = memory_engine(source.clone());
    engine.refresh().await.unwrap();

    let before = engine.snapshot();
    source.set_entries(&["net"]);
    engine.refresh().await.unwrap();

    assert!(before.contains("COM"));
    assert!(!before.contains("NET"));
    assert!(engine.snapshot().contains("NET"));
    assert!(!engine.snapshot().contains("COM"));
}
