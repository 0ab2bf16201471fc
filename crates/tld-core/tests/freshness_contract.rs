//! Architectural Contract Test: Freshness Gating
//!
//! This test verifies when the engine serves the stored list and when it
//! goes to the network.
//!
//! Constraints verified:
//! - A fresh stored list is adopted without fetching
//! - A stale or absent stored list triggers exactly one fetch
//! - A stale list is still served when that fetch fails
//! - Freshness expires after the configured interval
//!
//! If this test fails, startup either hammers the registry or serves a
//! list that never refreshes.

mod common;

use chrono::{Duration, Utc};
use common::*;
use std::sync::Arc;
use tld_core::{EngineEvent, MemoryTldStore, Readiness, TldStore};

#[tokio::test]
async fn fresh_store_is_adopted_without_fetch() {
    let source = ScriptedSource::new(&["org"]);
    let store = Arc::new(MemoryTldStore::with_entries(
        ["com", "net"],
        Utc::now() - Duration::minutes(10),
    ));
    let (engine, mut events) = build_engine(source.clone(), store.clone(), test_config());

    let readiness = engine.initialize().await.unwrap();

    assert_eq!(readiness, Readiness::FromStore { tld_count: 2 });
    assert_eq!(source.fetch_count(), 0, "fresh store must not trigger a fetch");
    assert_eq!(store.write_count(), 0);
    assert!(engine.validate("com").is_valid);
    assert!(!engine.validate("org").is_valid);
    assert_eq!(
        drain(&mut events),
        vec![EngineEvent::Initialized {
            tld_count: 2,
            from_store: true
        }]
    );
}

#[tokio::test]
async fn stale_store_triggers_fetch() {
    let source = ScriptedSource::new(&["com", "net", "org"]);
    let store = Arc::new(MemoryTldStore::with_entries(
        ["com"],
        Utc::now() - Duration::hours(2),
    ));
    let (engine, _events) = build_engine(source.clone(), store.clone(), test_config());

    let readiness = engine.initialize().await.unwrap();

    assert!(matches!(readiness, Readiness::Fetched(report) if report.tld_count == 3));
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(store.write_count(), 1);
    assert!(engine.validate("org").is_valid);
    assert!(engine.is_fresh(Utc::now()));
}

#[tokio::test]
async fn empty_store_triggers_fetch() {
    let source = ScriptedSource::new(&["com"]);
    let (engine, store, _events) = memory_engine(source.clone());

    let readiness = engine.initialize().await.unwrap();

    assert_eq!(readiness.tld_count(), 1);
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(store.load_metadata().await.unwrap().unwrap().tld_count, 1);
}

#[tokio::test]
async fn stale_store_is_served_when_fetch_fails() {
    let source = ScriptedSource::failing();
    let stale_at = Utc::now() - Duration::days(3);
    let store = Arc::new(MemoryTldStore::with_entries(["com", "net"], stale_at));
    let (engine, _events) = build_engine(source.clone(), store.clone(), test_config());

    let result = engine.initialize().await;

    assert!(result.is_err(), "initialize reports the failed fetch");
    assert!(result.unwrap_err().is_network_failure());
    assert_eq!(source.fetch_count(), 1);

    // Last-known-good list still answers, and is still reported stale
    assert!(engine.validate("net").is_valid);
    let info = engine.cache_info();
    assert_eq!(info.tld_count, 2);
    assert_eq!(info.last_updated, Some(stale_at));
    assert!(!info.is_fresh);

    // Store untouched
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn failed_fetch_with_empty_store_leaves_cache_unavailable() {
    let source = ScriptedSource::failing();
    let (engine, _store, _events) = memory_engine(source);

    assert!(engine.initialize().await.is_err());

    let v = engine.validate("com");
    assert!(!v.is_valid);
    assert_eq!(v.message, "TLD list not available. Please try again later.");
    assert_eq!(engine.cache_info().last_updated, None);
}

#[tokio::test]
async fn freshness_expires_after_interval() {
    let source = ScriptedSource::new(&["com"]);
    let (engine, _store, _events) = memory_engine(source);

    let report = engine.refresh().await.unwrap();
    let interval = Duration::seconds(test_config().refresh_interval_secs as i64);

    assert!(engine.cache_info().is_fresh, "fresh right after a fetch");
    assert!(engine.is_fresh(report.updated_at));
    assert!(engine.is_fresh(report.updated_at + interval - Duration::seconds(1)));
    assert!(!engine.is_fresh(report.updated_at + interval));
    assert!(!engine.is_fresh(report.updated_at + Duration::days(1)));
}

#[tokio::test]
async fn last_updated_is_monotonic_across_refreshes() {
    let source = ScriptedSource::new(&["com"]);
    let (engine, store, _events) = memory_engine(source);

    let first = engine.refresh().await.unwrap();
    let second = engine.refresh().await.unwrap();

    assert!(second.updated_at >= first.updated_at);
    let meta = store.load_metadata().await.unwrap().unwrap();
    assert_eq!(meta.last_updated, Some(second.updated_at));
    assert_eq!(engine.cache_info().last_updated, Some(second.updated_at));
}
