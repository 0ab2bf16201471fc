//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without touching the network or the filesystem.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tld_core::error::{Error, Result};
use tld_core::traits::{CacheMetadata, TldSource, TldStore};
use tld_core::{EngineConfig, EngineEvent, MemoryTldStore, TldEngine};
use tokio::sync::{Notify, Semaphore, mpsc};

/// A TldSource whose payload, failures and timing are controlled by the test
pub struct ScriptedSource {
    /// Entries returned by the next fetch
    entries: std::sync::Mutex<Vec<String>>,
    /// When set, fetch() fails with a network-style error
    fail: AtomicBool,
    /// Call counter for fetch()
    fetch_count: AtomicUsize,
    /// When present, fetch() waits for a permit before returning
    gate: Option<Semaphore>,
    /// Signalled each time fetch() is entered
    entered: Notify,
}

impl ScriptedSource {
    /// A source that immediately returns `entries`
    pub fn new(entries: &[&str]) -> Arc<Self> {
        Arc::new(Self::build(entries, None))
    }

    /// A source whose fetches block until [`ScriptedSource::release`]
    pub fn gated(entries: &[&str]) -> Arc<Self> {
        Arc::new(Self::build(entries, Some(Semaphore::new(0))))
    }

    /// A source whose fetches always fail
    pub fn failing() -> Arc<Self> {
        let source = Self::build(&[], None);
        source.fail.store(true, Ordering::SeqCst);
        Arc::new(source)
    }

    fn build(entries: &[&str], gate: Option<Semaphore>) -> Self {
        Self {
            entries: std::sync::Mutex::new(upper(entries)),
            fail: AtomicBool::new(false),
            fetch_count: AtomicUsize::new(0),
            gate,
            entered: Notify::new(),
        }
    }

    /// Replace the payload of subsequent fetches
    pub fn set_entries(&self, entries: &[&str]) {
        *self.entries.lock().unwrap() = upper(entries);
    }

    /// Make subsequent fetches fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Get the number of times fetch() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Let `n` gated fetches complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Wait until a fetch has been entered
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait::async_trait]
impl TldSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .expect("gate semaphore is never closed")
                .forget();
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::fetch("connection refused"));
        }
        Ok(self.entries.lock().unwrap().clone())
    }

    fn describe(&self) -> String {
        "scripted://tlds".to_string()
    }
}

/// A TldStore whose writes always fail
pub struct FailingStore {
    pub store_call_count: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store_call_count: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl TldStore for FailingStore {
    async fn store(&self, _entries: &[String], _updated_at: DateTime<Utc>) -> Result<()> {
        self.store_call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::store("disk full"))
    }

    async fn load_set(&self) -> Result<HashSet<String>> {
        Ok(HashSet::new())
    }

    async fn load_metadata(&self) -> Result<Option<CacheMetadata>> {
        Ok(None)
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// A MemoryTldStore whose load_set() reads its contents, then waits on a gate
///
/// Models a slow disk read that a concurrent refresh overtakes: the list
/// returned is the one present when the read began.
pub struct SlowReadStore {
    pub inner: MemoryTldStore,
    gate: Semaphore,
    entered: Notify,
}

impl SlowReadStore {
    pub fn new(inner: MemoryTldStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gate: Semaphore::new(0),
            entered: Notify::new(),
        })
    }

    /// Let one blocked load_set() return
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Wait until load_set() has read its contents and is blocked
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait::async_trait]
impl TldStore for SlowReadStore {
    async fn store(&self, entries: &[String], updated_at: DateTime<Utc>) -> Result<()> {
        self.inner.store(entries, updated_at).await
    }

    async fn load_set(&self) -> Result<HashSet<String>> {
        let tlds = self.inner.load_set().await?;
        self.entered.notify_one();
        self.gate
            .acquire()
            .await
            .expect("gate semaphore is never closed")
            .forget();
        Ok(tlds)
    }

    async fn load_metadata(&self) -> Result<Option<CacheMetadata>> {
        self.inner.load_metadata().await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// Uppercase owned copies of `entries`
pub fn upper(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_ascii_uppercase()).collect()
}

/// Engine config for tests: hourly staleness, small event channel
pub fn test_config() -> EngineConfig {
    EngineConfig {
        refresh_interval_secs: 3600,
        event_channel_capacity: 100,
        ..EngineConfig::default()
    }
}

/// Build an engine over the given doubles
pub fn build_engine(
    source: Arc<ScriptedSource>,
    store: Arc<dyn TldStore>,
    config: EngineConfig,
) -> (TldEngine, mpsc::Receiver<EngineEvent>) {
    TldEngine::new(source, store, config).expect("engine construction succeeds")
}

/// Engine over a scripted source and an empty memory store
pub fn memory_engine(
    source: Arc<ScriptedSource>,
) -> (TldEngine, Arc<MemoryTldStore>, mpsc::Receiver<EngineEvent>) {
    let store = Arc::new(MemoryTldStore::new());
    let (engine, events) = build_engine(source, store.clone(), test_config());
    (engine, store, events)
}

/// Drain all events currently queued
pub fn drain(events: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
