//! Freshness-gated TLD cache
//!
//! The current list is an immutable [`TldSnapshot`] behind an [`ArcSwap`].
//! Installing a snapshot swaps the pointer; readers holding the previous
//! snapshot keep using it until they drop it, so no reader ever sees a
//! half-built set. A list read back from the store never replaces a newer
//! one.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::list::canonical_set;
use crate::traits::CacheMetadata;

/// Immutable view of the TLD set and when it was fetched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TldSnapshot {
    tlds: HashSet<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl TldSnapshot {
    /// Build a snapshot from raw entries, canonicalizing them
    pub fn new<I, S>(entries: I, last_updated: Option<DateTime<Utc>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tlds: canonical_set(entries),
            last_updated,
        }
    }

    /// A snapshot with no entries and no fetch time
    pub fn empty() -> Self {
        Self::default()
    }

    /// Membership test; `tld` must already be uppercase
    pub fn contains(&self, tld: &str) -> bool {
        self.tlds.contains(tld)
    }

    pub fn len(&self) -> usize {
        self.tlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tlds.is_empty()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn tlds(&self) -> &HashSet<String> {
        &self.tlds
    }

    /// All entries in lexical order
    pub fn sorted(&self) -> Vec<String> {
        let mut tlds: Vec<String> = self.tlds.iter().cloned().collect();
        tlds.sort();
        tlds
    }

    pub fn metadata(&self) -> CacheMetadata {
        CacheMetadata {
            last_updated: self.last_updated,
            tld_count: self.tlds.len(),
        }
    }

    /// `now - last_updated < refresh_interval`; never fresh without a fetch time
    pub fn is_fresh(&self, now: DateTime<Utc>, refresh_interval: chrono::Duration) -> bool {
        self.metadata().is_fresh(now, refresh_interval)
    }

    /// Whether this snapshot may replace `current`
    ///
    /// A snapshot without a fetch time only replaces another one without.
    fn supersedes(&self, current: &TldSnapshot) -> bool {
        match (current.last_updated, self.last_updated) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(previous), Some(next)) => next >= previous,
        }
    }
}

/// Summary of the cache for outer layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheInfo {
    pub tld_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_fresh: bool,
}

/// Holder of the current snapshot
#[derive(Debug)]
pub struct TldCache {
    current: ArcSwap<TldSnapshot>,
    refresh_interval: chrono::Duration,
}

impl TldCache {
    /// Create an empty cache whose snapshots go stale after `refresh_interval`
    pub fn new(refresh_interval: chrono::Duration) -> Self {
        Self {
            current: ArcSwap::from_pointee(TldSnapshot::empty()),
            refresh_interval,
        }
    }

    /// Current snapshot; cheap, lock-free, never blocks on a refresh
    pub fn snapshot(&self) -> Arc<TldSnapshot> {
        self.current.load_full()
    }

    /// Install a freshly fetched snapshot unconditionally
    ///
    /// The caller stamps `last_updated` no earlier than the current one.
    pub fn publish(&self, snapshot: TldSnapshot) -> Arc<TldSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }

    /// Install a snapshot unless the current one is newer
    ///
    /// Returns `None` and keeps the current snapshot when `snapshot` was
    /// fetched before it. Used for lists read back from a store, which may
    /// have been overtaken by a refresh while they were being read.
    pub fn adopt(&self, snapshot: TldSnapshot) -> Option<Arc<TldSnapshot>> {
        let candidate = Arc::new(snapshot);
        let mut current = self.current.load();

        loop {
            if !candidate.supersedes(&current) {
                return None;
            }

            let previous = self.current.compare_and_swap(&current, Arc::clone(&candidate));
            if Arc::ptr_eq(&previous, &current) {
                return Some(candidate);
            }
            current = previous;
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.current.load().is_fresh(now, self.refresh_interval)
    }

    pub fn refresh_interval(&self) -> chrono::Duration {
        self.refresh_interval
    }

    /// Cache summary as of `now`
    pub fn info_at(&self, now: DateTime<Utc>) -> CacheInfo {
        let snapshot = self.current.load();
        CacheInfo {
            tld_count: snapshot.len(),
            last_updated: snapshot.last_updated,
            is_fresh: snapshot.is_fresh(now, self.refresh_interval),
        }
    }
}
