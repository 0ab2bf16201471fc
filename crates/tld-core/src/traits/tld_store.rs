// # TLD Store Trait
//
// Defines the interface for persistent storage of the TLD list.
//
// ## Purpose
//
// The store lets a restarted service answer immediately from the last
// successful fetch instead of waiting on the network. It tracks:
// - The full set of TLD entries
// - When that set was fetched
// - How many entries it holds
//
// ## Implementations
//
// - Memory: `MemoryTldStore` (tests, embedding)
// - File: `FileTldStore` (JSON, write-then-rename)
//
// ## Usage
//
// ```rust,ignore
// use tld_core::TldStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* TldStore implementation */;
//
//     store.store(&["com".to_string(), "net".to_string()], chrono::Utc::now()).await?;
//
//     let tlds = store.load_set().await?;
//     assert!(tlds.contains("COM"));
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Refresh metadata persisted alongside the TLD set
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheMetadata {
    /// When the stored set was fetched (absent if never)
    pub last_updated: Option<DateTime<Utc>>,
    /// Number of distinct entries in the stored set
    pub tld_count: usize,
}

impl CacheMetadata {
    /// Metadata for a set of `tld_count` entries fetched at `last_updated`
    pub fn new(last_updated: DateTime<Utc>, tld_count: usize) -> Self {
        Self {
            last_updated: Some(last_updated),
            tld_count,
        }
    }

    /// Check if the metadata is fresh at `now`
    ///
    /// Absent `last_updated` is always stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, refresh_interval: chrono::Duration) -> bool {
        match self.last_updated {
            Some(last_updated) => now.signed_duration_since(last_updated) < refresh_interval,
            None => false,
        }
    }
}

/// Trait for TLD store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Atomicity
///
/// [`TldStore::store`] replaces the set and the metadata as one unit: a
/// concurrent or later `load_*` call sees either the old pair or the new pair.
///
/// # Responsibilities
///
/// The store persists what it is given. It does not fetch, decide when a
/// refresh is due, or filter entries beyond canonicalizing them (trimmed,
/// uppercase, no blanks, no duplicates). Freshness decisions belong to
/// `TldEngine`.
#[async_trait]
pub trait TldStore: Send + Sync {
    /// Replace the stored set and metadata
    ///
    /// # Parameters
    ///
    /// - `entries`: Fetched entries in source order; duplicates and case are collapsed
    /// - `updated_at`: Fetch time to record as `last_updated`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Set and metadata replaced
    /// - `Err(Error)`: Storage error; previously stored data is unchanged
    async fn store(&self, entries: &[String], updated_at: DateTime<Utc>)
    -> Result<(), crate::Error>;

    /// Load the stored set
    ///
    /// Returns an empty set if nothing was ever stored.
    async fn load_set(&self) -> Result<HashSet<String>, crate::Error>;

    /// Load the stored metadata
    ///
    /// # Returns
    ///
    /// - `Ok(Some(CacheMetadata))`: Metadata of the last store
    /// - `Ok(None)`: Nothing stored yet
    /// - `Err(Error)`: Storage error
    async fn load_metadata(&self) -> Result<Option<CacheMetadata>, crate::Error>;

    /// Persist any pending changes
    ///
    /// Some implementations may buffer writes. This ensures
    /// all changes are flushed to persistent storage.
    async fn flush(&self) -> Result<(), crate::Error>;
}
