// # Memory TLD Store
//
// In-memory implementation of TldStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for embedders that accept one fetch per start.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - First start after a crash always fetches from the source

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::list::canonical_set;
use crate::traits::tld_store::{CacheMetadata, TldStore};

/// In-memory TLD store implementation
///
/// Set and metadata live together behind one RwLock, so a `store()` is
/// observed as a single replacement.
///
/// # Example
///
/// ```rust,no_run
/// use tld_core::store::MemoryTldStore;
/// use tld_core::traits::TldStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryTldStore::new();
///
///     store.store(&["com".to_string()], chrono::Utc::now()).await?;
///
///     let tlds = store.load_set().await?;
///     assert!(tlds.contains("COM"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTldStore {
    inner: Arc<RwLock<Option<StoredList>>>,
    writes: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct StoredList {
    tlds: HashSet<String>,
    metadata: CacheMetadata,
}

impl MemoryTldStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `entries` fetched at `last_updated`
    ///
    /// Seeded data does not count as a write.
    pub fn with_entries<I, S>(entries: I, last_updated: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tlds = canonical_set(entries);
        let metadata = CacheMetadata::new(last_updated, tlds.len());
        Self {
            inner: Arc::new(RwLock::new(Some(StoredList { tlds, metadata }))),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `store()` calls that completed
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Check if nothing has been stored
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }

    /// Drop the stored list and metadata
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl TldStore for MemoryTldStore {
    async fn store(&self, entries: &[String], updated_at: DateTime<Utc>) -> Result<(), Error> {
        let tlds = canonical_set(entries);
        let metadata = CacheMetadata::new(updated_at, tlds.len());

        *self.inner.write().await = Some(StoredList { tlds, metadata });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_set(&self) -> Result<HashSet<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.as_ref().map(|list| list.tlds.clone()).unwrap_or_default())
    }

    async fn load_metadata(&self) -> Result<Option<CacheMetadata>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.as_ref().map(|list| list.metadata))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing is buffered
        Ok(())
    }
}
