// # File TLD Store
//
// File-based implementation of TldStore with crash recovery.
//
// ## Purpose
//
// Keeps the last fetched TLD list across restarts so a restarted service
// can answer from disk while the list is still fresh.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good list
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "last_updated": "2026-10-16T12:00:00Z",
//   "tld_count": 3,
//   "tlds": ["CO.UK", "COM", "NET"]
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::Error;
use crate::list::canonical_set;
use crate::traits::tld_store::{CacheMetadata, TldStore};

/// Store file format version
/// Used for future migration if format changes
const STORE_FILE_VERSION: &str = "1.0";

/// File-based TLD store with crash recovery
///
/// The list is held in memory after load and rewritten in full on every
/// `store()`.
///
/// # Example
///
/// ```rust,no_run
/// use tld_core::store::FileTldStore;
/// use tld_core::traits::TldStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileTldStore::new("/var/lib/tld/cache.json").await?;
///
///     // Replaced atomically on disk
///     store.store(&["com".to_string()], chrono::Utc::now()).await?;
///
///     let meta = store.load_metadata().await?;
///     assert_eq!(meta.map(|m| m.tld_count), Some(1));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileTldStore {
    path: PathBuf,
    state: Arc<RwLock<Option<StoreFileFormat>>>,
    // Serializes writers so temp/backup/rename sequences never interleave
    write_lock: Mutex<()>,
}

/// Serializable store file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    last_updated: Option<DateTime<Utc>>,
    tld_count: usize,
    tlds: Vec<String>,
}

impl StoreFileFormat {
    fn new(tlds: HashSet<String>, updated_at: DateTime<Utc>) -> Self {
        let mut tlds: Vec<String> = tlds.into_iter().collect();
        tlds.sort();
        Self {
            version: STORE_FILE_VERSION.to_string(),
            last_updated: Some(updated_at),
            tld_count: tlds.len(),
            tlds,
        }
    }

    fn metadata(&self) -> CacheMetadata {
        CacheMetadata {
            last_updated: self.last_updated,
            tld_count: self.tld_count,
        }
    }
}

impl FileTldStore {
    /// Create or load a file store
    ///
    /// This will:
    /// 1. Try to load existing store file
    /// 2. If corruption detected, try to load from backup
    /// 3. If both fail, start empty
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let state = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            write_lock: Mutex::new(()),
        })
    }

    /// Load the store file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main store file
    /// 2. If JSON parse error, try loading backup
    /// 3. If backup also fails, start empty
    async fn load_with_recovery(path: &Path) -> Result<Option<StoreFileFormat>, Error> {
        match Self::load(path).await {
            Ok(state) => {
                tracing::debug!(
                    "Loaded TLD store: {} entries",
                    state.as_ref().map_or(0, |s| s.tld_count)
                );
                Ok(state)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "TLD store file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty store.");
                    return Ok(None);
                }

                match Self::load(&backup_path).await {
                    Ok(state) => {
                        tracing::info!(
                            "Recovered TLD store from backup: {} entries",
                            state.as_ref().map_or(0, |s| s.tld_count)
                        );

                        if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await
                        {
                            tracing::error!(
                                "Failed to restore store file from backup: {}",
                                restore_err
                            );
                        }

                        Ok(state)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with empty store.",
                            backup_err
                        );
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load the store file; `Ok(None)` when it does not exist
    async fn load(path: &Path) -> Result<Option<StoreFileFormat>, Error> {
        if !path.exists() {
            tracing::debug!("TLD store file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!(
                "Failed to read store file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut state: StoreFileFormat = serde_json::from_str(&content)?;

        if state.version != STORE_FILE_VERSION {
            tracing::warn!(
                "TLD store version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STORE_FILE_VERSION,
                state.version
            );
        }

        // Hand-edited files may carry lowercase or duplicate entries
        let tlds = canonical_set(&state.tlds);
        if tlds.len() != state.tlds.len() || state.tld_count != tlds.len() {
            tracing::warn!(
                "TLD store {} not canonical ({} listed, {} distinct); normalizing",
                path.display(),
                state.tld_count,
                tlds.len()
            );
            state = StoreFileFormat {
                last_updated: state.last_updated,
                ..StoreFileFormat::new(tlds, Utc::now())
            };
        } else {
            state.tlds = state.tlds.iter().map(|t| t.trim().to_ascii_uppercase()).collect();
        }

        Ok(Some(state))
    }

    /// Write the given contents to the store file atomically
    async fn write_file(&self, contents: &StoreFileFormat) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(contents)
            .map_err(|e| Error::store(format!("Failed to serialize TLD store: {}", e)))?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Create backup of current file (if it exists)
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("TLD store written to file: {}", self.path.display());
        Ok(())
    }

    /// Restore store file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored TLD store file from backup");
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TldStore for FileTldStore {
    async fn store(&self, entries: &[String], updated_at: DateTime<Utc>) -> Result<(), Error> {
        let contents = StoreFileFormat::new(canonical_set(entries), updated_at);

        let _writer = self.write_lock.lock().await;
        // Disk first: a failed write leaves both file and memory untouched
        self.write_file(&contents).await?;
        *self.state.write().await = Some(contents);
        Ok(())
    }

    async fn load_set(&self) -> Result<HashSet<String>, Error> {
        let guard = self.state.read().await;
        Ok(guard
            .as_ref()
            .map(|s| s.tlds.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn load_metadata(&self) -> Result<Option<CacheMetadata>, Error> {
        let guard = self.state.read().await;
        Ok(guard.as_ref().map(StoreFileFormat::metadata))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Every store() is written through before it returns
        Ok(())
    }
}
