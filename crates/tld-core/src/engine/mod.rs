//! Core TLD engine
//!
//! The TldEngine is responsible for:
//! - Loading the TLD list from the TldStore at startup
//! - Fetching from the TldSource when the list is stale or a refresh is due
//! - Writing fetched lists through to the TldStore before adopting them
//! - Answering validation and suffix-extraction queries from memory
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐                       ┌─────────────┐
//! │  TldSource  │── fetch ──┐     ┌─────│  TldStore   │
//! └─────────────┘           │     │     └─────────────┘
//!                           ▼     ▼ load / store
//!                       ┌─────────────┐
//!                       │  TldEngine  │── EngineEvent ──▶ monitoring
//!                       └─────────────┘
//!                              │ ArcSwap<TldSnapshot>
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!          validate()      extract()      cache_info()
//! ```
//!
//! ## Refresh Flow
//!
//! 1. Fetch and parse the list from the source
//! 2. Reject an empty list (unless configured otherwise)
//! 3. Store the list and its fetch time
//! 4. Swap the new snapshot in
//! 5. Emit event for monitoring/logging
//!
//! A failure at any step leaves both the store and the in-memory snapshot
//! as they were.

pub mod task;

pub use task::RefreshTask;

use crate::cache::{CacheInfo, TldCache, TldSnapshot};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::extract::{SuffixMatch, extract_suffix};
use crate::traits::{TldSource, TldStore};
use crate::validate::{Validation, Verdict, validate_tld};
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Events emitted by the TldEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine is ready to answer queries
    Initialized {
        tld_count: usize,
        from_store: bool,
    },

    /// Fetch from the source started
    RefreshStarted,

    /// Fetched list was stored and adopted
    RefreshSucceeded {
        tld_count: usize,
    },

    /// Fetch or store failed; previous list retained
    RefreshFailed {
        error: String,
    },

    /// A refresh was requested while one was in flight and joined it
    RefreshCoalesced,

    /// Refresh task stopped
    Stopped {
        reason: String,
    },
}

/// Outcome of one successful fetch-and-adopt cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Distinct entries adopted
    pub tld_count: usize,
    /// Recorded fetch time
    pub updated_at: DateTime<Utc>,
}

/// How [`TldEngine::initialize`] obtained its list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The stored list was fresh
    FromStore { tld_count: usize },
    /// The list was fetched from the source
    Fetched(RefreshReport),
    /// A concurrent refresh installed a fresh list before the store was read
    Current { tld_count: usize },
}

impl Readiness {
    pub fn tld_count(&self) -> usize {
        match self {
            Readiness::FromStore { tld_count } | Readiness::Current { tld_count } => *tld_count,
            Readiness::Fetched(report) => report.tld_count,
        }
    }
}

type SharedRefresh = Shared<BoxFuture<'static, std::result::Result<RefreshReport, Arc<Error>>>>;

/// Core TLD engine
///
/// One engine is built at startup and cloned into every consumer; clones
/// share the cache, the store and the in-flight refresh.
///
/// ## Lifecycle
///
/// 1. Create with [`TldEngine::new()`]
/// 2. Call [`TldEngine::initialize()`] once
/// 3. Start periodic refreshes with [`RefreshTask::spawn()`]
/// 4. Stop the task with [`RefreshTask::stop()`] on shutdown
///
/// ## Concurrency
///
/// Queries read an immutable snapshot and never wait on the network.
/// Overlapping refreshes are coalesced: the first caller starts the fetch,
/// later callers await the same result.
#[derive(Clone)]
pub struct TldEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    source: Arc<dyn TldSource>,
    store: Arc<dyn TldStore>,
    cache: TldCache,
    config: EngineConfig,
    in_flight: Mutex<Option<SharedRefresh>>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl TldEngine {
    /// Create a new TLD engine
    ///
    /// # Parameters
    ///
    /// - `source`: Where fresh lists come from
    /// - `store`: Where fetched lists are persisted
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        source: Arc<dyn TldSource>,
        store: Arc<dyn TldStore>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            inner: Arc::new(EngineInner {
                source,
                store,
                cache: TldCache::new(config.refresh_interval()),
                config,
                in_flight: Mutex::new(None),
                event_tx: tx,
            }),
        };

        Ok((engine, rx))
    }

    /// Load the list from the store, fetching if it is absent or stale
    ///
    /// A stale stored list is adopted before the fetch so queries can be
    /// answered even if the fetch fails; the fetch error is still returned.
    /// A stored list never replaces a newer one installed by a concurrent
    /// refresh.
    pub async fn initialize(&self) -> Result<Readiness> {
        let stored = match self.inner.load_stored().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Could not read stored TLD list: {}. Fetching instead.", e);
                None
            }
        };

        if let Some(snapshot) = stored {
            let now = Utc::now();
            let interval = self.inner.cache.refresh_interval();
            let fresh = snapshot.is_fresh(now, interval);
            let stored_at = snapshot.last_updated();

            match self.inner.cache.adopt(snapshot) {
                Some(adopted) if fresh => {
                    let tld_count = adopted.len();
                    info!("Loaded {} TLDs from store", tld_count);
                    self.inner.emit_event(EngineEvent::Initialized {
                        tld_count,
                        from_store: true,
                    });
                    return Ok(Readiness::FromStore { tld_count });
                }
                Some(_) => {
                    debug!(
                        "Stored TLD list is stale (last updated {:?}), refreshing",
                        stored_at
                    );
                }
                None => {
                    // A refresh finished while the store was being read
                    let current = self.inner.cache.snapshot();
                    debug!(
                        "Stored TLD list ({:?}) overtaken by list fetched at {:?}",
                        stored_at,
                        current.last_updated()
                    );
                    if current.is_fresh(now, interval) {
                        let tld_count = current.len();
                        self.inner.emit_event(EngineEvent::Initialized {
                            tld_count,
                            from_store: false,
                        });
                        return Ok(Readiness::Current { tld_count });
                    }
                }
            }
        }

        let report = self.refresh().await?;
        self.inner.emit_event(EngineEvent::Initialized {
            tld_count: report.tld_count,
            from_store: false,
        });
        Ok(Readiness::Fetched(report))
    }

    /// Fetch, store and adopt a new list regardless of freshness
    ///
    /// Joins the refresh already in flight if there is one; every joined
    /// caller receives the same outcome.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let (refresh, coalesced) = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match slot.as_ref() {
                Some(running) => (running.clone(), true),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let running = async move {
                        let outcome = inner.fetch_and_adopt().await.map_err(Arc::new);
                        inner
                            .in_flight
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .take();
                        outcome
                    }
                    .boxed()
                    .shared();
                    *slot = Some(running.clone());
                    (running, false)
                }
            }
        };

        if coalesced {
            debug!("TLD refresh already in flight, joining it");
            self.inner.emit_event(EngineEvent::RefreshCoalesced);
        }

        refresh.await.map_err(Error::Shared)
    }

    /// Refresh on behalf of an outer layer; true on success
    pub async fn force_refresh(&self) -> bool {
        info!("Forced TLD refresh requested");
        self.refresh().await.is_ok()
    }

    /// Current snapshot for read-only use
    pub fn snapshot(&self) -> Arc<TldSnapshot> {
        self.inner.cache.snapshot()
    }

    /// Whether the current list is fresh at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.inner.cache.is_fresh(now)
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.inner.cache.info_at(Utc::now())
    }

    /// All current TLDs in lexical order
    pub fn all_tlds(&self) -> Vec<String> {
        self.snapshot().sorted()
    }

    /// Validate a TLD such as `com` or `CO.UK`
    pub fn validate(&self, candidate: &str) -> Validation {
        let validation = validate_tld(&self.snapshot(), candidate);
        match validation.verdict {
            Verdict::EmptyInput => debug!("Rejected blank TLD candidate"),
            Verdict::CacheUnavailable => {
                warn!("TLD validation requested before the list was populated")
            }
            _ => {}
        }
        validation
    }

    /// Extract the suffix of `domain` and validate it
    ///
    /// Both steps read the same snapshot.
    pub fn validate_domain(&self, domain: &str) -> Validation {
        if domain.trim().is_empty() {
            return Validation::empty_input();
        }

        let snapshot = self.snapshot();
        match extract_suffix(&snapshot, domain, self.inner.config.match_order) {
            Some(found) => validate_tld(&snapshot, &found.suffix),
            None => Validation::malformed_domain(),
        }
    }

    /// Suffix of `domain`, or `None` for fewer than two labels
    ///
    /// When no candidate is a known TLD the last label is returned
    /// unverified; use [`TldEngine::extract_detailed`] to tell the two apart.
    pub fn extract(&self, domain: &str) -> Option<String> {
        self.extract_detailed(domain).map(|found| found.suffix)
    }

    pub fn extract_detailed(&self, domain: &str) -> Option<SuffixMatch> {
        extract_suffix(&self.snapshot(), domain, self.inner.config.match_order)
    }

    /// Period of the scheduled refresh
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.inner.config.refresh_interval_secs)
    }

    /// Refresh every `period` until `shutdown_rx` fires or its sender is dropped
    ///
    /// A zero `period` is rejected with `Error::InvalidInput`.
    ///
    /// The first refresh happens one full period after the call;
    /// [`TldEngine::initialize`] covers startup. Failed refreshes are logged
    /// and retried on the next tick.
    pub async fn run_with_shutdown(
        &self,
        period: Duration,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<()> {
        task::check_period(period)?;

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        info!("Scheduled TLD refresh every {:?}", period);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    info!("Scheduled TLD refresh...");
                    if self.refresh().await.is_err() {
                        debug!("Scheduled refresh failed; retrying next period");
                    }
                }

                _ = &mut shutdown_rx => {
                    info!("Refresh task shutdown requested");
                    self.inner.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        self.inner.store.flush().await?;
        info!("TLD store flushed, refresh task stopped");
        Ok(())
    }
}

impl EngineInner {
    /// Stored list if it is non-empty and has a fetch time
    async fn load_stored(&self) -> Result<Option<TldSnapshot>> {
        let Some(metadata) = self.store.load_metadata().await? else {
            return Ok(None);
        };
        if metadata.last_updated.is_none() {
            return Ok(None);
        }

        let tlds = self.store.load_set().await?;
        if tlds.is_empty() {
            return Ok(None);
        }

        if tlds.len() != metadata.tld_count {
            warn!(
                "Stored TLD count {} does not match {} stored entries",
                metadata.tld_count,
                tlds.len()
            );
        }

        Ok(Some(TldSnapshot::new(tlds, metadata.last_updated)))
    }

    async fn fetch_and_adopt(&self) -> Result<RefreshReport> {
        let origin = self.source.describe();
        self.emit_event(EngineEvent::RefreshStarted);
        info!("Fetching TLDs from {}", origin);

        match self.try_fetch_and_adopt(&origin).await {
            Ok(report) => {
                info!("Fetched and stored {} TLDs from {}", report.tld_count, origin);
                self.emit_event(EngineEvent::RefreshSucceeded {
                    tld_count: report.tld_count,
                });
                Ok(report)
            }
            Err(e) => {
                error!(
                    "TLD refresh from {} failed, keeping {} cached TLDs: {}",
                    origin,
                    self.cache.snapshot().len(),
                    e
                );
                self.emit_event(EngineEvent::RefreshFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn try_fetch_and_adopt(&self, origin: &str) -> Result<RefreshReport> {
        let entries = self.source.fetch().await?;

        if entries.is_empty() {
            if self.config.reject_empty_fetch {
                return Err(Error::empty_fetch(origin));
            }
            warn!("{} returned no TLD entries; adopting an empty list", origin);
        }

        let now = Utc::now();
        let updated_at = self
            .cache
            .snapshot()
            .last_updated()
            .map_or(now, |previous| previous.max(now));

        // Write-through: the store must hold the list before readers see it
        self.store.store(&entries, updated_at).await?;
        let snapshot = self
            .cache
            .publish(TldSnapshot::new(&entries, Some(updated_at)));

        Ok(RefreshReport {
            tld_count: snapshot.len(),
            updated_at,
        })
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            // Full or closed; dropping keeps memory bounded
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
