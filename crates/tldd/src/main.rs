// # tldd - TLD Cache Daemon
//
// The tldd daemon is a thin integration layer over tld-core:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the store, the HTTP source and the engine
// 4. Keeping the TLD list fresh until SIGTERM/SIGINT
//
// All cache, refresh and validation logic lives in tld-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Source
// - `TLD_SOURCE_URL`: URL of the newline-delimited TLD list (default: IANA)
// - `TLD_FETCH_TIMEOUT_SECS`: Fetch timeout in seconds (default: 30)
//
// ### Refresh
// - `TLD_UPDATE_INTERVAL_HOURS`: Staleness threshold and refresh period (default: 24)
// - `TLD_MATCH_ORDER`: Suffix match order, `shortest` or `longest` (default: shortest)
//
// ### Store
// - `TLD_STORE_TYPE`: Type of store (file, memory; default: file)
// - `TLD_STORE_PATH`: Path to the cache file (default: ./data/tld_cache.json)
//
// ### Logging
// - `TLD_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Usage
//
// ```bash
// export TLD_STORE_PATH=/var/lib/tldd/tld_cache.json
// export TLD_UPDATE_INTERVAL_HOURS=12
//
// tldd                      # run as a daemon
// tldd com co.uk example.io # check arguments once and exit
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tld_core::config::DEFAULT_TLD_URL;
use tld_core::{
    EngineConfig, EngineEvent, FileTldStore, MemoryTldStore, RefreshTask, SourceConfig,
    StoreConfig, SuffixMatchOrder, TldConfig, TldEngine, TldSource, TldStore, Validation,
};
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long a refresh in progress may delay shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

const DEFAULT_STORE_PATH: &str = "./data/tld_cache.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlddExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<TlddExitCode> for ExitCode {
    fn from(code: TlddExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    source_url: String,
    fetch_timeout_secs: u64,
    update_interval_hours: u64,
    match_order: String,
    store_type: String,
    store_path: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a whole number. Got: '{}'", key, raw)),
                None => Ok(default),
            }
        };

        Ok(Self {
            source_url: lookup("TLD_SOURCE_URL").unwrap_or_else(|| DEFAULT_TLD_URL.to_string()),
            fetch_timeout_secs: number("TLD_FETCH_TIMEOUT_SECS", 30)?,
            update_interval_hours: number("TLD_UPDATE_INTERVAL_HOURS", 24)?,
            match_order: lookup("TLD_MATCH_ORDER").unwrap_or_else(|| "shortest".to_string()),
            store_type: lookup("TLD_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            store_path: lookup("TLD_STORE_PATH").unwrap_or_else(|| DEFAULT_STORE_PATH.to_string()),
            log_level: lookup("TLD_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.source_url.starts_with("https://") && !self.source_url.starts_with("http://") {
            anyhow::bail!(
                "TLD_SOURCE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.source_url
            );
        }

        if self.source_url.starts_with("http://") {
            eprintln!(
                "WARNING: TLD_SOURCE_URL uses HTTP (not HTTPS). \
                The list could be tampered with in transit."
            );
        }

        if !(1..=300).contains(&self.fetch_timeout_secs) {
            anyhow::bail!(
                "TLD_FETCH_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.fetch_timeout_secs
            );
        }

        if !(1..=24 * 365).contains(&self.update_interval_hours) {
            anyhow::bail!(
                "TLD_UPDATE_INTERVAL_HOURS must be between 1 and 8760. Got: {}",
                self.update_interval_hours
            );
        }

        self.match_order
            .parse::<SuffixMatchOrder>()
            .map_err(|_| {
                anyhow::anyhow!(
                    "TLD_MATCH_ORDER '{}' is not valid. Valid orders: shortest, longest",
                    self.match_order
                )
            })?;

        match self.store_type.as_str() {
            "file" => {
                if self.store_path.trim().is_empty() {
                    anyhow::bail!("TLD_STORE_PATH cannot be empty when TLD_STORE_TYPE=file");
                }
            }
            "memory" => {}
            _ => anyhow::bail!(
                "TLD_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.store_type
            ),
        }

        self.log_level()?;

        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "TLD_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Translate into the library configuration
    fn to_tld_config(&self) -> Result<TldConfig> {
        let match_order = self.match_order.parse::<SuffixMatchOrder>()?;

        let store = match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            _ => StoreConfig::File {
                path: self.store_path.clone(),
            },
        };

        let config = TldConfig {
            source: SourceConfig::Http {
                url: self.source_url.clone(),
                timeout_secs: self.fetch_timeout_secs,
            },
            store,
            engine: EngineConfig {
                refresh_interval_secs: self.update_interval_hours * 3600,
                match_order,
                ..EngineConfig::default()
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return TlddExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return TlddExitCode::ConfigError.into();
    }

    let tld_config = match config.to_tld_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return TlddExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TlddExitCode::ConfigError.into();
    }

    let queries: Vec<String> = env::args().skip(1).collect();

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TlddExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let engine = match build_engine(&tld_config).await {
            Ok(engine) => engine,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return TlddExitCode::ConfigError;
            }
        };

        let outcome = if queries.is_empty() {
            run_daemon(engine).await
        } else {
            run_once(engine, &queries).await
        };

        match outcome {
            Ok(()) => TlddExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                TlddExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the store, the source and the engine, and start draining engine events
async fn build_engine(config: &TldConfig) -> Result<TldEngine> {
    let store: Arc<dyn TldStore> = match &config.store {
        StoreConfig::File { path } => {
            info!("Using file store at {}", path);
            Arc::new(
                FileTldStore::new(path)
                    .await
                    .with_context(|| format!("Failed to open store at {}", path))?,
            )
        }
        StoreConfig::Memory => {
            warn!("Using memory store; the TLD list will be refetched after every restart");
            Arc::new(MemoryTldStore::new())
        }
    };

    let source = build_source(&config.source)?;
    info!("Fetching TLD lists from {}", source.describe());

    let (engine, events) = TldEngine::new(source, store, config.engine.clone())?;
    tokio::spawn(log_events(events));

    Ok(engine)
}

#[cfg(feature = "http")]
fn build_source(config: &SourceConfig) -> Result<Arc<dyn TldSource>> {
    Ok(Arc::new(tld_source_http::HttpTldSource::from_config(config)?))
}

#[cfg(not(feature = "http"))]
fn build_source(_config: &SourceConfig) -> Result<Arc<dyn TldSource>> {
    anyhow::bail!("tldd was built without the `http` feature; no TLD source is available")
}

/// Forward engine events to the log
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Engine event: {:?}", event);
    }
}

/// Run the daemon
async fn run_daemon(engine: TldEngine) -> Result<()> {
    info!("Starting tldd daemon");

    match engine.initialize().await {
        Ok(readiness) => info!("TLD cache ready with {} entries", readiness.tld_count()),
        Err(e) if !engine.snapshot().is_empty() => {
            warn!("Serving stale TLD list after failed refresh: {}", e);
        }
        Err(e) => {
            // Scheduled refreshes may still succeed once the source is reachable
            warn!("TLD list unavailable until the next successful refresh: {}", e);
        }
    }

    let task = RefreshTask::spawn(engine.clone())?;
    info!(
        "Refreshing every {:?}; waiting for shutdown signal",
        engine.refresh_period()
    );

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down daemon");

    match tokio::time::timeout(SHUTDOWN_GRACE, task.stop()).await {
        Ok(result) => result?,
        Err(_) => anyhow::bail!("Refresh task did not stop within {:?}", SHUTDOWN_GRACE),
    }

    let info = engine.cache_info();
    info!(
        "Stopped with {} TLDs (last updated {:?})",
        info.tld_count, info.last_updated
    );
    Ok(())
}

/// Load the list, print one verdict per query and exit
async fn run_once(engine: TldEngine, queries: &[String]) -> Result<()> {
    if let Err(e) = engine.initialize().await {
        if engine.snapshot().is_empty() {
            return Err(e).context("No TLD list available");
        }
        warn!("Using stale TLD list: {}", e);
    }

    for query in queries {
        let verdict = check(&engine, query);
        println!(
            "{}\t{}\t{}",
            query,
            if verdict.is_valid { "valid" } else { "invalid" },
            verdict.message
        );
    }

    Ok(())
}

/// A known TLD is reported as such; anything else with a suffix is checked as a domain
fn check(engine: &TldEngine, query: &str) -> Validation {
    let as_tld = engine.validate(query);
    if as_tld.is_valid {
        return as_tld;
    }

    match engine.extract(query) {
        Some(_) => engine.validate_domain(query),
        None => as_tld,
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
