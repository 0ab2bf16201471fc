//! Configuration types for the TLD engine
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Authoritative IANA list of top-level domains
pub const DEFAULT_TLD_URL: &str = "https://data.iana.org/TLD/tlds-alpha-by-domain.txt";

/// Main TLD engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TldConfig {
    /// Remote source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Persistence configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl TldConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.source.validate()?;
        self.store.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Remote TLD source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Plain-text list fetched over HTTP(S)
    Http {
        /// URL of the newline-delimited list
        #[serde(default = "default_source_url")]
        url: String,
        /// Request timeout in seconds
        #[serde(default = "default_fetch_timeout_secs")]
        timeout_secs: u64,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(crate::Error::config("TLD source URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "TLD source URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("TLD fetch timeout must be > 0"));
                }
                Ok(())
            }
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Http {
            url: default_source_url(),
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// TLD store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file store
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("TLD store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Order in which trailing-label candidates are tried during suffix extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixMatchOrder {
    /// Single trailing label first; `foo.co.uk` resolves to `UK` when both exist
    #[default]
    Shortest,
    /// Most labels first; `foo.co.uk` resolves to `CO.UK` when both exist
    Longest,
}

impl std::str::FromStr for SuffixMatchOrder {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortest" => Ok(Self::Shortest),
            "longest" => Ok(Self::Longest),
            other => Err(crate::Error::config(format!(
                "Unknown suffix match order '{}'. Valid: shortest, longest",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Age after which the cached list is stale (in seconds)
    ///
    /// Also the period of the scheduled refresh task.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Candidate order for suffix extraction
    #[serde(default)]
    pub match_order: SuffixMatchOrder,

    /// Treat a fetch that parses to zero entries as a failure
    ///
    /// When set, an empty payload never replaces a populated list.
    #[serde(default = "default_reject_empty_fetch")]
    pub reject_empty_fetch: bool,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.refresh_interval_secs == 0 {
            return Err(crate::Error::config("Refresh interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Refresh interval as a chrono duration
    pub fn refresh_interval(&self) -> chrono::Duration {
        // chrono panics past i64::MAX milliseconds
        let secs = self.refresh_interval_secs.min(i64::MAX as u64 / 1000);
        chrono::Duration::seconds(secs as i64)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            match_order: SuffixMatchOrder::default(),
            reject_empty_fetch: default_reject_empty_fetch(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_source_url() -> String {
    DEFAULT_TLD_URL.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_refresh_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_reject_empty_fetch() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    1000
}
