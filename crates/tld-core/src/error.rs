//! Error types for the TLD engine
//!
//! This module defines all error types used throughout the crate.

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for TLD engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the TLD engine
#[derive(Error, Debug)]
pub enum Error {
    /// TLD source-related errors (fetch could not complete)
    #[error("TLD source error: {0}")]
    Source(String),

    /// TLD store-related errors
    #[error("TLD store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP errors (non-success status, unreadable body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The fetch did not complete within its timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The source answered but the payload held no entries
    #[error("Fetch from {0} returned no TLD entries")]
    EmptyFetch(String),

    /// A failure observed by every caller of one coalesced refresh
    #[error(transparent)]
    Shared(Arc<Error>),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a TLD source (fetch) error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a TLD store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an empty-fetch error for the given source
    pub fn empty_fetch(source: impl Into<String>) -> Self {
        Self::EmptyFetch(source.into())
    }

    /// True for failures caused by the remote fetch rather than local state
    pub fn is_network_failure(&self) -> bool {
        match self {
            Self::Source(_) | Self::Network(_) | Self::Http(_) | Self::Timeout(_) => true,
            Self::Shared(inner) => inner.is_network_failure(),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
