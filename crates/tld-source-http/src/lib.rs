// # HTTP TLD Source
//
// This crate provides the HTTP-based TldSource for the TLD engine.
//
// ## Purpose
//
// Downloads the authoritative TLD list published by the registry
// (IANA's `tlds-alpha-by-domain.txt` by default) and parses it into
// uppercase entries.
//
// ## Failure Handling
//
// Every fetch is bounded by the configured timeout. A timeout, a
// connection error or a non-success status is returned as an error; the
// engine keeps its current list in that case. The source itself holds no
// state between fetches.

use tld_core::config::SourceConfig;
use tld_core::list::parse_tld_list;
use tld_core::traits::TldSource;
use tld_core::{Error, Result};

use std::time::Duration;

/// HTTP-based TLD source
pub struct HttpTldSource {
    /// URL of the newline-delimited TLD list
    url: String,

    /// HTTP client with the fetch timeout applied
    client: reqwest::Client,

    timeout: Duration,
}

impl HttpTldSource {
    /// Create a new HTTP TLD source
    ///
    /// # Parameters
    ///
    /// - `url`: URL of the list (e.g., "https://data.iana.org/TLD/tlds-alpha-by-domain.txt")
    /// - `timeout`: Upper bound on one whole fetch
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tldd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            timeout,
        })
    }

    /// Create from the `source` section of a [`tld_core::TldConfig`]
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.validate()?;
        match config {
            SourceConfig::Http { url, timeout_secs } => {
                Self::new(url.clone(), Duration::from_secs(*timeout_secs))
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(format!("GET {} exceeded {:?}", self.url, self.timeout))
        } else {
            Error::fetch(format!("GET {} failed: {}", self.url, e))
        }
    }
}

#[async_trait::async_trait]
impl TldSource for HttpTldSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        tracing::debug!("GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("{} returned HTTP {}", self.url, status)));
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        let entries = parse_tld_list(&body);

        tracing::debug!(
            "Parsed {} entries from {} bytes served by {}",
            entries.len(),
            body.len(),
            self.url
        );
        Ok(entries)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
