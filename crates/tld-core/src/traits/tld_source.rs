// # TLD Source Trait
//
// Defines the interface for retrieving the authoritative TLD list.
//
// ## Implementations
//
// - HTTP: `tld-source-http` crate (IANA plain-text list)
//
// ## Usage
//
// ```rust,ignore
// use tld_core::TldSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* TldSource implementation */;
//
//     let entries = source.fetch().await?;
//     println!("{} entries from {}", entries.len(), source.describe());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for TLD source implementations
///
/// A source performs one bounded fetch per call and returns the parsed
/// entries (see [`crate::list::parse_tld_list`]). It never touches the
/// engine's cache or the store.
///
/// # Failure
///
/// Network errors, non-success responses and timeouts are returned as
/// errors. An implementation must never return a partially read list as
/// success.
#[async_trait]
pub trait TldSource: Send + Sync {
    /// Fetch and parse the list
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Uppercase entries in source order (may contain duplicates)
    /// - `Err(Error)`: The fetch could not complete
    async fn fetch(&self) -> Result<Vec<String>, crate::Error>;

    /// Human-readable origin of the list (URL or name), used in logs
    fn describe(&self) -> String;
}
