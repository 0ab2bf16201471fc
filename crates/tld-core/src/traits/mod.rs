//! Core traits for the TLD engine
//!
//! This module defines the abstract interfaces the engine is wired with.
//!
//! - [`TldSource`]: Fetch the authoritative TLD list
//! - [`TldStore`]: Durable storage of the current list and its metadata

pub mod tld_source;
pub mod tld_store;

pub use tld_source::TldSource;
pub use tld_store::{CacheMetadata, TldStore};
