// # tld-core
//
// Core library for the TLD cache and suffix-validation engine.
//
// ## Architecture Overview
//
// This library answers "is X a currently valid top-level domain?" against a
// list published by a registry:
// - **TldSource**: Trait for fetching the authoritative list
// - **TldStore**: Trait for persisting the list and its fetch time
// - **TldEngine**: Freshness-gated cache, refresh coordination and queries
// - **RefreshTask**: Cancellable periodic refresh
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Fetching and persistence sit behind traits
// 2. **Immutable Snapshots**: A refresh swaps in a whole new list; readers never lock
// 3. **Single-Flight Refresh**: Overlapping refreshes share one fetch
// 4. **Write-Through**: A list is stored before it is served
// 5. **Library-First**: The daemon is a thin wrapper over this crate

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod list;
pub mod store;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use cache::{CacheInfo, TldSnapshot};
pub use config::{EngineConfig, SourceConfig, StoreConfig, SuffixMatchOrder, TldConfig};
pub use engine::{EngineEvent, Readiness, RefreshReport, RefreshTask, TldEngine};
pub use error::{Error, Result};
pub use extract::SuffixMatch;
pub use store::{FileTldStore, MemoryTldStore};
pub use traits::{CacheMetadata, TldSource, TldStore};
pub use validate::{Validation, Verdict};
