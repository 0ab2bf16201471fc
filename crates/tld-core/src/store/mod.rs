// # TLD Store Implementations
//
// This module provides implementations of the TldStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileTldStore;
pub use memory::MemoryTldStore;
