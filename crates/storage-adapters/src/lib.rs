//! svgclock/crates/storage-adapters/src/lib.rs
//!
//! Implementations of the `PurgeRecordStore` port.

pub mod memory;

pub use memory::InMemoryPurgeRecordStore;
