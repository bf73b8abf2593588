//! svgclock/crates/domains/src/lib.rs
//!
//! Models, port traits and errors shared by the edge renderer and the purge
//! coordinator. No I/O lives here.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
