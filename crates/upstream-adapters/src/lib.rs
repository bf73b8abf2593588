//! svgclock/crates/upstream-adapters/src/lib.rs
//!
//! HTTP clients for everything outside the process: the purge coordinator
//! (called by the edge), the markdown rendering API and the image proxy
//! (both called by the coordinator).

pub mod client;
pub mod evictor;
pub mod markdown;
pub mod notifier;

pub use client::{build_client, UpstreamSettings};
pub use evictor::HttpProxyEvictor;
pub use markdown::{extract_first_src, GithubMarkdownResolver};
pub use notifier::HttpPurgeNotifier;
