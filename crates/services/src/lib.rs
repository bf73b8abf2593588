//! # Services
//!
//! Application logic of the clock: rendering, the edge request pipeline and
//! the purge coordinator. Depends only on `domains` ports; adapters are
//! injected by the binary.

pub mod background;
pub mod clock;
pub mod edge;
pub mod purge;

pub use background::BackgroundTasks;
pub use edge::{EdgeOptions, EdgeService, ImageRequest, RenderedImage, LINK_REPOSITORY};
pub use purge::{bearer_token, is_bearer_token, PurgeCoordinator, PurgeOptions};

use domains::Clock;

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_reference_date() {
        assert!(SystemClock.now_millis() > clock::route::FIXED_REFERENCE_EPOCH_MS);
    }
}
