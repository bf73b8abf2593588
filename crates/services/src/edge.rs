//! # Edge Service
//!
//! Classifies an image request, renders it, and for live images fetched by the
//! image proxy schedules a purge so the proxy's copy does not go stale.

use std::sync::Arc;
use std::time::Duration;

use domains::{
    ClockGeometry, Clock, DomainError, PurgeNotifier, RenderMode, RenderRequest, Result,
    TimezoneHints,
};

use crate::background::BackgroundTasks;
use crate::clock::{parse_selector, render_style, synthesize, ImageComposer, TimezoneResolver};

/// Value of the `link` query parameter that enables the decorative link.
pub const LINK_REPOSITORY: &str = "repository";

/// Tunables of the edge service.
#[derive(Debug, Clone)]
pub struct EdgeOptions {
    /// Case-insensitive substring of `User-Agent`/`Via` identifying the proxy.
    pub proxy_marker: String,
    /// Added to live timestamps served to the proxy to cover its fetch latency.
    pub proxy_timestamp_offset_ms: i64,
    /// Wait between serving the proxy and asking for the purge.
    pub purge_delay: Duration,
    pub repository_url: String,
}

impl Default for EdgeOptions {
    fn default() -> Self {
        Self {
            proxy_marker: "camo".to_string(),
            proxy_timestamp_offset_ms: 200,
            purge_delay: Duration::from_millis(1000),
            repository_url: "https://github.com/SegaraRai/svgclock".to_string(),
        }
    }
}

/// The parts of an HTTP request the edge service looks at.
#[derive(Debug, Clone, Default)]
pub struct ImageRequest {
    pub path: String,
    /// Value of the `link` query parameter.
    pub link: Option<String>,
    pub user_agent: Option<String>,
    pub via: Option<String>,
    pub hints: TimezoneHints,
    /// Absolute, normalized request URL; what the proxy has cached.
    pub normalized_url: String,
}

/// A rendered document plus what was decided about it.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub svg: String,
    pub request: RenderRequest,
    pub purge_scheduled: bool,
}

pub struct EdgeService {
    clock: Arc<dyn Clock>,
    geometry: ClockGeometry,
    composer: ImageComposer,
    timezones: TimezoneResolver,
    notifier: Option<Arc<dyn PurgeNotifier>>,
    tasks: BackgroundTasks,
    options: EdgeOptions,
}

impl EdgeService {
    pub fn new(
        clock: Arc<dyn Clock>,
        geometry: ClockGeometry,
        notifier: Option<Arc<dyn PurgeNotifier>>,
        tasks: BackgroundTasks,
        options: EdgeOptions,
    ) -> Self {
        let composer = ImageComposer::new(&geometry);
        Self {
            clock,
            geometry,
            composer,
            timezones: TimezoneResolver::new(),
            notifier,
            tasks,
            options,
        }
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// `User-Agent` wins when present (even if empty), `Via` otherwise.
    pub fn is_via_proxy(&self, user_agent: Option<&str>, via: Option<&str>) -> bool {
        let source = user_agent.or(via).unwrap_or_default();
        source
            .to_ascii_lowercase()
            .contains(&self.options.proxy_marker.to_ascii_lowercase())
    }

    /// Works out what to draw. Unknown paths are [`DomainError::NotFound`].
    pub fn classify(&self, req: &ImageRequest) -> Result<RenderRequest> {
        let selector = parse_selector(&req.path).ok_or(DomainError::NotFound)?;
        let via_proxy = self.is_via_proxy(req.user_agent.as_deref(), req.via.as_deref());
        let now = self.clock.now_millis();

        let timezone_offset_minutes = if selector.needs_timezone() {
            self.timezones.resolve_offset(&req.hints, now, via_proxy)
        } else {
            None
        };

        let (mut timestamp, mode) = selector.resolve(now, timezone_offset_minutes);
        if via_proxy && mode.is_live() {
            timestamp += self.options.proxy_timestamp_offset_ms;
        }

        let decoration_link = (req.link.as_deref() == Some(LINK_REPOSITORY))
            .then(|| self.options.repository_url.clone());

        Ok(RenderRequest {
            timestamp,
            mode,
            timezone_offset_minutes,
            via_proxy,
            decoration_link,
        })
    }

    /// Draws the SVG for an already classified request.
    pub fn draw(&self, request: &RenderRequest) -> Result<String> {
        let style = render_style(&synthesize(&self.geometry, request.timestamp));
        self.composer
            .compose(&style, request.decoration_link.as_deref())
            .map_err(|e| DomainError::Internal(format!("template: {e}")))
    }

    /// Full pipeline: classify, draw, and schedule a purge when the proxy
    /// fetched a live image.
    pub fn render(&self, req: &ImageRequest) -> Result<RenderedImage> {
        let request = self.classify(req)?;
        let svg = self.draw(&request)?;

        let purge_scheduled = request.mode == RenderMode::Live
            && request.via_proxy
            && self.schedule_purge(req.normalized_url.clone());

        tracing::debug!(
            path = %req.path,
            mode = ?request.mode,
            via_proxy = request.via_proxy,
            purge_scheduled,
            "rendered clock"
        );

        Ok(RenderedImage {
            svg,
            request,
            purge_scheduled,
        })
    }

    /// Fire-and-forget purge after the configured delay. Failures are logged
    /// and dropped. Returns false when no coordinator is configured.
    pub fn schedule_purge(&self, image_url: String) -> bool {
        let Some(notifier) = self.notifier.clone() else {
            return false;
        };

        self.tasks.spawn_delayed(self.options.purge_delay, async move {
            match notifier.request_purge(&image_url).await {
                Ok(()) => tracing::info!(url = %image_url, "purge requested"),
                Err(e) => tracing::warn!(url = %image_url, error = %e, "purge request failed"),
            }
        });
        true
    }
}
