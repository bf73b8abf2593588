//! # Domain Models
//!
//! These structs describe a single clock render and the state the purge
//! coordinator keeps between requests. All instants are Unix epoch
//! milliseconds (UTC) so the keyframe arithmetic stays integral.

use serde::{Deserialize, Serialize};

/// Whether a rendered image is tied to a fixed instant or to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Fixed instant encoded in the path; safe to cache forever.
    Static,
    /// Follows the wall clock; must not be cached by direct clients.
    Live,
}

impl RenderMode {
    pub fn is_live(self) -> bool {
        matches!(self, RenderMode::Live)
    }
}

/// Everything needed to produce one SVG. Built per request and dropped
/// once the response is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Instant the face must show at animation start (proxy correction applied).
    pub timestamp: i64,
    pub mode: RenderMode,
    /// Offset that was folded into `timestamp` for `local.svg`, if any.
    pub timezone_offset_minutes: Option<i32>,
    pub via_proxy: bool,
    /// Target of the optional decorative hyperlink.
    pub decoration_link: Option<String>,
}

/// A single keyframe of a segment animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Position inside the cycle, 0..100, already phase-shifted so that 0
    /// corresponds to the rendered instant.
    pub phase_percent: f64,
    pub on: bool,
}

/// Opacity schedule of one segment of the face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAnimation {
    /// CSS class of the segment (e.g. `s0a`).
    pub segment_id: String,
    /// Cycle length in seconds. `None` means the segment never changes.
    pub period_secs: Option<u32>,
    /// Keyframes in emission order; empty for static segments.
    pub breakpoints: Vec<Breakpoint>,
    /// State before the first keyframe fires. For animated segments this is the
    /// state of the breakpoint with the largest phase, so the first frame does
    /// not flicker.
    pub initial_on: bool,
}

/// Axis-aligned outline of a segment, in SVG user units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<(i32, i32)>,
}

impl Polygon {
    /// Renders the `points` attribute value (`x,y x,y ...`).
    pub fn to_points_attr(&self) -> String {
        self.points
            .iter()
            .map(|(x, y)| format!("{x},{y}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One lit/unlit element of the face and its raw schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub class_name: String,
    /// Parity seed of the on/off pattern: `0` when the segment is lit at the
    /// start of its cycle, `2` when it is dark.
    pub initial: u8,
    /// Raw keyframe offsets in milliseconds from the start of the cycle.
    pub keyframes_ms: Vec<u32>,
    pub shape: Polygon,
}

/// A group of segments sharing one cycle length (a digit, a colon).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: String,
    pub period_secs: u32,
    pub segments: Vec<Segment>,
}

/// The full, immutable face description. Built once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockGeometry {
    pub displays: Vec<Display>,
    /// `min-x min-y width height` of the SVG viewport.
    pub view_box: (i32, i32, i32, i32),
}

impl ClockGeometry {
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.displays.iter().flat_map(|d| d.segments.iter())
    }
}

/// Request metadata used to guess the viewer's timezone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimezoneHints {
    /// Rich IANA name supplied by the edge platform.
    pub edge_timezone: Option<String>,
    /// Country code supplied by the edge platform.
    pub edge_country: Option<String>,
    /// Country header presented with the request.
    pub client_country: Option<String>,
    pub accept_language: Option<String>,
}

/// Cached mapping from an image URL to the proxy's cache-entry URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeRecord {
    pub image_url: String,
    pub cache_entry_url: String,
}

/// JSON body of `POST /purge/github`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgePayload {
    pub url: String,
}
