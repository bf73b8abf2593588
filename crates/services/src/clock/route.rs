//! # Route Resolver
//!
//! Turns a request path into the instant to render and its [`RenderMode`].
//! Patterns are tried in order and the first match wins.

use domains::RenderMode;
use once_cell::sync::Lazy;
use regex::Regex;

/// Calendar date used for fixed-time images: 2023-02-01T00:00:00Z.
pub const FIXED_REFERENCE_EPOCH_MS: i64 = 1_675_209_600_000;

const MS_PER_MINUTE: i64 = 60_000;

static UTC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^/utc\.svg$").expect("static regex"));
static LOCAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/local\.svg$").expect("static regex"));
static UTC_OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/utc([+-])([0-9]{2})([0-9]{2})\.svg$").expect("static regex"));
static FIXED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/([0-9]{2})([0-9]{2})([0-9]{2})(?:\.([0-9]{3}))?\.svg$").expect("static regex")
});

/// A recognized path shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// `/utc.svg`
    Utc,
    /// `/local.svg`
    Local,
    /// `/utc+HHMM.svg` or `/utc-HHMM.svg`, signed minutes
    UtcOffset { minutes: i64 },
    /// `/HHMMSS[.mmm].svg`; fields are not range-checked
    Fixed {
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    },
}

/// Two or three ASCII digits; the regex already guarantees the shape.
fn digits(s: &str) -> u32 {
    s.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// Recognizes one of the four supported path shapes.
pub fn parse_selector(path: &str) -> Option<Selector> {
    if UTC_RE.is_match(path) {
        return Some(Selector::Utc);
    }

    if LOCAL_RE.is_match(path) {
        return Some(Selector::Local);
    }

    if let Some(caps) = UTC_OFFSET_RE.captures(path) {
        let sign = if &caps[1] == "-" { -1 } else { 1 };
        let minutes = i64::from(digits(&caps[2])) * 60 + i64::from(digits(&caps[3]));
        return Some(Selector::UtcOffset {
            minutes: sign * minutes,
        });
    }

    if let Some(caps) = FIXED_RE.captures(path) {
        return Some(Selector::Fixed {
            hour: digits(&caps[1]),
            minute: digits(&caps[2]),
            second: digits(&caps[3]),
            millisecond: caps.get(4).map(|m| digits(m.as_str())).unwrap_or(0),
        });
    }

    None
}

impl Selector {
    /// Only `local.svg` needs a timezone lookup.
    pub fn needs_timezone(&self) -> bool {
        matches!(self, Selector::Local)
    }

    /// Resolves the selector against `now_ms`. `local_offset_minutes` is only
    /// consulted for [`Selector::Local`]; absent means UTC.
    ///
    /// Out-of-range fixed fields (minute 75, hour 30) overflow into the next
    /// unit on the reference date instead of being rejected.
    pub fn resolve(&self, now_ms: i64, local_offset_minutes: Option<i32>) -> (i64, RenderMode) {
        match *self {
            Selector::Utc => (now_ms, RenderMode::Live),
            Selector::Local => {
                let offset = i64::from(local_offset_minutes.unwrap_or(0));
                (now_ms + offset * MS_PER_MINUTE, RenderMode::Live)
            }
            Selector::UtcOffset { minutes } => (now_ms + minutes * MS_PER_MINUTE, RenderMode::Live),
            Selector::Fixed {
                hour,
                minute,
                second,
                millisecond,
            } => {
                let ms = i64::from(hour) * 3_600_000
                    + i64::from(minute) * MS_PER_MINUTE
                    + i64::from(second) * 1_000
                    + i64::from(millisecond);
                (FIXED_REFERENCE_EPOCH_MS + ms, RenderMode::Static)
            }
        }
    }
}
