//! # Keyframe Synthesizer
//!
//! Converts the static [`ClockGeometry`] plus an instant into per-segment
//! opacity schedules. Each display's keyframes are rotated so that 0% of the
//! animation is the requested instant; the browser then plays them without any
//! script.

use std::fmt::Write;

use domains::{Breakpoint, ClockGeometry, SegmentAnimation};

const OPACITY_ON: &str = "1";
const OPACITY_OFF: &str = "0.04";

/// On/off state of the `index`-th keyframe for a segment seeded with `initial`.
pub fn breakpoint_state(index: usize, initial: u8) -> bool {
    let phase = (index + usize::from(initial)) & 3;
    phase == 0 || phase == 3
}

/// Schedules for every segment of `geometry` at `timestamp_ms`.
pub fn synthesize(geometry: &ClockGeometry, timestamp_ms: i64) -> Vec<SegmentAnimation> {
    let mut animations = Vec::with_capacity(geometry.segments().count());

    for display in &geometry.displays {
        let cycle_ms = i64::from(display.period_secs) * 1000;
        let percent_divisor = f64::from(display.period_secs) * 10.0;
        let offset_ms = cycle_ms - timestamp_ms.rem_euclid(cycle_ms);

        for segment in &display.segments {
            if segment.keyframes_ms.is_empty() {
                animations.push(SegmentAnimation {
                    segment_id: segment.class_name.clone(),
                    period_secs: None,
                    breakpoints: Vec::new(),
                    initial_on: segment.initial == 0,
                });
                continue;
            }

            let mut initial_on = segment.initial == 0;
            let mut max_percent = 0.0;
            let breakpoints = segment
                .keyframes_ms
                .iter()
                .enumerate()
                .map(|(i, &raw)| {
                    let shifted = (i64::from(raw) + offset_ms) % cycle_ms;
                    let phase_percent = shifted as f64 / percent_divisor;
                    let on = breakpoint_state(i, segment.initial);
                    if max_percent < phase_percent {
                        max_percent = phase_percent;
                        initial_on = on;
                    }
                    Breakpoint { phase_percent, on }
                })
                .collect();

            animations.push(SegmentAnimation {
                segment_id: segment.class_name.clone(),
                period_secs: Some(display.period_secs),
                breakpoints,
                initial_on,
            });
        }
    }

    animations
}

fn opacity(on: bool) -> &'static str {
    if on {
        OPACITY_ON
    } else {
        OPACITY_OFF
    }
}

/// Serializes schedules as a CSS style block: one `@keyframes` rule plus a
/// class rule per animated segment, a single class rule per static one.
pub fn render_style(animations: &[SegmentAnimation]) -> String {
    let mut css = String::new();

    for anim in animations {
        let class = &anim.segment_id;
        match anim.period_secs {
            Some(period) => {
                // Writing into a String cannot fail.
                let _ = writeln!(css, "@keyframes k{class} {{");
                for bp in &anim.breakpoints {
                    let _ = writeln!(css, "{}% {{ opacity: {} }}", bp.phase_percent, opacity(bp.on));
                }
                css.push_str("}\n");
                let _ = writeln!(
                    css,
                    ".{class} {{ opacity: {}; animation: k{class} {period}s ease infinite }}",
                    opacity(anim.initial_on)
                );
            }
            None => {
                let _ = writeln!(css, ".{class} {{ opacity: {} }}", opacity(anim.initial_on));
            }
        }
    }

    css
}
