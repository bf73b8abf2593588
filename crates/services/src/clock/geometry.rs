//! # Clock Geometry
//!
//! Builds the static face description: six seven-segment digits (`HH:MM:SS`)
//! and two blinking colons. For every segment it precomputes the raw keyframe
//! offsets inside the display's cycle, so rendering is pure arithmetic.
//!
//! Keyframes come in pairs around each change of state: the last millisecond
//! of the old state and the first millisecond of the new one. Combined with the
//! parity seed this yields the `on, off, off, on` pattern the synthesizer
//! expects.

use domains::{ClockGeometry, Display, Polygon, Segment};

/// Lit segments per digit, bit 0 = `a` ... bit 6 = `g`.
const DIGIT_SEGMENTS: [u8; 10] = [
    0b011_1111, // 0
    0b000_0110, // 1
    0b101_1011, // 2
    0b100_1111, // 3
    0b110_0110, // 4
    0b110_1101, // 5
    0b111_1101, // 6
    0b000_0111, // 7
    0b111_1111, // 8
    0b110_1111, // 9
];

const SEGMENT_NAMES: [char; 7] = ['a', 'b', 'c', 'd', 'e', 'f', 'g'];

const DIGIT_WIDTH: i32 = 100;
const DIGIT_HEIGHT: i32 = 180;
const THICKNESS: i32 = 16;
const COLON_WIDTH: i32 = 40;
const GAP: i32 = 20;
const MARGIN: i32 = 40;

/// Parity seed for a segment lit at cycle start.
pub const INITIAL_ON: u8 = 0;
/// Parity seed for a segment dark at cycle start.
pub const INITIAL_OFF: u8 = 2;

/// How one digit derives its value from the step index inside its cycle.
struct DigitSpec {
    id: &'static str,
    period_secs: u32,
    step_ms: u32,
    divisor: u32,
}

impl DigitSpec {
    fn steps(&self) -> u32 {
        self.period_secs * 1000 / self.step_ms
    }

    fn value_at(&self, step: u32) -> usize {
        ((step / self.divisor) % 10) as usize
    }
}

const DIGITS: [DigitSpec; 6] = [
    DigitSpec { id: "h1", period_secs: 86_400, step_ms: 3_600_000, divisor: 10 },
    DigitSpec { id: "h0", period_secs: 86_400, step_ms: 3_600_000, divisor: 1 },
    DigitSpec { id: "m1", period_secs: 3_600, step_ms: 60_000, divisor: 10 },
    DigitSpec { id: "m0", period_secs: 600, step_ms: 60_000, divisor: 1 },
    DigitSpec { id: "s1", period_secs: 60, step_ms: 1_000, divisor: 10 },
    DigitSpec { id: "s0", period_secs: 10, step_ms: 1_000, divisor: 1 },
];

/// Builds the face. Call once at startup and share the result.
pub fn build_clock_geometry() -> ClockGeometry {
    let mut displays = Vec::with_capacity(8);
    let mut x = 0;

    for (i, spec) in DIGITS.iter().enumerate() {
        if i == 2 || i == 4 {
            displays.push(colon_display(&format!("c{}", i / 2 - 1), x));
            x += COLON_WIDTH + GAP;
        }
        displays.push(digit_display(spec, x));
        x += DIGIT_WIDTH + GAP;
    }

    let width = x - GAP;
    ClockGeometry {
        displays,
        view_box: (-MARGIN, -10, width + 2 * MARGIN, DIGIT_HEIGHT + 20),
    }
}

fn digit_display(spec: &DigitSpec, x: i32) -> Display {
    let steps: Vec<u8> = (0..spec.steps())
        .map(|k| DIGIT_SEGMENTS[spec.value_at(k)])
        .collect();

    let segments = SEGMENT_NAMES
        .iter()
        .enumerate()
        .map(|(bit, name)| {
            let states: Vec<bool> = steps.iter().map(|mask| mask & (1 << bit) != 0).collect();
            let (initial, keyframes_ms) = schedule(&states, spec.step_ms);
            Segment {
                class_name: format!("{}{}", spec.id, name),
                initial,
                keyframes_ms,
                shape: digit_segment_shape(bit, x),
            }
        })
        .collect();

    Display {
        id: spec.id.to_string(),
        period_secs: spec.period_secs,
        segments,
    }
}

/// Colon dots: lit for the first half of every second.
fn colon_display(id: &str, x: i32) -> Display {
    let states = [true, false];
    let cx = x + COLON_WIDTH / 2;
    let segments = [("u", DIGIT_HEIGHT / 3), ("l", DIGIT_HEIGHT * 2 / 3)]
        .into_iter()
        .map(|(name, cy)| {
            let (initial, keyframes_ms) = schedule(&states, 500);
            Segment {
                class_name: format!("{id}{name}"),
                initial,
                keyframes_ms,
                shape: square(cx, cy, THICKNESS),
            }
        })
        .collect();

    Display {
        id: id.to_string(),
        period_secs: 1,
        segments,
    }
}

/// Parity seed and raw keyframes for a cyclic sequence of per-step states.
/// A constant sequence yields no keyframes (static segment).
fn schedule(states: &[bool], step_ms: u32) -> (u8, Vec<u32>) {
    let Some(&first) = states.first() else {
        return (INITIAL_OFF, Vec::new());
    };
    let initial = if first { INITIAL_ON } else { INITIAL_OFF };

    let mut keyframes = Vec::new();
    for k in 1..=states.len() {
        let current = states[k % states.len()];
        if current != states[k - 1] {
            let boundary = k as u32 * step_ms;
            keyframes.push(boundary - 1);
            keyframes.push(boundary);
        }
    }
    (initial, keyframes)
}

/// Hexagonal bar for segment `bit` of a digit whose left edge is at `x`.
fn digit_segment_shape(bit: usize, x: i32) -> Polygon {
    let half = THICKNESS / 2;
    let horizontal = DIGIT_WIDTH - THICKNESS - 4;
    let vertical = DIGIT_HEIGHT / 2 - THICKNESS / 2 - 4;
    let left = x + half;
    let right = x + DIGIT_WIDTH - half;
    let center_x = x + DIGIT_WIDTH / 2;
    let upper = DIGIT_HEIGHT / 4 + 4;
    let lower = DIGIT_HEIGHT * 3 / 4 - 4;

    match bit {
        0 => bar(center_x, half, horizontal, true),
        1 => bar(right, upper, vertical, false),
        2 => bar(right, lower, vertical, false),
        3 => bar(center_x, DIGIT_HEIGHT - half, horizontal, true),
        4 => bar(left, lower, vertical, false),
        5 => bar(left, upper, vertical, false),
        _ => bar(center_x, DIGIT_HEIGHT / 2, horizontal, true),
    }
}

fn bar(cx: i32, cy: i32, length: i32, horizontal: bool) -> Polygon {
    let h = THICKNESS / 2;
    let l = length / 2;
    let points = if horizontal {
        vec![
            (cx - l, cy),
            (cx - l + h, cy - h),
            (cx + l - h, cy - h),
            (cx + l, cy),
            (cx + l - h, cy + h),
            (cx - l + h, cy + h),
        ]
    } else {
        vec![
            (cx, cy - l),
            (cx + h, cy - l + h),
            (cx + h, cy + l - h),
            (cx, cy + l),
            (cx - h, cy + l - h),
            (cx - h, cy - l + h),
        ]
    };
    Polygon { points }
}

fn square(cx: i32, cy: i32, size: i32) -> Polygon {
    let h = size / 2;
    Polygon {
        points: vec![(cx - h, cy - h), (cx + h, cy - h), (cx + h, cy + h), (cx - h, cy + h)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn segment<'a>(geometry: &'a ClockGeometry, class: &str) -> &'a Segment {
        geometry
            .segments()
            .find(|s| s.class_name == class)
            .unwrap_or_else(|| panic!("missing segment {class}"))
    }

    #[test]
    fn layout_has_six_digits_and_two_colons() {
        let geometry = build_clock_geometry();
        let ids: Vec<&str> = geometry.displays.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["h1", "h0", "c0", "m1", "m0", "c1", "s1", "s0"]);
        assert_eq!(geometry.segments().count(), 6 * 7 + 2 * 2);
    }

    #[test]
    fn class_names_are_unique() {
        let geometry = build_clock_geometry();
        let names: HashSet<&str> = geometry.segments().map(|s| s.class_name.as_str()).collect();
        assert_eq!(names.len(), geometry.segments().count());
    }

    #[test]
    fn every_period_divides_a_day() {
        for display in build_clock_geometry().displays {
            assert_eq!(86_400 % display.period_secs, 0, "{}", display.id);
        }
    }

    #[test]
    fn keyframes_come_in_pairs_inside_the_cycle() {
        for display in build_clock_geometry().displays {
            let cycle = display.period_secs * 1000;
            for seg in &display.segments {
                assert_eq!(seg.keyframes_ms.len() % 4, 0, "{}", seg.class_name);
                for pair in seg.keyframes_ms.chunks(2) {
                    assert_eq!(pair[1], pair[0] + 1, "{}", seg.class_name);
                    assert!(pair[1] <= cycle, "{}", seg.class_name);
                }
            }
        }
    }

    #[test]
    fn seconds_segment_a_switches_off_for_one_and_four() {
        let geometry = build_clock_geometry();
        let a = segment(&geometry, "s0a");
        // 0 lit, 1 dark, 2 lit, 4 dark, 5 lit
        assert_eq!(a.initial, INITIAL_ON);
        assert_eq!(a.keyframes_ms, vec![999, 1000, 1999, 2000, 3999, 4000, 4999, 5000]);
    }

    #[test]
    fn colon_blinks_every_half_second() {
        let geometry = build_clock_geometry();
        let dot = segment(&geometry, "c0u");
        assert_eq!(dot.initial, INITIAL_ON);
        assert_eq!(dot.keyframes_ms, vec![499, 500, 999, 1000]);
    }

    #[test]
    fn hour_tens_segment_b_never_changes() {
        // 0, 1 and 2 all light segment b
        let geometry = build_clock_geometry();
        let b = segment(&geometry, "h1b");
        assert!(b.keyframes_ms.is_empty());
        assert_eq!(b.initial, INITIAL_ON);
    }

    #[test]
    fn schedule_of_constant_dark_sequence_is_static_off() {
        assert_eq!(schedule(&[false, false, false], 1000), (INITIAL_OFF, vec![]));
    }
}
