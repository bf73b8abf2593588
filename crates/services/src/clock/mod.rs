//! Rendering pipeline: path -> instant -> keyframes -> SVG.

pub mod compose;
pub mod geometry;
pub mod keyframes;
pub mod route;
pub mod timezone;

pub use compose::ImageComposer;
pub use geometry::build_clock_geometry;
pub use keyframes::{render_style, synthesize};
pub use route::{parse_selector, Selector};
pub use timezone::TimezoneResolver;
