//! # Image Composer
//!
//! Fills the fixed SVG template with the synthesized style block and, when
//! asked for, a decorative hyperlink. The link target is request-derived, so it
//! goes through askama's HTML escaper (`& < > " '`); the style block is
//! generated here and inserted verbatim.

use askama::Template;
use domains::ClockGeometry;

pub struct ShapeView {
    pub class_name: String,
    pub points: String,
}

#[derive(Template)]
#[template(path = "clock.svg", escape = "html")]
struct ClockTemplate<'a> {
    view_box: &'a str,
    min_x: i32,
    min_y: i32,
    width: i32,
    height: i32,
    style: &'a str,
    shapes: &'a [ShapeView],
    link: Option<&'a str>,
}

/// Pre-renders everything about the document that never changes.
pub struct ImageComposer {
    view_box: String,
    bounds: (i32, i32, i32, i32),
    shapes: Vec<ShapeView>,
}

impl ImageComposer {
    pub fn new(geometry: &ClockGeometry) -> Self {
        let (min_x, min_y, width, height) = geometry.view_box;
        let shapes = geometry
            .segments()
            .map(|seg| ShapeView {
                class_name: seg.class_name.clone(),
                points: seg.shape.to_points_attr(),
            })
            .collect();

        Self {
            view_box: format!("{min_x} {min_y} {width} {height}"),
            bounds: geometry.view_box,
            shapes,
        }
    }

    /// Produces the complete SVG document.
    pub fn compose(&self, style: &str, link: Option<&str>) -> Result<String, askama::Error> {
        let (min_x, min_y, width, height) = self.bounds;
        ClockTemplate {
            view_box: &self.view_box,
            min_x,
            min_y,
            width,
            height,
            style,
            shapes: &self.shapes,
            link,
        }
        .render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::geometry::build_clock_geometry;

    #[test]
    fn document_without_link_has_no_anchor() {
        let composer = ImageComposer::new(&build_clock_geometry());
        let svg = composer.compose(".x { opacity: 1 }\n", None).unwrap();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(".x { opacity: 1 }"));
        assert!(svg.contains("class=\"s0a\""));
        assert!(!svg.contains("<a "));
    }

    #[test]
    fn link_target_is_escaped() {
        let composer = ImageComposer::new(&build_clock_geometry());
        let svg = composer
            .compose("", Some("https://e.test/?a=1&b=\"><script>x</script>"))
            .unwrap();
        let start = svg.find("<a href=\"").unwrap() + "<a href=\"".len();
        let href = &svg[start..start + svg[start..].find('"').unwrap()];
        assert!(href.starts_with("https://e.test/?a=1&#"));
        assert!(!href.contains(['<', '>']));
        assert_eq!(href.matches('&').count(), href.matches("&#").count());
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn every_segment_gets_a_polygon() {
        let geometry = build_clock_geometry();
        let svg = ImageComposer::new(&geometry).compose("", None).unwrap();
        assert_eq!(svg.matches("<polygon ").count(), geometry.segments().count());
    }
}
