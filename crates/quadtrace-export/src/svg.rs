//! SVG preview serializer.
//!
//! Renders a [`Vectorization`] into an SVG string using the [`svg`] crate
//! for document construction and XML escaping. Each pipeline stage that
//! produces geometry can be drawn as its own `<g>` layer:
//!
//! - `regions`: every homogeneous quadtree leaf as a filled `<rect>`
//! - `chains`: traced boundary chains as `M`/`L` paths
//! - `simplified`: the critical points kept by simplification
//! - `curves`: the fitted cubic splines as `M`/`C` paths
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use svg::Document;
use svg::node::Text;
use svg::node::element::{Description, Group, Path, Rectangle, Title};

use quadtrace_pipeline::{CubicBezier, GridPoint, Vectorization};

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the pipeline parameters used for the run.
    pub description: Option<&'a str>,
}

/// Which layers to draw. Layers are emitted bottom to top in field
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SvgLayers {
    /// Homogeneous leaves filled with their color.
    pub regions: bool,
    /// Raw traced chains.
    pub chains: bool,
    /// Simplified chains.
    pub simplified: bool,
    /// Fitted cubic curves.
    pub curves: bool,
}

impl SvgLayers {
    /// Every layer.
    pub const ALL: Self = Self {
        regions: true,
        chains: true,
        simplified: true,
        curves: true,
    };
}

impl Default for SvgLayers {
    /// Filled regions under the fitted curves.
    fn default() -> Self {
        Self {
            regions: true,
            chains: false,
            simplified: false,
            curves: true,
        }
    }
}

/// Build an SVG path `d` attribute string for a lattice polyline.
///
/// Uses `M` for the first point and `L` for subsequent points. Returns
/// `None` for polylines with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use quadtrace_pipeline::GridPoint;
/// use quadtrace_export::build_polyline_data;
///
/// let d = build_polyline_data(&[GridPoint::new(1, 2), GridPoint::new(3, 2)]);
/// assert_eq!(d.as_deref(), Some("M1 2 L3 2"));
/// ```
#[must_use]
pub fn build_polyline_data(points: &[GridPoint]) -> Option<String> {
    if points.len() < 2 {
        return None;
    }
    Some(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let cmd = if i == 0 { "M" } else { "L" };
                format!("{cmd}{} {}", p.x, p.y)
            })
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Build an SVG path `d` attribute string for a run of joined cubics.
///
/// Emits one `M` for the first curve's start and one `C` per curve.
/// Coordinates are formatted to 2 decimal places. Returns `None` for an
/// empty slice.
#[must_use]
pub fn build_curve_data(curves: &[CubicBezier]) -> Option<String> {
    let first = curves.first()?;
    let mut d = format!("M{:.2} {:.2}", first.p0.x, first.p0.y);
    for c in curves {
        let _ = write!(
            d,
            " C{:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
            c.p1.x, c.p1.y, c.p2.x, c.p2.y, c.p3.x, c.p3.y
        );
    }
    Some(d)
}

fn stroke_path(d: String, color: &str, width: f64) -> Path {
    Path::new()
        .set("d", d)
        .set("fill", "none")
        .set("stroke", color)
        .set("stroke-width", width)
        .set("stroke-linejoin", "round")
}

/// Serialize a vectorization into an SVG preview document.
///
/// The `viewBox` matches the source image in pixels, so boundary
/// coordinates land on pixel edges.
#[must_use]
pub fn to_svg(result: &Vectorization, metadata: &SvgMetadata<'_>, layers: SvgLayers) -> String {
    let w = result.dimensions.width;
    let h = result.dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if layers.regions {
        let mut group = Group::new().set("id", "regions").set("shape-rendering", "crispEdges");
        for (region, color) in result.tree.leaves() {
            group = group.add(
                Rectangle::new()
                    .set("x", region.x)
                    .set("y", region.y)
                    .set("width", region.width)
                    .set("height", region.height)
                    .set("fill", color.to_string()),
            );
        }
        doc = doc.add(group);
    }

    if layers.chains {
        let mut group = Group::new().set("id", "chains");
        for piece in &result.pieces {
            if let Some(d) = build_polyline_data(&piece.chain) {
                group = group.add(stroke_path(d, "#888888", 0.5));
            }
        }
        doc = doc.add(group);
    }

    if layers.simplified {
        let mut group = Group::new().set("id", "simplified");
        for piece in &result.pieces {
            if let Some(d) = build_polyline_data(&piece.simplified) {
                group = group.add(stroke_path(d, "#1f6fd1", 0.5).set("stroke-dasharray", "1 1"));
            }
        }
        doc = doc.add(group);
    }

    if layers.curves {
        let mut group = Group::new().set("id", "curves");
        for piece in &result.pieces {
            if let Some(d) = build_curve_data(&piece.curves) {
                group = group.add(stroke_path(d, "black", 1.0));
            }
        }
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quadtrace_pipeline::{Color, ColorGrid, PipelineConfig, Point, process};

    use super::*;

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    fn blank(width: u32, height: u32) -> Vectorization {
        process(ColorGrid::filled(width, height, Color::WHITE), &PipelineConfig::default()).unwrap()
    }

    /// Black square in the middle of a white field.
    fn square() -> Vectorization {
        let grid = ColorGrid::from_fn(16, 16, |x, y| {
            if (4..12).contains(&x) && (4..12).contains(&y) {
                Color::BLACK
            } else {
                Color::WHITE
            }
        });
        process(grid, &PipelineConfig::default()).unwrap()
    }

    // --- Path data ---

    #[test]
    fn polyline_data_single_point_is_none() {
        assert_eq!(build_polyline_data(&[GridPoint::new(1, 1)]), None);
        assert_eq!(build_polyline_data(&[]), None);
    }

    #[test]
    fn polyline_data_uses_move_then_lines() {
        let d = build_polyline_data(&[
            GridPoint::new(0, 0),
            GridPoint::new(4, 0),
            GridPoint::new(4, 3),
        ]);
        assert_eq!(d.as_deref(), Some("M0 0 L4 0 L4 3"));
    }

    #[test]
    fn curve_data_emits_one_cubic_per_curve() {
        let a = CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(3.0, 1.0),
        );
        let b = CubicBezier::new(
            Point::new(3.0, 1.0),
            Point::new(4.0, 1.0),
            Point::new(5.5, 0.25),
            Point::new(6.0, 0.0),
        );
        let d = build_curve_data(&[a, b]).unwrap();
        assert!(d.starts_with("M0.00 0.00 C1.00 0.00 2.00 1.00 3.00 1.00"));
        assert!(d.ends_with("C4.00 1.00 5.50 0.25 6.00 0.00"));
        assert_eq!(d.matches('C').count(), 2);
        assert_eq!(build_curve_data(&[]), None);
    }

    // --- Document structure ---

    #[test]
    fn viewbox_reflects_dimensions() {
        let svg = to_svg(&blank(64, 48), &no_meta(), SvgLayers::default());
        assert!(svg.contains(r#"width="64""#));
        assert!(svg.contains(r#"height="48""#));
        assert!(svg.contains(r#"viewBox="0 0 64 48""#));
    }

    #[test]
    fn svg_has_xml_declaration_and_namespace() {
        let svg = to_svg(&blank(4, 4), &no_meta(), SvgLayers::default());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn uniform_image_is_one_rect_and_no_paths() {
        let svg = to_svg(&blank(8, 8), &no_meta(), SvgLayers::ALL);
        assert_eq!(svg.matches("<rect").count(), 1);
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn layers_are_emitted_in_order() {
        let svg = to_svg(&square(), &no_meta(), SvgLayers::ALL);
        let positions: Vec<usize> = ["regions", "chains", "simplified", "curves"]
            .iter()
            .map(|id| svg.find(&format!(r#"id="{id}""#)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn disabled_layers_are_omitted() {
        let layers = SvgLayers {
            regions: false,
            chains: false,
            simplified: false,
            curves: true,
        };
        let svg = to_svg(&square(), &no_meta(), layers);
        assert!(!svg.contains("<rect"));
        assert!(!svg.contains(r#"id="chains""#));
        assert!(svg.contains(r#"id="curves""#));
        assert_eq!(svg.matches("<path").count(), 1);
    }

    // --- Metadata ---

    #[test]
    fn title_and_desc_emitted_when_present() {
        let meta = SvgMetadata {
            title: Some("square"),
            description: Some("tolerance=1.0"),
        };
        let svg = to_svg(&blank(4, 4), &meta, SvgLayers::default());
        assert!(svg.contains("<title>square</title>"));
        assert!(svg.contains("<desc>tolerance=1.0</desc>"));
    }

    #[test]
    fn title_and_desc_omitted_when_none() {
        let svg = to_svg(&blank(4, 4), &no_meta(), SvgLayers::default());
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<desc>"));
    }

    #[test]
    fn special_characters_in_title_are_escaped() {
        let meta = SvgMetadata {
            title: Some("a<b & c>d"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&blank(4, 4), &meta, SvgLayers::default());
        assert!(svg.contains("a&lt;b &amp; c&gt;d"));
        assert!(!svg.contains("a<b & c>d"));
    }

    #[test]
    fn title_appears_before_layers() {
        let meta = SvgMetadata {
            title: Some("first"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&square(), &meta, SvgLayers::default());
        assert!(svg.find("<title>").unwrap() < svg.find("<g").unwrap());
    }
}
