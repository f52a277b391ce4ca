//! quadtrace-export: Pure format serializers (sans-IO)
//!
//! Renders a [`Vectorization`](quadtrace_pipeline::Vectorization) as an
//! SVG preview for inspecting each stage's output.

pub mod svg;

pub use svg::{SvgLayers, SvgMetadata, build_curve_data, build_polyline_data, to_svg};
