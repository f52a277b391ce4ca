//! quadtrace-pipeline: Pure raster-to-vector pipeline (sans-IO).
//!
//! Partitions an image into uniform-color regions and fits smooth
//! boundaries between them through:
//! region quadtree -> leaf adjacencies -> boundary segments ->
//! chain tracing -> simplification -> piecewise Bezier fitting.
//!
//! This crate has **no I/O dependencies** -- it samples colors through
//! the [`ColorSource`] trait and returns structured data. Decoding files
//! and writing output live in the callers.

pub mod adjacency;
pub mod boundary;
pub mod color;
pub mod decode;
pub mod diagnostics;
pub mod fit;
pub mod graph;
pub mod pipeline;
pub mod position;
pub mod quadtree;
pub mod region;
pub mod simplify;
pub mod trace;
pub mod types;

pub use color::{Color, ColorGrid, ColorSource};
pub use fit::{CubicBezier, FitOutcome};
pub use pipeline::Pipeline;
pub use simplify::{Simplifier, SimplifierKind};
pub use trace::BoundaryPiece;
pub use types::{
    Dimensions, FitConfig, GridPoint, PipelineConfig, PipelineError, Point, RgbaImage,
    Vectorization,
};

/// Run the full vectorization pipeline.
///
/// Takes any color source and a configuration, then produces a
/// [`Vectorization`] holding every intermediate: the region quadtree,
/// the adjacency side-table, boundary segments, and the traced chains
/// with their critical points and fitted curves.
///
/// # Pipeline steps
///
/// 1. Validate the config and build the region quadtree
/// 2. Resolve the four neighbors of every leaf
/// 3. Extract and merge boundary segments between differently colored leaves
/// 4. Build the point graph and trace it into chains and loops
/// 5. Simplify every chain to its critical points
/// 6. Fit a tangent-continuous cubic spline to every chain
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for out-of-range parameters.
/// Returns [`PipelineError::Adjacency`] or [`PipelineError::Graph`] if an
/// internal consistency check fails, and [`PipelineError::Fit`] if a
/// chain cannot be fit at all.
pub fn process(
    source: impl ColorSource + Send + 'static,
    config: &PipelineConfig,
) -> Result<Vectorization, PipelineError> {
    Pipeline::new(source, config.clone())
        .build_tree()?
        .resolve_adjacencies()?
        .extract_boundaries()
        .trace_chains()?
        .simplify()
        .fit()
        .map(pipeline::Fitted::into_result)
}
