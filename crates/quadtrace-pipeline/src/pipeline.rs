//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs the entire pipeline in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use quadtrace_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbaImage};
//! # fn run(image: RgbaImage) -> Result<(), PipelineError> {
//! let config = PipelineConfig::default();
//! let pipeline = Pipeline::new(image, config)
//!     .build_tree()?
//!     .resolve_adjacencies()?
//!     .extract_boundaries()
//!     .trace_chains()?
//!     .simplify()
//!     .fit()?;
//!
//! let vectorization = pipeline.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying all previously computed
//! intermediates. The caller can inspect the current stage's output via
//! accessor methods at any point.
//!
//! The source image is released once the quadtree is built; every later
//! stage only holds the tree and the data derived from it.

use rayon::prelude::*;

use crate::adjacency::{AdjacencyMap, Neighbor};
use crate::boundary::BoundarySegment;
use crate::color::{Color, ColorSource};
use crate::diagnostics::StageMetrics;
use crate::fit::FitOutcome;
use crate::graph::PointGraph;
use crate::quadtree::QuadTree;
use crate::simplify::simplify_chain;
use crate::trace::BoundaryPiece;
use crate::types::{Dimensions, FitConfig, PipelineConfig, PipelineError, Vectorization};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The color source and config are stored but not yet touched.
/// Call [`build_tree`](Self::build_tree) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .build_tree() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Box<dyn ColorSource + Send>,
}

impl Pending {
    /// The color source the tree will be built from.
    #[must_use]
    pub fn source(&self) -> &dyn ColorSource {
        &*self.source
    }

    /// The configuration this run uses.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the config, then partition the source into a region
    /// quadtree and advance to the [`TreeBuilt`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if a config parameter is
    /// out of range.
    pub fn build_tree(self) -> Result<TreeBuilt, PipelineError> {
        self.config.validate()?;
        let dimensions = self.source.dimensions();
        let tree = QuadTree::from_source(&*self.source, self.config.parallel);
        let stats = tree.stats();
        tracing::debug!(
            "tree: {}x{} -> {} leaves, {} subdivided, depth {}",
            dimensions.width,
            dimensions.height,
            stats.homogeneous,
            stats.heterogeneous,
            stats.depth
        );
        Ok(TreeBuilt {
            config: self.config,
            dimensions,
            tree,
        })
    }
}

// ───────────────────────── Stage 1: TreeBuilt ────────────────────────

/// Pipeline state after building the region quadtree.
///
/// Call [`resolve_adjacencies`](Self::resolve_adjacencies) to advance to
/// the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .resolve_adjacencies() to continue"]
pub struct TreeBuilt {
    config: PipelineConfig,
    dimensions: Dimensions,
    tree: QuadTree<Color>,
}

impl TreeBuilt {
    /// The region quadtree of the source colors.
    #[must_use]
    pub const fn tree(&self) -> &QuadTree<Color> {
        &self.tree
    }

    /// Source image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Resolve the four neighbors of every leaf and advance to the
    /// [`AdjacenciesResolved`] stage.
    ///
    /// With `config.validate` set the map is checked against the tree
    /// before continuing.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Adjacency`] if resolution or validation
    /// finds an inconsistency.
    pub fn resolve_adjacencies(self) -> Result<AdjacenciesResolved, PipelineError> {
        let adjacencies = crate::adjacency::resolve_adjacencies(&self.tree)?;
        if self.config.validate {
            crate::adjacency::validate_adjacencies(&self.tree, &adjacencies, self.dimensions)?;
        }
        Ok(AdjacenciesResolved {
            config: self.config,
            dimensions: self.dimensions,
            tree: self.tree,
            adjacencies,
        })
    }
}

// ───────────────────────── Stage 2: AdjacenciesResolved ──────────────

/// Pipeline state after resolving leaf adjacencies.
///
/// Call [`extract_boundaries`](Self::extract_boundaries) to advance to
/// the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .extract_boundaries() to continue"]
pub struct AdjacenciesResolved {
    config: PipelineConfig,
    dimensions: Dimensions,
    tree: QuadTree<Color>,
    adjacencies: AdjacencyMap<Color>,
}

impl AdjacenciesResolved {
    /// Neighbors of every homogeneous leaf.
    #[must_use]
    pub const fn adjacencies(&self) -> &AdjacencyMap<Color> {
        &self.adjacencies
    }

    /// The region quadtree of the source colors.
    #[must_use]
    pub const fn tree(&self) -> &QuadTree<Color> {
        &self.tree
    }

    /// Turn differently colored neighbor pairs into merged boundary
    /// segments and advance to the [`BoundariesExtracted`] stage.
    pub fn extract_boundaries(self) -> BoundariesExtracted {
        let segments = crate::boundary::extract_boundaries(&self.adjacencies);
        BoundariesExtracted {
            config: self.config,
            dimensions: self.dimensions,
            tree: self.tree,
            adjacencies: self.adjacencies,
            segments,
        }
    }
}

// ───────────────────────── Stage 3: BoundariesExtracted ──────────────

/// Pipeline state after extracting boundary segments.
///
/// Call [`trace_chains`](Self::trace_chains) to advance to the next
/// stage.
#[must_use = "pipeline stages are consumed by advancing — call .trace_chains() to continue"]
pub struct BoundariesExtracted {
    config: PipelineConfig,
    dimensions: Dimensions,
    tree: QuadTree<Color>,
    adjacencies: AdjacencyMap<Color>,
    segments: Vec<BoundarySegment>,
}

impl BoundariesExtracted {
    /// Merged boundary segments, horizontal groups first.
    #[must_use]
    pub fn segments(&self) -> &[BoundarySegment] {
        &self.segments
    }

    /// Build the boundary point graph, decompose it into chains, and
    /// advance to the [`ChainsTraced`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Graph`] if the segments overlap, the
    /// graph fails validation (with `config.validate` set), or a walk
    /// dead-ends.
    pub fn trace_chains(self) -> Result<ChainsTraced, PipelineError> {
        let graph = PointGraph::from_segments(&self.segments, self.config.subdivision_length)?;
        if self.config.validate {
            graph.validate()?;
        }
        let graph_stats = GraphStats {
            point_count: graph.point_count(),
            edge_count: graph.edge_count(),
            junction_count: graph.junctions().len(),
        };
        let pieces = crate::trace::trace_chains(graph)?;
        Ok(ChainsTraced {
            config: self.config,
            dimensions: self.dimensions,
            tree: self.tree,
            adjacencies: self.adjacencies,
            segments: self.segments,
            graph_stats,
            pieces,
        })
    }
}

/// Shape of the point graph before tracing consumed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GraphStats {
    point_count: usize,
    edge_count: usize,
    junction_count: usize,
}

// ───────────────────────── Stage 4: ChainsTraced ─────────────────────

/// Pipeline state after decomposing the point graph into chains.
///
/// Call [`simplify`](Self::simplify) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .simplify() to continue"]
pub struct ChainsTraced {
    config: PipelineConfig,
    dimensions: Dimensions,
    tree: QuadTree<Color>,
    adjacencies: AdjacencyMap<Color>,
    segments: Vec<BoundarySegment>,
    graph_stats: GraphStats,
    pieces: Vec<BoundaryPiece>,
}

impl ChainsTraced {
    /// Traced chains; neither simplified nor fit yet.
    #[must_use]
    pub fn pieces(&self) -> &[BoundaryPiece] {
        &self.pieces
    }

    /// Pick the critical points of every chain and advance to the
    /// [`Simplified`] stage.
    pub fn simplify(mut self) -> Simplified {
        let config = &self.config;
        if config.parallel {
            self.pieces
                .par_iter_mut()
                .for_each(|piece| simplify_piece(piece, config));
        } else {
            self.pieces
                .iter_mut()
                .for_each(|piece| simplify_piece(piece, config));
        }
        Simplified {
            config: self.config,
            dimensions: self.dimensions,
            tree: self.tree,
            adjacencies: self.adjacencies,
            segments: self.segments,
            pieces: self.pieces,
        }
    }
}

fn simplify_piece(piece: &mut BoundaryPiece, config: &PipelineConfig) {
    piece.simplified = simplify_chain(
        &config.simplifier,
        &piece.chain,
        piece.is_loop,
        config.simplify_tolerance,
        config.high_quality,
    );
}

// ───────────────────────── Stage 5: Simplified ───────────────────────

/// Pipeline state after simplifying every chain.
///
/// Call [`fit`](Self::fit) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .fit() to continue"]
pub struct Simplified {
    config: PipelineConfig,
    dimensions: Dimensions,
    tree: QuadTree<Color>,
    adjacencies: AdjacencyMap<Color>,
    segments: Vec<BoundarySegment>,
    pieces: Vec<BoundaryPiece>,
}

impl Simplified {
    /// Chains with their critical points filled in.
    #[must_use]
    pub fn pieces(&self) -> &[BoundaryPiece] {
        &self.pieces
    }

    /// Fit a tangent-continuous cubic spline to every chain and advance
    /// to the [`Fitted`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fit`] if a chain cannot be fit at all.
    /// Numerical fallbacks inside a fit are not errors; they are counted
    /// and reported by [`Fitted::totals`].
    pub fn fit(mut self) -> Result<Fitted, PipelineError> {
        let fit_config = &self.config.fit;
        let outcomes: Vec<FitOutcome> = if self.config.parallel {
            self.pieces
                .par_iter_mut()
                .map(|piece| fit_piece(piece, fit_config))
                .collect::<Result<_, _>>()?
        } else {
            self.pieces
                .iter_mut()
                .map(|piece| fit_piece(piece, fit_config))
                .collect::<Result<_, _>>()?
        };

        let totals = FitTotals::from_outcomes(&outcomes);
        tracing::debug!(
            "fit: {} chains, {} curves, {} converged, total error {:.3}",
            outcomes.len(),
            totals.curve_count,
            totals.converged_count,
            totals.total_error
        );
        if totals.fallbacks > 0 {
            tracing::warn!(
                "fit: {} numerical fallbacks across {} chains",
                totals.fallbacks,
                outcomes.len()
            );
        }

        Ok(Fitted {
            config: self.config,
            dimensions: self.dimensions,
            tree: self.tree,
            adjacencies: self.adjacencies,
            segments: self.segments,
            pieces: self.pieces,
            totals,
        })
    }
}

fn fit_piece(piece: &mut BoundaryPiece, config: &FitConfig) -> Result<FitOutcome, PipelineError> {
    let outcome = crate::fit::fit_piecewise(&piece.chain, &piece.simplified, config)?;
    tracing::trace!(
        "fit: chain of {} points, {} sections, {} iterations, error {:.3}",
        piece.chain.len(),
        outcome.curves.len(),
        outcome.iterations,
        outcome.error
    );
    piece.curves.clone_from(&outcome.curves);
    Ok(outcome)
}

/// Fit results summed over every chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitTotals {
    /// Cubic curves across all chains.
    pub curve_count: usize,
    /// Outer iterations across all chains.
    pub iterations: usize,
    /// Summed final squared error across all chains.
    pub total_error: f64,
    /// Chains whose error fell below the acceptable threshold.
    pub converged_count: usize,
    /// Sub-solves that kept a previous value.
    pub fallbacks: usize,
}

impl FitTotals {
    fn from_outcomes(outcomes: &[FitOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |acc, o| Self {
            curve_count: acc.curve_count + o.curves.len(),
            iterations: acc.iterations + o.iterations,
            total_error: acc.total_error + o.error,
            converged_count: acc.converged_count + usize::from(o.converged),
            fallbacks: acc.fallbacks + o.fallbacks,
        })
    }
}

// ───────────────────────── Stage 6: Fitted ───────────────────────────

/// Pipeline state after curve fitting (final stage).
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`Vectorization`] containing all intermediates.
#[must_use = "call .into_result() to extract the Vectorization"]
pub struct Fitted {
    config: PipelineConfig,
    dimensions: Dimensions,
    tree: QuadTree<Color>,
    adjacencies: AdjacencyMap<Color>,
    segments: Vec<BoundarySegment>,
    pieces: Vec<BoundaryPiece>,
    totals: FitTotals,
}

impl Fitted {
    /// Chains with critical points and fitted curves.
    #[must_use]
    pub fn pieces(&self) -> &[BoundaryPiece] {
        &self.pieces
    }

    /// Fit results summed over every chain.
    #[must_use]
    pub const fn totals(&self) -> FitTotals {
        self.totals
    }

    /// Source image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The configuration this run used.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Consume the pipeline and return the full [`Vectorization`].
    #[must_use]
    pub fn into_result(self) -> Vectorization {
        Vectorization {
            dimensions: self.dimensions,
            tree: self.tree,
            adjacencies: self.adjacencies,
            segments: self.segments,
            pieces: self.pieces,
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 7;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
/// Use this with [`PipelineStage::output`] or [`Stage::output`] to
/// inspect intermediates in a uniform, type-erased way.
#[must_use]
pub enum StageOutput<'a> {
    /// The color source (not yet sampled).
    Source {
        /// Source dimensions.
        dimensions: Dimensions,
    },
    /// Region quadtree.
    TreeBuilt {
        /// The tree.
        tree: &'a QuadTree<Color>,
    },
    /// Leaf adjacency side-table.
    AdjacenciesResolved {
        /// Neighbors of every leaf.
        adjacencies: &'a AdjacencyMap<Color>,
    },
    /// Merged boundary segments.
    BoundariesExtracted {
        /// The segments.
        segments: &'a [BoundarySegment],
    },
    /// Traced chains.
    ChainsTraced {
        /// The chains.
        pieces: &'a [BoundaryPiece],
    },
    /// Chains with critical points.
    Simplified {
        /// The chains.
        pieces: &'a [BoundaryPiece],
    },
    /// Chains with fitted curves.
    Fitted {
        /// The chains.
        pieces: &'a [BoundaryPiece],
        /// Image dimensions.
        dimensions: Dimensions,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Both the typed API (individual stage structs) and the dynamic API
/// ([`Stage`] enum) are available. This trait bridges the two: each
/// stage struct implements it, and [`Stage`] delegates to whichever
/// variant it holds.
///
/// # Loop pattern
///
/// ```rust
/// # use quadtrace_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbaImage};
/// # use quadtrace_pipeline::pipeline::{Stage, PipelineStage, Advance};
/// # fn run(image: RgbaImage) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(image, PipelineConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"source"`, `"fit"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `6` for
    /// Fitted).
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics for diagnostics.
    ///
    /// The initial [`Pending`] stage reports the source dimensions; every
    /// other stage describes the work done to reach it.
    fn metrics(&self) -> StageMetrics;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at
    /// the final stage, or `Err` if the stage transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the config is invalid, a
    /// consistency check fails, or a chain cannot be fit.
    fn next(self) -> Result<Option<Stage>, PipelineError>;

    /// Run all remaining stages to completion and return the final
    /// [`Vectorization`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    fn complete(self) -> Result<Vectorization, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            dimensions: self.source.dimensions(),
        }
    }

    fn metrics(&self) -> StageMetrics {
        let dimensions = self.source.dimensions();
        StageMetrics::Source {
            width: dimensions.width,
            height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
        }
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::TreeBuilt(self.build_tree()?)))
    }

    fn complete(self) -> Result<Vectorization, PipelineError> {
        self.build_tree()?.complete()
    }
}

impl PipelineStage for TreeBuilt {
    const NAME: &str = "tree";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::TreeBuilt { tree: &self.tree }
    }

    fn metrics(&self) -> StageMetrics {
        let stats = self.tree.stats();
        StageMetrics::Tree {
            homogeneous: stats.homogeneous,
            heterogeneous: stats.heterogeneous,
            degenerate: stats.degenerate,
            depth: stats.depth,
        }
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::AdjacenciesResolved(self.resolve_adjacencies()?)))
    }

    fn complete(self) -> Result<Vectorization, PipelineError> {
        self.resolve_adjacencies()?.complete()
    }
}

impl PipelineStage for AdjacenciesResolved {
    const NAME: &str = "adjacency";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::AdjacenciesResolved {
            adjacencies: &self.adjacencies,
        }
    }

    fn metrics(&self) -> StageMetrics {
        let (mut leaf_sides, mut subdivided_sides, mut border_sides) = (0, 0, 0);
        for entry in self.adjacencies.values() {
            for (_, neighbor) in entry.neighbors.iter() {
                match neighbor {
                    Neighbor::Border => border_sides += 1,
                    Neighbor::Leaf { .. } => leaf_sides += 1,
                    Neighbor::Subdivided { .. } => subdivided_sides += 1,
                }
            }
        }
        StageMetrics::Adjacency {
            leaf_count: self.adjacencies.len(),
            leaf_sides,
            subdivided_sides,
            border_sides,
            validated: self.config.validate,
        }
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::BoundariesExtracted(self.extract_boundaries())))
    }

    fn complete(self) -> Result<Vectorization, PipelineError> {
        self.extract_boundaries().complete()
    }
}

impl PipelineStage for BoundariesExtracted {
    const NAME: &str = "boundaries";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::BoundariesExtracted {
            segments: &self.segments,
        }
    }

    fn metrics(&self) -> StageMetrics {
        let (mut horizontal, mut vertical) = (0, 0);
        let mut total_length = 0;
        for s in &self.segments {
            match s.segment.orientation() {
                crate::boundary::Orientation::Horizontal => horizontal += 1,
                crate::boundary::Orientation::Vertical => vertical += 1,
            }
            total_length += u64::from(s.segment.length());
        }
        StageMetrics::Boundaries {
            segment_count: self.segments.len(),
            horizontal_count: horizontal,
            vertical_count: vertical,
            total_length,
        }
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::ChainsTraced(self.trace_chains()?)))
    }

    fn complete(self) -> Result<Vectorization, PipelineError> {
        self.trace_chains()?.complete()
    }
}

impl PipelineStage for ChainsTraced {
    const NAME: &str = "trace";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::ChainsTraced {
            pieces: &self.pieces,
        }
    }

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Trace {
            point_count: self.graph_stats.point_count,
            edge_count: self.graph_stats.edge_count,
            junction_count: self.graph_stats.junction_count,
            chain_count: self.pieces.len(),
            loop_count: self.pieces.iter().filter(|p| p.is_loop).count(),
        }
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Simplified(self.simplify())))
    }

    fn complete(self) -> Result<Vectorization, PipelineError> {
        self.simplify().complete()
    }
}

impl PipelineStage for Simplified {
    const NAME: &str = "simplify";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Simplified {
            pieces: &self.pieces,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn metrics(&self) -> StageMetrics {
        let points_before: usize = self.pieces.iter().map(|p| p.chain.len()).sum();
        let points_after: usize = self.pieces.iter().map(|p| p.simplified.len()).sum();
        let reduction_ratio = if points_before > 0 {
            1.0 - (points_after as f64 / points_before as f64)
        } else {
            0.0
        };
        StageMetrics::Simplification {
            tolerance: self.config.simplify_tolerance,
            high_quality: self.config.high_quality,
            points_before,
            points_after,
            reduction_ratio,
        }
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Fitted(self.fit()?)))
    }

    fn complete(self) -> Result<Vectorization, PipelineError> {
        self.fit()?.complete()
    }
}

impl PipelineStage for Fitted {
    const NAME: &str = "fit";
    const INDEX: usize = 6;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Fitted {
            pieces: &self.pieces,
            dimensions: self.dimensions,
        }
    }

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Fit {
            chain_count: self.pieces.len(),
            curve_count: self.totals.curve_count,
            iterations: self.totals.iterations,
            total_error: self.totals.total_error,
            converged_count: self.totals.converged_count,
            fallbacks: self.totals.fallbacks,
        }
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(None)
    }

    fn complete(self) -> Result<Vectorization, PipelineError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping all pipeline stages for uniform, loopable access.
///
/// Use [`From`] conversions to enter the dynamic API from any typed
/// stage, then call [`advance`](Self::advance) in a loop:
///
/// ```rust
/// # use quadtrace_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbaImage};
/// # use quadtrace_pipeline::pipeline::{Stage, Advance, STAGE_COUNT};
/// # fn run(image: RgbaImage) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(image, PipelineConfig::default()).into();
/// while !stage.is_complete() {
///     assert!(stage.index() < STAGE_COUNT);
///     match stage.advance()? {
///         Advance::Next(next) | Advance::Complete(next) => stage = next,
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`TreeBuilt`].
    TreeBuilt(TreeBuilt),
    /// See [`AdjacenciesResolved`].
    AdjacenciesResolved(AdjacenciesResolved),
    /// See [`BoundariesExtracted`].
    BoundariesExtracted(BoundariesExtracted),
    /// See [`ChainsTraced`].
    ChainsTraced(ChainsTraced),
    /// See [`Simplified`].
    Simplified(Simplified),
    /// See [`Fitted`].
    Fitted(Fitted),
}

/// Compile-time guard: if a [`Stage`] variant is added, this match becomes
/// non-exhaustive and the build fails — reminding you to bump [`STAGE_COUNT`].
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::TreeBuilt(_)
        | Stage::AdjacenciesResolved(_)
        | Stage::BoundariesExtracted(_)
        | Stage::ChainsTraced(_)
        | Stage::Simplified(_)
        | Stage::Fitted(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage — returned unchanged.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::TreeBuilt(s) => s.$method($($arg),*),
            Self::AdjacenciesResolved(s) => s.$method($($arg),*),
            Self::BoundariesExtracted(s) => s.$method($($arg),*),
            Self::ChainsTraced(s) => s.$method($($arg),*),
            Self::Simplified(s) => s.$method($($arg),*),
            Self::Fitted(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Fitted(_))
    }

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(next_stage))` on success, `Ok(None)` if
    /// already complete (the `Fitted` value is consumed), or `Err` if
    /// the transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn next(self) -> Result<Option<Self>, PipelineError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if
    /// already complete.
    ///
    /// This is the loop-friendly version of [`next`](Self::next).
    /// Unlike `next()`, which consumes the final stage and returns
    /// `Ok(None)`, `advance()` returns [`Advance::Complete`] with
    /// the final stage so you can still call
    /// [`complete`](Self::complete) on it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn advance(self) -> Result<Advance, PipelineError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        // Non-complete stages always return Ok(Some(_)) from next().
        #[allow(clippy::unreachable)]
        let next = self
            .next()?
            .unwrap_or_else(|| unreachable!("non-complete stage returned None from next()"));
        Ok(Advance::Next(next))
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    pub fn complete(self) -> Result<Vectorization, PipelineError> {
        delegate!(self, complete)
    }
}

// The trait's associated constants aren't callable as `self.NAME`, so
// the macro goes through this helper.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<TreeBuilt> for Stage {
    fn from(s: TreeBuilt) -> Self {
        Self::TreeBuilt(s)
    }
}

impl From<AdjacenciesResolved> for Stage {
    fn from(s: AdjacenciesResolved) -> Self {
        Self::AdjacenciesResolved(s)
    }
}

impl From<BoundariesExtracted> for Stage {
    fn from(s: BoundariesExtracted) -> Self {
        Self::BoundariesExtracted(s)
    }
}

impl From<ChainsTraced> for Stage {
    fn from(s: ChainsTraced) -> Self {
        Self::ChainsTraced(s)
    }
}

impl From<Simplified> for Stage {
    fn from(s: Simplified) -> Self {
        Self::Simplified(s)
    }
}

impl From<Fitted> for Stage {
    fn from(s: Fitted) -> Self {
        Self::Fitted(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental vectorization pipeline.
///
/// Created via [`Pipeline::new`], which stores the color source and
/// config without doing any processing. The caller then chains stage
/// methods to advance through the pipeline:
///
/// ```rust
/// # use quadtrace_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbaImage};
/// # fn run(image: RgbaImage) -> Result<(), PipelineError> {
/// let result = Pipeline::new(image, PipelineConfig::default())
///     .build_tree()?
///     .resolve_adjacencies()?
///     .extract_boundaries()
///     .trace_chains()?
///     .simplify()
///     .fit()?
///     .into_result();
/// # Ok(())
/// # }
/// ```
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from a color source and config.
    ///
    /// No processing is performed, and the config is not checked until
    /// [`.build_tree()`](Pending::build_tree).
    #[allow(clippy::new_ret_no_self)]
    pub fn new(source: impl ColorSource + Send + 'static, config: PipelineConfig) -> Pending {
        Pending {
            config,
            source: Box::new(source),
        }
    }
}
