//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! algorithm tuning and parameter experimentation.
//! [`process_with_diagnostics`] runs the full pipeline and collects
//! them alongside the result.
//!
//! Time is read through an injected [`Clock`]. [`SystemClock`] captures
//! timestamps via the `web-time` crate, which uses `performance.now()`
//! on WASM and `std::time::Instant` on native. Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::ColorSource;
use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{PipelineConfig, PipelineError, Vectorization};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// An opaque point in time.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time passed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Wall clock backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
///
/// Each field captures metrics for one stage transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: region quadtree construction.
    pub tree: StageDiagnostics,
    /// Stage 2: adjacency resolution (and validation, when enabled).
    pub adjacency: StageDiagnostics,
    /// Stage 3: boundary segment extraction and consolidation.
    pub boundaries: StageDiagnostics,
    /// Stage 4: point graph construction and chain tracing.
    pub trace: StageDiagnostics,
    /// Stage 5: chain simplification.
    pub simplification: StageDiagnostics,
    /// Stage 6: Bezier fitting.
    pub fit: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// The color source before any processing.
    Source {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Quadtree node counts.
    Tree {
        /// Uniform-color leaves.
        homogeneous: usize,
        /// Subdivided nodes.
        heterogeneous: usize,
        /// Zero-area placeholders.
        degenerate: usize,
        /// Depth of the deepest node.
        depth: usize,
    },
    /// Adjacency side-table counts.
    Adjacency {
        /// Leaves in the side-table.
        leaf_count: usize,
        /// Sides whose neighbor is a single leaf.
        leaf_sides: usize,
        /// Sides facing a subdivided region.
        subdivided_sides: usize,
        /// Sides on the image border.
        border_sides: usize,
        /// Whether the map was checked against the tree.
        validated: bool,
    },
    /// Boundary segment counts.
    Boundaries {
        /// Segments after consolidation.
        segment_count: usize,
        /// Horizontal segments.
        horizontal_count: usize,
        /// Vertical segments.
        vertical_count: usize,
        /// Summed segment length in pixels.
        total_length: u64,
    },
    /// Point graph and tracing counts.
    Trace {
        /// Graph vertices.
        point_count: usize,
        /// Graph edges.
        edge_count: usize,
        /// Vertices whose degree is not two.
        junction_count: usize,
        /// Chains traced, loops included.
        chain_count: usize,
        /// Chains that end where they start.
        loop_count: usize,
    },
    /// Chain simplification metrics.
    Simplification {
        /// Tolerance in pixels.
        tolerance: f64,
        /// Whether the radial pre-pass was skipped.
        high_quality: bool,
        /// Total points before simplification.
        points_before: usize,
        /// Total points after simplification.
        points_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Bezier fitting metrics.
    Fit {
        /// Chains fit.
        chain_count: usize,
        /// Cubic curves produced.
        curve_count: usize,
        /// Outer iterations across all chains.
        iterations: usize,
        /// Summed final squared error.
        total_error: f64,
        /// Chains that reached the acceptable error.
        converged_count: usize,
        /// Numerical sub-solves that kept a previous value.
        fallbacks: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Uniform-color regions found.
    pub region_count: usize,
    /// Boundary chains traced.
    pub chain_count: usize,
    /// Cubic curves in the output.
    pub curve_count: usize,
}

impl PipelineDiagnostics {
    /// The stages in pipeline order, paired with display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 6] {
        [
            ("Quadtree", &self.tree),
            ("Adjacency", &self.adjacency),
            ("Boundaries", &self.boundaries),
            ("Trace", &self.trace),
            ("Simplification", &self.simplification),
            ("Fit", &self.fit),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        // Per-stage breakdown.
        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Regions: {}  |  Chains: {}  |  Curves: {}",
            self.summary.region_count, self.summary.chain_count, self.summary.curve_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Source { width, height, .. } => format!("{width}x{height}"),
        StageMetrics::Tree {
            homogeneous,
            heterogeneous,
            degenerate,
            depth,
        } => {
            format!(
                "{homogeneous} leaves, {heterogeneous} subdivided, {degenerate} degenerate, depth {depth}"
            )
        }
        StageMetrics::Adjacency {
            leaf_count,
            leaf_sides,
            subdivided_sides,
            border_sides,
            validated,
        } => {
            let check = if *validated { " (validated)" } else { "" };
            format!(
                "{leaf_count} leaves, sides: {leaf_sides} leaf / {subdivided_sides} subdivided / {border_sides} border{check}"
            )
        }
        StageMetrics::Boundaries {
            segment_count,
            horizontal_count,
            vertical_count,
            total_length,
        } => {
            format!(
                "{segment_count} segments ({horizontal_count} h, {vertical_count} v), {total_length}px"
            )
        }
        StageMetrics::Trace {
            point_count,
            edge_count,
            junction_count,
            chain_count,
            loop_count,
        } => {
            format!(
                "{point_count} pts, {edge_count} edges, {junction_count} junctions -> {chain_count} chains ({loop_count} loops)"
            )
        }
        StageMetrics::Simplification {
            tolerance,
            points_before,
            points_after,
            reduction_ratio,
            ..
        } => {
            format!(
                "tol={tolerance:.2} {points_before}->{points_after} pts ({:.1}% reduction)",
                reduction_ratio * 100.0,
            )
        }
        StageMetrics::Fit {
            curve_count,
            iterations,
            total_error,
            converged_count,
            chain_count,
            fallbacks,
        } => {
            format!(
                "{curve_count} curves, {converged_count}/{chain_count} converged, {iterations} iters, err={total_error:.2}, {fallbacks} fallbacks"
            )
        }
    }
}

/// Run `advance`, timing it, and record the metrics of the stage it
/// produced.
fn measure<C: Clock, S: PipelineStage>(
    clock: &C,
    advance: impl FnOnce() -> Result<S, PipelineError>,
) -> Result<(S, StageDiagnostics), PipelineError> {
    let started = clock.now();
    let stage = advance()?;
    let duration = clock.elapsed(&started);
    let metrics = stage.metrics();
    Ok((stage, StageDiagnostics { duration, metrics }))
}

/// Run the full pipeline, timing every stage with `clock`.
///
/// Produces the same [`Vectorization`] as [`crate::process`]. The total
/// duration is measured around the whole run, so it also covers metric
/// collection between stages.
///
/// # Errors
///
/// Returns [`PipelineError`] from whichever stage fails.
pub fn process_with_diagnostics<C: Clock>(
    source: impl ColorSource + Send + 'static,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(Vectorization, PipelineDiagnostics), PipelineError> {
    let start = clock.now();
    let dimensions = source.dimensions();
    let pending = Pipeline::new(source, config.clone());

    let (built, tree) = measure(clock, || pending.build_tree())?;
    let region_count = built.tree().stats().homogeneous;
    let (resolved, adjacency) = measure(clock, || built.resolve_adjacencies())?;
    let (extracted, boundaries) = measure(clock, || Ok(resolved.extract_boundaries()))?;
    let (traced, trace) = measure(clock, || extracted.trace_chains())?;
    let (simplified, simplification) = measure(clock, || Ok(traced.simplify()))?;
    let (fitted, fit) = measure(clock, || simplified.fit())?;

    let summary = PipelineSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: dimensions.pixel_count(),
        region_count,
        chain_count: fitted.pieces().len(),
        curve_count: fitted.totals().curve_count,
    };
    let result = fitted.into_result();
    let total_duration = clock.elapsed(&start);

    Ok((
        result,
        PipelineDiagnostics {
            tree,
            adjacency,
            boundaries,
            trace,
            simplification,
            fit,
            total_duration,
            summary,
        },
    ))
}
