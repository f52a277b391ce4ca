//! Piecewise cubic Bezier fitting.
//!
//! Fits one cubic per section of a chain, where sections run between
//! consecutive critical points. Adjacent sections share the unit tangent
//! at their common critical point, so the result is tangent-continuous.
//!
//! The fit alternates between three sub-problems, each easy when the
//! others are held fixed (Shao & Zhou, "Curve Fitting with Bezier
//! Cubics", 1996):
//!
//! 1. **Magnitudes** ([`alpha`]): per-section 2x2 normal equations.
//! 2. **Parameters** ([`project`]): Newton-Raphson closest-point
//!    projection of every sample.
//! 3. **Tangents** ([`tangent`]): one tridiagonal solve per axis across
//!    all critical points.
//!
//! The summed squared error is not guaranteed to decrease on every
//! iteration. After a first mandatory pass, the loop stops once it falls
//! below the acceptable error or the iteration cap is reached; either way
//! the last curves are returned.

pub mod alpha;
pub mod bezier;
pub mod project;
pub mod sections;
pub mod tangent;

use serde::{Deserialize, Serialize};

pub use bezier::CubicBezier;
pub use sections::Sections;

use crate::types::{FitConfig, GridPoint, Point};

/// Below this a linear system row, determinant or pivot counts as zero.
pub(crate) const DEGENERATE_EPSILON: f64 = 1e-8;

/// Errors that stop a chain from being fit at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FitError {
    /// Fewer than two critical points.
    #[error("need at least two critical points, got {0}")]
    TooFewPoints(usize),

    /// The critical points are not an in-order subsequence of the chain
    /// sharing its ends.
    #[error("critical point {0} is out of place in its chain")]
    CriticalPointsMismatch(GridPoint),

    /// No initial tangent direction exists at a critical point, so there
    /// is no previous value to fall back on.
    #[error("no tangent direction at critical point {0}")]
    DegenerateTangent(usize),
}

/// The fitted curves of one chain and how the fit went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    /// One curve per section.
    pub curves: Vec<CubicBezier>,
    /// Outer iterations run.
    pub iterations: usize,
    /// Final summed squared distance from samples to the curves.
    pub error: f64,
    /// Whether the error fell below the acceptable threshold.
    pub converged: bool,
    /// Sub-solves that kept a previous value instead of a fresh one.
    pub fallbacks: usize,
}

/// Fit a tangent-continuous cubic spline through `critical`, shaped by
/// every point of `data`.
///
/// `critical` must be a subsequence of `data` with the same first and
/// last point, as produced by [`crate::simplify`].
///
/// # Errors
///
/// Returns [`FitError`] when the inputs do not describe any sections or
/// an initial tangent cannot be formed.
pub fn fit_piecewise(
    data: &[GridPoint],
    critical: &[GridPoint],
    config: &FitConfig,
) -> Result<FitOutcome, FitError> {
    let sections = Sections::for_points(data, critical)?;
    let mut tangents = initial_tangents(sections.critical())?;
    let mut alphas = vec![(0.0, 0.0); sections.len()];
    let mut ts: Vec<Vec<f64>> = sections.iter().map(project::chord_length).collect();
    let mut fallbacks = 0;

    // The zero-magnitude start is the polyline itself, whose summed error
    // can already sit under the threshold. Always refine at least once.
    let mut error = total_error(&sections, &tangents, &alphas, &ts);
    let mut iterations = 0;
    while iterations < config.max_iterations
        && (iterations == 0 || error >= config.acceptable_error)
    {
        iterations += 1;

        for (i, samples) in sections.iter().enumerate() {
            let solve = alpha::solve_section(
                sections.critical()[i],
                sections.critical()[i + 1],
                tangents[i],
                tangents[i + 1],
                samples,
                &ts[i],
                alphas[i],
            );
            alphas[i] = solve.alpha;
            fallbacks += usize::from(solve.fallback);
        }
        fallbacks += reproject(&sections, &tangents, &alphas, &mut ts, config);

        let solve = tangent::solve_tangents(&sections, &alphas, &ts, &tangents);
        tangents = solve.tangents;
        fallbacks += solve.fallbacks;
        fallbacks += reproject(&sections, &tangents, &alphas, &mut ts, config);

        error = total_error(&sections, &tangents, &alphas, &ts);
        tracing::trace!("fit: iteration {iterations}, error {error:.3}");
    }

    let converged = error < config.acceptable_error;
    if fallbacks > 0 {
        tracing::debug!(
            "fit: {} sections, {fallbacks} numerical fallbacks over {iterations} iterations",
            sections.len()
        );
    }
    Ok(FitOutcome {
        curves: curves(&sections, &tangents, &alphas),
        iterations,
        error,
        converged,
        fallbacks,
    })
}

/// Starting tangent at each critical point.
///
/// Uses the chord between the neighboring critical points (one-sided at
/// the ends). Where that chord has zero length, as at the far point of a
/// loop split `[a, far, a]`, the perpendicular of the outgoing chord is
/// used instead.
fn initial_tangents(critical: &[Point]) -> Result<Vec<Point>, FitError> {
    let last = critical.len() - 1;
    (0..=last)
        .map(|i| {
            let before = critical[i.saturating_sub(1)];
            let after = critical[(i + 1).min(last)];
            let outgoing = if i < last {
                critical[i + 1] - critical[i]
            } else {
                critical[i] - critical[i - 1]
            };
            (after - before)
                .normalized()
                .or_else(|| outgoing.perpendicular().normalized())
                .ok_or(FitError::DegenerateTangent(i))
        })
        .collect()
}

fn curves(sections: &Sections, tangents: &[Point], alphas: &[(f64, f64)]) -> Vec<CubicBezier> {
    let p = sections.critical();
    alphas
        .iter()
        .enumerate()
        .map(|(i, &alpha)| CubicBezier::from_section(p[i], p[i + 1], tangents[i], tangents[i + 1], alpha))
        .collect()
}

/// Re-project every section; returns how many reverted.
fn reproject(
    sections: &Sections,
    tangents: &[Point],
    alphas: &[(f64, f64)],
    ts: &mut [Vec<f64>],
    config: &FitConfig,
) -> usize {
    let mut reverted = 0;
    for ((curve, samples), t) in curves(sections, tangents, alphas)
        .iter()
        .zip(sections.iter())
        .zip(ts.iter_mut())
    {
        let (next, kept_previous) = project::project_section(curve, samples, t, config);
        *t = next;
        reverted += usize::from(kept_previous);
    }
    if reverted > 0 {
        tracing::debug!("fit: {reverted} sections kept previous parameters");
    }
    reverted
}

fn total_error(
    sections: &Sections,
    tangents: &[Point],
    alphas: &[(f64, f64)],
    ts: &[Vec<f64>],
) -> f64 {
    curves(sections, tangents, alphas)
        .iter()
        .zip(sections.iter())
        .zip(ts)
        .map(|((curve, samples), t)| project::squared_error(curve, samples, t))
        .sum()
}
