//! Chain simplification: pick the critical points the curve fitter uses
//! as section endpoints.
//!
//! Simplification only ever drops points, so the result is a
//! subsequence of the chain with the same first and last point. That is
//! what lets the fitter recover which raw points belong to each section.
//!
//! # Strategy pattern
//!
//! As with other pluggable steps, the [`Simplifier`] trait and
//! [`SimplifierKind`] enum keep the algorithm choice in configuration.

use serde::{Deserialize, Serialize};

use crate::types::{GridPoint, Point};

/// Selects which simplification algorithm to use.
///
/// Ships with [`DouglasPeucker`](Self::DouglasPeucker) only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimplifierKind {
    /// Ramer-Douglas-Peucker, with an optional radial-distance pre-pass
    /// when high quality is off.
    #[default]
    DouglasPeucker,
}

/// Trait for polyline simplification strategies.
///
/// Implementations must keep the first and last point, return a
/// subsequence of the input, and leave an already simplified sequence
/// unchanged at the same tolerance.
pub trait Simplifier {
    /// Simplify an open polyline.
    fn simplify(&self, points: &[GridPoint], tolerance: f64, high_quality: bool) -> Vec<GridPoint>;
}

impl Simplifier for SimplifierKind {
    fn simplify(&self, points: &[GridPoint], tolerance: f64, high_quality: bool) -> Vec<GridPoint> {
        match *self {
            Self::DouglasPeucker => {
                if high_quality {
                    douglas_peucker(points, tolerance)
                } else {
                    douglas_peucker(&radial_distance(points, tolerance), tolerance)
                }
            }
        }
    }
}

/// Simplify a traced chain, splitting loops so they keep their shape.
///
/// A closed chain `[a, .., a]` would collapse to `[a, a]` under plain
/// Douglas-Peucker, since every point is measured against a zero-length
/// baseline. Instead the loop is cut at the point farthest from `a` and
/// the two halves are simplified separately, so at least `[a, far, a]`
/// survives.
#[must_use = "returns the simplified chain"]
pub fn simplify_chain(
    simplifier: &impl Simplifier,
    chain: &[GridPoint],
    is_loop: bool,
    tolerance: f64,
    high_quality: bool,
) -> Vec<GridPoint> {
    if !is_loop || chain.len() < 3 {
        return simplifier.simplify(chain, tolerance, high_quality);
    }

    let origin = chain[0].to_point();
    let far = chain
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            origin
                .distance_squared(a.to_point())
                .total_cmp(&origin.distance_squared(b.to_point()))
        })
        .map_or(chain.len() / 2, |(i, _)| i);

    let mut out = simplifier.simplify(&chain[..=far], tolerance, high_quality);
    let tail = simplifier.simplify(&chain[far..], tolerance, high_quality);
    out.extend(tail.into_iter().skip(1));
    out
}

// ---------------------------------------------------------------------------
// Douglas-Peucker
// ---------------------------------------------------------------------------

/// Ramer-Douglas-Peucker over lattice points.
///
/// Points within `tolerance` pixels of the line between their kept
/// neighbors are removed. A tolerance of 0.0 still drops exactly
/// collinear points.
fn douglas_peucker(points: &[GridPoint], tolerance: f64) -> Vec<GridPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let floats: Vec<Point> = points.iter().map(|p| p.to_point()).collect();
    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    rdp_recurse(&floats, 0, points.len() - 1, tolerance, &mut kept);

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Keep the farthest point between `start` and `end` if it lies beyond
/// `tolerance`, then recurse into both halves.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Distance from `p` to the line through `a` and `b`, or to `a` when the
/// two coincide.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let d = b - a;
    let length_sq = d.length_squared();
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let cross = d.x.mul_add(a.y - p.y, -(d.y * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

// ---------------------------------------------------------------------------
// Radial distance pre-pass
// ---------------------------------------------------------------------------

/// Drop points closer than `tolerance` to the previously kept point.
///
/// The first and last points are always kept.
fn radial_distance(points: &[GridPoint], tolerance: f64) -> Vec<GridPoint> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let Some((&last, middle)) = rest.split_last() else {
        return vec![first];
    };

    let tolerance_sq = tolerance * tolerance;
    let mut out = vec![first];
    let mut previous = first.to_point();
    for &p in middle {
        if p.to_point().distance_squared(previous) > tolerance_sq {
            out.push(p);
            previous = p.to_point();
        }
    }
    out.push(last);
    out
}
