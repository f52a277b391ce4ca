//! Tangent magnitudes: per-section 2x2 least squares.
//!
//! With tangents and sample parameters fixed, each section's curve is
//! linear in its two magnitudes, so minimizing the summed squared
//! distance is a 2x2 normal-equation solve per section.

use crate::types::Point;

use super::DEGENERATE_EPSILON;
use super::bezier::bernstein;

/// Result of one section's magnitude solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaSolve {
    /// Magnitudes along the start and end tangents, never negative.
    pub alpha: (f64, f64),
    /// Whether part of the previous value had to be kept.
    pub fallback: bool,
}

/// Solve one section's magnitudes.
///
/// `start_tangent` and `end_tangent` are the unit tangents at the
/// section's critical points. A section with no interior samples carries
/// no information and keeps `previous` without counting as a fallback.
/// A singular system solves whichever component is still determined and
/// keeps the previous value for the other.
#[must_use]
pub fn solve_section(
    start: Point,
    end: Point,
    start_tangent: Point,
    end_tangent: Point,
    samples: &[Point],
    ts: &[f64],
    previous: (f64, f64),
) -> AlphaSolve {
    if samples.len() < 3 {
        return AlphaSolve {
            alpha: previous,
            fallback: false,
        };
    }

    let (mut c11, mut c12, mut c22, mut r1, mut r2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&c, &t) in samples.iter().zip(ts) {
        let [b0, b1, b2, b3] = bernstein(t);
        let residual = start * (b0 + b1) + end * (b2 + b3) - c;
        c11 += b1 * b1;
        c12 += b1 * b2;
        c22 += b2 * b2;
        r1 -= b1 * residual.dot(start_tangent);
        r2 -= b2 * residual.dot(end_tangent);
    }

    let uv = start_tangent.dot(end_tangent);
    let m00 = c11 * start_tangent.length_squared();
    let m01 = -c12 * uv;
    let m10 = c12 * uv;
    let m11 = -c22 * end_tangent.length_squared();

    let det = m00.mul_add(m11, -(m01 * m10));
    if det.abs() > DEGENERATE_EPSILON {
        let a = r1.mul_add(m11, -(m01 * r2)) / det;
        let b = m00.mul_add(r2, -(m10 * r1)) / det;
        if a.is_finite() && b.is_finite() {
            return AlphaSolve {
                alpha: (a.max(0.0), b.max(0.0)),
                fallback: false,
            };
        }
    }

    let alpha = if m00.abs() > DEGENERATE_EPSILON {
        let a = m01.mul_add(-previous.1, r1) / m00;
        (a.max(0.0), previous.1)
    } else if m11.abs() > DEGENERATE_EPSILON {
        let b = m10.mul_add(-previous.0, r2) / m11;
        (previous.0, b.max(0.0))
    } else {
        previous
    };
    tracing::debug!("alpha: singular section system (det {det:e}), keeping part of previous");
    AlphaSolve {
        alpha,
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::bezier::CubicBezier;
    use crate::fit::project::chord_length;

    #[test]
    fn straight_line_gives_thirds() {
        let samples: Vec<Point> = (0..=6).map(|x| Point::new(f64::from(x), 0.0)).collect();
        let ts = chord_length(&samples);
        let x = Point::new(1.0, 0.0);
        let solve = solve_section(samples[0], samples[6], x, x, &samples, &ts, (0.0, 0.0));
        assert!(!solve.fallback);
        assert!((solve.alpha.0 - 2.0).abs() < 1e-9, "{:?}", solve.alpha);
        assert!((solve.alpha.1 - 2.0).abs() < 1e-9, "{:?}", solve.alpha);
    }

    #[test]
    fn recovers_known_curve_magnitudes() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(10.0, 0.0);
        let u = Point::new(0.6, 0.8);
        let v = Point::new(0.6, -0.8);
        let truth = CubicBezier::from_section(start, end, u, v, (4.0, 3.0));
        let ts: Vec<f64> = (0..=10).map(|i| f64::from(i) / 10.0).collect();
        let samples: Vec<Point> = ts.iter().map(|&t| truth.at(t)).collect();
        let solve = solve_section(start, end, u, v, &samples, &ts, (0.0, 0.0));
        assert!((solve.alpha.0 - 4.0).abs() < 1e-6);
        assert!((solve.alpha.1 - 3.0).abs() < 1e-6);
    }

    #[test]
    fn negative_magnitudes_are_floored() {
        // Samples bulge below the chord while both tangents point up.
        let start = Point::new(0.0, 0.0);
        let end = Point::new(4.0, 0.0);
        let up = Point::new(0.0, -1.0);
        let down = Point::new(0.0, 1.0);
        let samples = [start, Point::new(1.0, 2.0), Point::new(3.0, 2.0), end];
        let ts = chord_length(&samples);
        let solve = solve_section(start, end, up, down, &samples, &ts, (1.0, 1.0));
        assert!(solve.alpha.0 >= 0.0 && solve.alpha.1 >= 0.0);
    }

    #[test]
    fn endpoints_only_keep_previous() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 0.0);
        let x = Point::new(1.0, 0.0);
        let solve = solve_section(a, b, x, x, &[a, b], &[0.0, 1.0], (0.5, 0.25));
        assert_eq!(solve.alpha, (0.5, 0.25));
        assert!(!solve.fallback);
    }

    #[test]
    fn zero_tangents_fall_back() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 0.0);
        let samples = [a, Point::new(1.0, 1.0), b];
        let solve = solve_section(a, b, Point::ZERO, Point::ZERO, &samples, &[0.0, 0.5, 1.0], (0.5, 0.25));
        assert!(solve.fallback);
        assert_eq!(solve.alpha, (0.5, 0.25));
    }
}
