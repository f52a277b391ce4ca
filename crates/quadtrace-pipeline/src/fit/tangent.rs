//! Tangent directions: one tridiagonal least-squares solve per axis.
//!
//! With magnitudes and sample parameters fixed, the curves are linear in
//! the (unnormalized) tangent vectors. Each section couples the tangents
//! at its two ends, so the normal equations form a tridiagonal system
//! over all critical points. The x and y components decouple and share
//! the same matrix.

use crate::types::Point;

use super::DEGENERATE_EPSILON;
use super::bezier::bernstein;
use super::sections::Sections;

/// Result of one tangent solve.
#[derive(Debug, Clone, PartialEq)]
pub struct TangentSolve {
    /// Unit tangent per critical point.
    pub tangents: Vec<Point>,
    /// Number of tangents that kept their previous value because the
    /// solve could not determine them.
    pub fallbacks: usize,
}

/// Solve for all tangents jointly.
///
/// Rows whose diagonal vanishes (no section constrains that tangent, for
/// example when both neighboring magnitudes are zero) are pinned to the
/// previous tangent. A vanishing pivot keeps every previous tangent, and
/// a solved vector of zero length keeps that point's previous tangent.
#[must_use]
pub fn solve_tangents(
    sections: &Sections,
    alphas: &[(f64, f64)],
    ts: &[Vec<f64>],
    previous: &[Point],
) -> TangentSolve {
    let n = previous.len();
    let critical = sections.critical();
    let mut sub = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs_x = vec![0.0; n];
    let mut rhs_y = vec![0.0; n];

    for (i, samples) in sections.iter().enumerate() {
        let (a, b) = alphas[i];
        let (start, end) = (critical[i], critical[i + 1]);
        let (mut c11, mut c12, mut c22) = (0.0, 0.0, 0.0);
        let (mut s1, mut s2) = (Point::ZERO, Point::ZERO);
        for (&c, &t) in samples.iter().zip(&ts[i]) {
            let [b0, b1, b2, b3] = bernstein(t);
            let residual = start * (b0 + b1) + end * (b2 + b3) - c;
            c11 += b1 * b1;
            c12 += b1 * b2;
            c22 += b2 * b2;
            s1 = s1 + residual * b1;
            s2 = s2 + residual * b2;
        }
        diag[i] += a * a * c11;
        sup[i] -= a * b * c12;
        sub[i + 1] -= a * b * c12;
        diag[i + 1] += b * b * c22;
        rhs_x[i] -= a * s1.x;
        rhs_y[i] -= a * s1.y;
        rhs_x[i + 1] += b * s2.x;
        rhs_y[i + 1] += b * s2.y;
    }

    let mut pinned = 0;
    for k in 0..n {
        if diag[k].abs() < DEGENERATE_EPSILON {
            sub[k] = 0.0;
            sup[k] = 0.0;
            diag[k] = 1.0;
            rhs_x[k] = previous[k].x;
            rhs_y[k] = previous[k].y;
            pinned += 1;
        }
    }
    if pinned > 0 {
        tracing::trace!("tangent: pinned {pinned} of {n} rows to previous tangents");
    }

    let (Some(xs), Some(ys)) = (
        solve_tridiagonal(&sub, &diag, &sup, &rhs_x),
        solve_tridiagonal(&sub, &diag, &sup, &rhs_y),
    ) else {
        tracing::debug!("tangent: singular tridiagonal system, keeping all {n} previous tangents");
        return TangentSolve {
            tangents: previous.to_vec(),
            fallbacks: n,
        };
    };

    let mut fallbacks = 0;
    let tangents = xs
        .into_iter()
        .zip(ys)
        .zip(previous)
        .map(|((x, y), &prev)| {
            Point::new(x, y).normalized().unwrap_or_else(|| {
                fallbacks += 1;
                prev
            })
        })
        .collect();
    if fallbacks > 0 {
        tracing::debug!("tangent: {fallbacks} zero-length solutions kept previous tangents");
    }
    TangentSolve {
        tangents,
        fallbacks,
    }
}

/// Thomas algorithm for a tridiagonal system.
///
/// `sub[k]` multiplies `x[k - 1]` and `sup[k]` multiplies `x[k + 1]` in
/// row `k`; `sub[0]` and the last `sup` are ignored. Returns `None` when
/// a pivot vanishes.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Option<Vec<f64>> {
    let n = diag.len();
    if n == 0 {
        return Some(Vec::new());
    }
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    let mut pivot = diag[0];
    for k in 0..n {
        if k > 0 {
            pivot = sub[k].mul_add(-c[k - 1], diag[k]);
        }
        if pivot.abs() < DEGENERATE_EPSILON || !pivot.is_finite() {
            return None;
        }
        c[k] = if k + 1 < n { sup[k] / pivot } else { 0.0 };
        d[k] = if k > 0 {
            sub[k].mul_add(-d[k - 1], rhs[k]) / pivot
        } else {
            rhs[0] / pivot
        };
    }

    let mut x = d;
    for k in (0..n - 1).rev() {
        x[k] = c[k].mul_add(-x[k + 1], x[k]);
    }
    Some(x)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fit::bezier::CubicBezier;
    use crate::types::GridPoint;

    #[test]
    fn thomas_solves_small_system() {
        // [2 1 0; 1 3 1; 0 1 2] x = [3 5 3] has x = [1 1 1].
        let x = solve_tridiagonal(&[0.0, 1.0, 1.0], &[2.0, 3.0, 2.0], &[1.0, 1.0, 0.0], &[3.0, 5.0, 3.0])
            .unwrap();
        for v in x {
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn thomas_rejects_zero_pivot() {
        assert_eq!(solve_tridiagonal(&[0.0, 1.0], &[1.0, 1.0], &[1.0, 0.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn straight_line_tangents_point_along_line() {
        let data: Vec<GridPoint> = (0..=8).map(|x| GridPoint::new(x, 2)).collect();
        let critical = [data[0], data[4], data[8]];
        let sections = Sections::for_points(&data, &critical).unwrap();
        let ts: Vec<Vec<f64>> = sections.iter().map(crate::fit::project::chord_length).collect();
        let tilted = Point::new(0.8, 0.6);
        let solve = solve_tangents(&sections, &[(4.0 / 3.0, 4.0 / 3.0); 2], &ts, &[tilted; 3]);
        assert_eq!(solve.fallbacks, 0);
        for t in solve.tangents {
            assert!((t.x - 1.0).abs() < 1e-9, "{t:?}");
            assert!(t.y.abs() < 1e-9, "{t:?}");
        }
    }

    #[test]
    fn zero_magnitudes_pin_previous() {
        let data: Vec<GridPoint> = (0..=4).map(|x| GridPoint::new(x, x % 2)).collect();
        let critical = [data[0], data[4]];
        let sections = Sections::for_points(&data, &critical).unwrap();
        let ts: Vec<Vec<f64>> = sections.iter().map(crate::fit::project::chord_length).collect();
        let previous = [Point::new(0.0, 1.0), Point::new(1.0, 0.0)];
        let solve = solve_tangents(&sections, &[(0.0, 0.0)], &ts, &previous);
        assert_eq!(solve.tangents, previous.to_vec());
        assert_eq!(solve.fallbacks, 0);
    }

    #[test]
    fn recovers_tangents_of_known_spline() {
        let p = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0)];
        let t_hat = [
            Point::new(0.6, 0.8),
            Point::new(1.0, 0.0),
            Point::new(0.6, -0.8),
        ];
        let alphas = [(3.0, 3.0), (3.0, 3.0)];
        let curves = [
            CubicBezier::from_section(p[0], p[1], t_hat[0], t_hat[1], alphas[0]),
            CubicBezier::from_section(p[1], p[2], t_hat[1], t_hat[2], alphas[1]),
        ];
        let params: Vec<f64> = (0..=8).map(|i| f64::from(i) / 8.0).collect();

        // Sections normally come from lattice chains; build one directly
        // from the sampled curves.
        let sections = Sections::from_samples(
            p.to_vec(),
            curves
                .iter()
                .map(|c| params.iter().map(|&t| c.at(t)).collect())
                .collect(),
        );
        let ts = vec![params.clone(), params];
        let solve = solve_tangents(&sections, &alphas, &ts, &[Point::new(1.0, 0.0); 3]);
        for (got, want) in solve.tangents.iter().zip(t_hat) {
            assert!(got.distance(want) < 1e-9, "{got:?} vs {want:?}");
        }
    }
}
