//! Cubic Bezier curves and their Bernstein basis.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// A cubic Bezier curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl CubicBezier {
    #[must_use]
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// The curve between two critical points.
    ///
    /// The inner control points sit `alpha.0` along `start_tangent` from
    /// `start` and `alpha.1` back along `end_tangent` from `end`.
    #[must_use]
    pub fn from_section(
        start: Point,
        end: Point,
        start_tangent: Point,
        end_tangent: Point,
        alpha: (f64, f64),
    ) -> Self {
        Self::new(
            start,
            start + start_tangent * alpha.0,
            end - end_tangent * alpha.1,
            end,
        )
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> Point {
        let [b0, b1, b2, b3] = bernstein(t);
        self.p0 * b0 + self.p1 * b1 + self.p2 * b2 + self.p3 * b3
    }

    /// First derivative at `t`.
    #[must_use]
    pub fn derivative(&self, t: f64) -> Point {
        let s = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * s * s)
            + (self.p2 - self.p1) * (6.0 * s * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Second derivative at `t`.
    #[must_use]
    pub fn second_derivative(&self, t: f64) -> Point {
        let s = 1.0 - t;
        (self.p2 - self.p1 * 2.0 + self.p0) * (6.0 * s)
            + (self.p3 - self.p2 * 2.0 + self.p1) * (6.0 * t)
    }

    /// Whether every control point is finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.p0.is_finite() && self.p1.is_finite() && self.p2.is_finite() && self.p3.is_finite()
    }
}

/// The four cubic Bernstein polynomials at `t`.
#[must_use]
pub fn bernstein(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    fn sample() -> CubicBezier {
        CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 3.0),
            Point::new(4.0, 3.0),
            Point::new(5.0, 0.0),
        )
    }

    #[test]
    fn endpoints_interpolate() {
        let c = sample();
        assert!(close(c.at(0.0), c.p0));
        assert!(close(c.at(1.0), c.p3));
    }

    #[test]
    fn basis_is_partition_of_unity() {
        for i in 0..=10 {
            let t = f64::from(i) / 10.0;
            let sum: f64 = bernstein(t).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let c = sample();
        let h = 1e-6;
        for t in [0.1, 0.5, 0.9] {
            let numeric = (c.at(t + h) - c.at(t - h)) * (0.5 / h);
            assert!(numeric.distance(c.derivative(t)) < 1e-5);
            let numeric2 = (c.derivative(t + h) - c.derivative(t - h)) * (0.5 / h);
            assert!(numeric2.distance(c.second_derivative(t)) < 1e-4);
        }
    }

    #[test]
    fn end_derivatives_follow_control_legs() {
        let c = sample();
        assert!(close(c.derivative(0.0), (c.p1 - c.p0) * 3.0));
        assert!(close(c.derivative(1.0), (c.p3 - c.p2) * 3.0));
    }

    #[test]
    fn section_places_inner_controls_along_tangents() {
        let c = CubicBezier::from_section(
            Point::new(0.0, 0.0),
            Point::new(9.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            (3.0, 2.0),
        );
        assert!(close(c.p1, Point::new(3.0, 0.0)));
        assert!(close(c.p2, Point::new(9.0, -2.0)));
    }
}
