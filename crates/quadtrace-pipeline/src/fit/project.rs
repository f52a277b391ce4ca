//! Curve parameters for the samples of each section.
//!
//! The first pass uses chord-length parameterization. Later passes refine
//! each sample's previous parameter with Newton-Raphson on the squared
//! distance to the current curve.

use crate::types::{FitConfig, Point};

use super::bezier::CubicBezier;

/// Chord-length parameters: the fraction of the polyline's length
/// reached at each sample.
///
/// A section of zero total length gets evenly spaced parameters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn chord_length(samples: &[Point]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(samples.len());
    let mut total = 0.0;
    for (i, &p) in samples.iter().enumerate() {
        if i > 0 {
            total += p.distance(samples[i - 1]);
        }
        cumulative.push(total);
    }
    if total > 0.0 {
        cumulative.iter().map(|k| k / total).collect()
    } else {
        let last = samples.len().saturating_sub(1).max(1) as f64;
        (0..samples.len()).map(|i| i as f64 / last).collect()
    }
}

/// Refine `t` so `curve.at(t)` is the point on `curve` closest to
/// `target`.
///
/// Each step is `t -= (D . Q') / (Q' . Q' + D . Q'')` with `D = Q(t) -
/// target`. Stops once the step or the residual falls below the
/// tolerance, the denominator vanishes, or the iteration cap is hit.
/// The result is clamped to `[0, 1]`.
#[must_use]
pub fn newton_raphson(curve: &CubicBezier, target: Point, t: f64, config: &FitConfig) -> f64 {
    let mut t = t.clamp(0.0, 1.0);
    for _ in 0..config.projection_iterations {
        let d = curve.at(t) - target;
        if d.length_squared() < config.projection_tolerance {
            break;
        }
        let first = curve.derivative(t);
        let numerator = d.dot(first);
        let denominator = first.dot(first) + d.dot(curve.second_derivative(t));
        if denominator.abs() < f64::EPSILON || !denominator.is_finite() {
            break;
        }
        let next = (t - numerator / denominator).clamp(0.0, 1.0);
        if !next.is_finite() {
            break;
        }
        let step = (next - t).abs();
        t = next;
        if step < config.projection_tolerance {
            break;
        }
    }
    t
}

/// Re-project one section's samples onto `curve`.
///
/// The endpoints stay at 0 and 1. If the refined parameters stop being
/// non-decreasing the previous ones are returned unchanged and the
/// second value is `true`.
#[must_use]
pub fn project_section(
    curve: &CubicBezier,
    samples: &[Point],
    previous: &[f64],
    config: &FitConfig,
) -> (Vec<f64>, bool) {
    let last = samples.len().saturating_sub(1);
    let refined: Vec<f64> = samples
        .iter()
        .zip(previous)
        .enumerate()
        .map(|(j, (&c, &t))| match j {
            0 => 0.0,
            j if j == last => 1.0,
            _ => newton_raphson(curve, c, t, config),
        })
        .collect();

    if refined.windows(2).all(|w| w[0] <= w[1]) {
        (refined, false)
    } else {
        (previous.to_vec(), true)
    }
}

/// Summed squared distance from each sample to its projected curve
/// point.
#[must_use]
pub fn squared_error(curve: &CubicBezier, samples: &[Point], ts: &[f64]) -> f64 {
    samples
        .iter()
        .zip(ts)
        .map(|(&c, &t)| curve.at(t).distance_squared(c))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(length: f64) -> CubicBezier {
        CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(length / 3.0, 0.0),
            Point::new(2.0 * length / 3.0, 0.0),
            Point::new(length, 0.0),
        )
    }

    #[test]
    fn chord_length_is_normalized() {
        let samples = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 3.0)];
        let ts = chord_length(&samples);
        assert_eq!(ts.len(), 3);
        assert!(ts[0].abs() < 1e-12);
        assert!((ts[1] - 0.25).abs() < 1e-12);
        assert!((ts[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn chord_length_of_coincident_points_is_even() {
        let samples = [Point::ZERO; 3];
        assert_eq!(chord_length(&samples), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn newton_raphson_finds_closest_point_on_line() {
        let curve = line(10.0);
        let t = newton_raphson(&curve, Point::new(7.0, 2.0), 0.5, &FitConfig::default());
        assert!((t - 0.7).abs() < 1e-4, "t = {t}");
    }

    #[test]
    fn newton_raphson_stays_in_unit_interval() {
        let curve = line(10.0);
        let config = FitConfig::default();
        assert!(newton_raphson(&curve, Point::new(-5.0, 0.0), 0.2, &config) >= 0.0);
        assert!(newton_raphson(&curve, Point::new(15.0, 0.0), 0.8, &config) <= 1.0);
    }

    #[test]
    fn projection_pins_endpoints() {
        let curve = line(4.0);
        let samples = [Point::new(0.0, 0.0), Point::new(2.0, 1.0), Point::new(4.0, 0.0)];
        let (ts, reverted) = project_section(&curve, &samples, &[0.0, 0.3, 1.0], &FitConfig::default());
        assert!(!reverted);
        assert!(ts[0].abs() < f64::EPSILON);
        assert!((ts[2] - 1.0).abs() < f64::EPSILON);
        assert!((ts[1] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn projection_reverts_when_order_breaks() {
        let curve = line(4.0);
        let samples = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(4.0, 0.0),
        ];
        let previous = [0.0, 0.3, 0.6, 1.0];
        let (ts, reverted) = project_section(&curve, &samples, &previous, &FitConfig::default());
        assert!(reverted);
        assert_eq!(ts, previous.to_vec());
    }

    #[test]
    fn squared_error_sums_residuals() {
        let curve = line(4.0);
        let samples = [Point::new(0.0, 1.0), Point::new(4.0, 2.0)];
        let error = squared_error(&curve, &samples, &[0.0, 1.0]);
        assert!((error - 5.0).abs() < 1e-12);
    }
}
