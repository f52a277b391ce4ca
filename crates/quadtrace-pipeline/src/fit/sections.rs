//! Splitting a chain into sections at its critical points.

use crate::types::{GridPoint, Point};

use super::FitError;

/// A chain split at its critical points.
///
/// Section `i` runs from `critical[i]` to `critical[i + 1]` and owns the
/// chain points between them, both endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct Sections {
    critical: Vec<Point>,
    samples: Vec<Vec<Point>>,
}

impl Sections {
    /// Split `data` at `critical`, which must be a subsequence of `data`
    /// sharing its first and last point.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::TooFewPoints`] for fewer than two critical
    /// points and [`FitError::CriticalPointsMismatch`] when `critical` is
    /// not a subsequence with matching ends.
    pub fn for_points(data: &[GridPoint], critical: &[GridPoint]) -> Result<Self, FitError> {
        if critical.len() < 2 {
            return Err(FitError::TooFewPoints(critical.len()));
        }
        let (Some(&first), Some(&last)) = (data.first(), data.last()) else {
            return Err(FitError::TooFewPoints(0));
        };
        if critical[0] != first {
            return Err(FitError::CriticalPointsMismatch(critical[0]));
        }
        if critical[critical.len() - 1] != last {
            return Err(FitError::CriticalPointsMismatch(critical[critical.len() - 1]));
        }

        let mut samples = Vec::with_capacity(critical.len() - 1);
        let mut current = vec![first.to_point()];
        let mut next = 1;
        for &p in &data[1..] {
            current.push(p.to_point());
            if next < critical.len() && p == critical[next] {
                samples.push(std::mem::replace(&mut current, vec![p.to_point()]));
                next += 1;
            }
        }
        if next != critical.len() {
            return Err(FitError::CriticalPointsMismatch(critical[next]));
        }

        Ok(Self {
            critical: critical.iter().map(|p| p.to_point()).collect(),
            samples,
        })
    }

    /// Build from floating-point samples directly, bypassing the lattice
    /// chain split.
    #[cfg(test)]
    pub(crate) fn from_samples(critical: Vec<Point>, samples: Vec<Vec<Point>>) -> Self {
        Self { critical, samples }
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The critical points, one more than the sections.
    #[must_use]
    pub fn critical(&self) -> &[Point] {
        &self.critical
    }

    /// Chain points of section `i`, both ends included.
    #[must_use]
    pub fn samples(&self, i: usize) -> &[Point] {
        &self.samples[i]
    }

    /// Every section's samples in order.
    pub fn iter(&self) -> impl Iterator<Item = &[Point]> {
        self.samples.iter().map(Vec::as_slice)
    }

    /// Total number of samples, counting shared endpoints once per
    /// section.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.iter().map(Vec::len).sum()
    }
}
