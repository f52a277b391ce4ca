//! Shared types for the quadtrace pipeline.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adjacency::{AdjacencyError, AdjacencyMap};
use crate::boundary::BoundarySegment;
use crate::color::Color;
use crate::fit::FitError;
use crate::graph::GraphError;
use crate::quadtree::QuadTree;
use crate::simplify::SimplifierKind;
use crate::trace::BoundaryPiece;

/// Re-export `RgbaImage` so downstream crates can feed decoded images to
/// the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point or vector in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product, treating both points as vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Squared length of this vector.
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length of this vector.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero
    /// vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let length = self.length();
        (length > f64::EPSILON && length.is_finite()).then(|| self * length.recip())
    }

    /// This vector rotated a quarter turn.
    #[must_use]
    pub const fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A point on the pixel-corner lattice.
///
/// Boundaries run along pixel edges, so every boundary vertex has integer
/// coordinates. Equality is structural; the canonical string form is
/// `(x,y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    /// Create a new lattice point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The same location as a floating-point [`Point`].
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

impl From<GridPoint> for Point {
    fn from(p: GridPoint) -> Self {
        p.to_point()
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Error parsing a [`GridPoint`] from its `(x,y)` form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grid point {0:?}: expected \"(x,y)\"")]
pub struct ParseGridPointError(String);

impl FromStr for GridPoint {
    type Err = ParseGridPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseGridPointError(s.to_owned());
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;
        let (x, y) = inner.split_once(',').ok_or_else(err)?;
        Ok(Self::new(
            x.trim().parse().map_err(|_| err())?,
            y.trim().parse().map_err(|_| err())?,
        ))
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count.
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Tuning for the iterative Bezier fit.
///
/// The error threshold is a total over every sample of a chain, not a
/// per-sample distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Stop once the summed squared distance from samples to the curve
    /// falls below this.
    pub acceptable_error: f64,

    /// Cap on outer (project, alpha, tangent) iterations.
    pub max_iterations: usize,

    /// Cap on Newton-Raphson steps when re-projecting one sample.
    pub projection_iterations: usize,

    /// Newton-Raphson stops once the squared distance or its derivative
    /// falls below this.
    pub projection_tolerance: f64,
}

impl FitConfig {
    pub const DEFAULT_ACCEPTABLE_ERROR: f64 = 25.0;
    pub const DEFAULT_MAX_ITERATIONS: usize = 40;
    pub const DEFAULT_PROJECTION_ITERATIONS: usize = 40;
    pub const DEFAULT_PROJECTION_TOLERANCE: f64 = 1e-5;
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            acceptable_error: Self::DEFAULT_ACCEPTABLE_ERROR,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            projection_iterations: Self::DEFAULT_PROJECTION_ITERATIONS,
            projection_tolerance: Self::DEFAULT_PROJECTION_TOLERANCE,
        }
    }
}

/// Configuration for the vectorization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Build large quadtree subtrees and independent chains on the rayon
    /// thread pool.
    pub parallel: bool,

    /// Run the adjacency and point-graph consistency checks after each
    /// stage. Failures abort the run.
    pub validate: bool,

    /// Boundary segments longer than this many pixels get evenly spaced
    /// intermediate vertices so the fitter has samples along them.
    pub subdivision_length: u32,

    /// Which polyline simplification algorithm to use.
    pub simplifier: SimplifierKind,

    /// Simplification tolerance in pixels. Higher values keep fewer
    /// critical points, producing longer curve sections.
    pub simplify_tolerance: f64,

    /// Skip the fast radial-distance pre-pass before simplification.
    pub high_quality: bool,

    /// Bezier fitting parameters.
    pub fit: FitConfig,
}

impl PipelineConfig {
    pub const DEFAULT_PARALLEL: bool = true;
    pub const DEFAULT_VALIDATE: bool = true;
    pub const DEFAULT_SUBDIVISION_LENGTH: u32 = 4;
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 1.0;
    pub const DEFAULT_HIGH_QUALITY: bool = true;

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first field out
    /// of range.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.subdivision_length == 0 {
            return Err(PipelineError::InvalidConfig(
                "subdivision_length must be at least 1".to_owned(),
            ));
        }
        if !(self.simplify_tolerance >= 0.0 && self.simplify_tolerance.is_finite()) {
            return Err(PipelineError::InvalidConfig(format!(
                "simplify_tolerance must be finite and non-negative, got {}",
                self.simplify_tolerance
            )));
        }
        if !(self.fit.acceptable_error >= 0.0 && self.fit.acceptable_error.is_finite()) {
            return Err(PipelineError::InvalidConfig(format!(
                "fit.acceptable_error must be finite and non-negative, got {}",
                self.fit.acceptable_error
            )));
        }
        if !(self.fit.projection_tolerance > 0.0 && self.fit.projection_tolerance.is_finite()) {
            return Err(PipelineError::InvalidConfig(format!(
                "fit.projection_tolerance must be finite and positive, got {}",
                self.fit.projection_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: Self::DEFAULT_PARALLEL,
            validate: Self::DEFAULT_VALIDATE,
            subdivision_length: Self::DEFAULT_SUBDIVISION_LENGTH,
            simplifier: SimplifierKind::default(),
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
            high_quality: Self::DEFAULT_HIGH_QUALITY,
            fit: FitConfig::default(),
        }
    }
}

/// Everything the pipeline produced for one image.
///
/// Each field is the output of one stage, so a renderer can draw the
/// regions, their neighbors, raw boundaries, or fitted curves.
#[derive(Debug, Clone)]
pub struct Vectorization {
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
    /// Region quadtree of the source colors.
    pub tree: QuadTree<Color>,
    /// Neighbors of every homogeneous leaf.
    pub adjacencies: AdjacencyMap<Color>,
    /// Merged boundary segments between differently colored leaves.
    pub segments: Vec<BoundarySegment>,
    /// Traced chains with their simplified form and fitted curves.
    pub pieces: Vec<BoundaryPiece>,
}

/// Errors that can occur during pipeline processing.
///
/// Adjacency and graph errors indicate an internal inconsistency rather
/// than bad input; they abort the run instead of being skipped.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The adjacency map is inconsistent with its tree.
    #[error("adjacency resolution failed: {0}")]
    Adjacency(#[from] AdjacencyError),

    /// The boundary point graph is inconsistent.
    #[error("boundary graph is inconsistent: {0}")]
    Graph(#[from] GraphError),

    /// A chain could not be fit at all.
    #[error("curve fitting failed: {0}")]
    Fit(#[from] FitError),
}
