//! Axis-aligned integer rectangles and their four-way subdivision.

use serde::{Deserialize, Serialize};

use crate::position::{Corner, Side};

/// An axis-aligned rectangle of pixels.
///
/// Dimensions are unsigned, so a negative size cannot be represented. A
/// region with zero width or height is *degenerate*: it covers no pixels
/// but still takes part in subdivision so odd sizes split cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Create a new region.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether the region covers no pixels.
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region is exactly one pixel.
    #[must_use]
    pub const fn is_unit(self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(self) -> u32 {
        self.y + self.height
    }

    /// Whether the pixel at `(x, y)` lies inside the region.
    #[must_use]
    pub const fn contains_pixel(self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies entirely within this region.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Coordinate of the edge on `side`, perpendicular to that side.
    #[must_use]
    pub const fn edge(self, side: Side) -> u32 {
        match side {
            Side::Top => self.y,
            Side::Right => self.right(),
            Side::Bottom => self.bottom(),
            Side::Left => self.x,
        }
    }

    /// Half-open extent of the edge on `side`, measured along that side.
    #[must_use]
    pub const fn span(self, side: Side) -> (u32, u32) {
        if side.is_horizontal() {
            (self.x, self.right())
        } else {
            (self.y, self.bottom())
        }
    }

    /// Split into four quadrants.
    ///
    /// The top and left halves take `ceil(n / 2)` and the bottom and right
    /// halves the remainder, so the quadrants always tile the region even
    /// when a dimension is odd or one. A dimension of one yields a
    /// degenerate right or bottom column.
    #[must_use]
    pub const fn subdivide(self) -> Quadrants<Self> {
        let left_width = self.width.div_ceil(2);
        let top_height = self.height.div_ceil(2);
        let right_width = self.width - left_width;
        let bottom_height = self.height - top_height;
        let mid_x = self.x + left_width;
        let mid_y = self.y + top_height;

        Quadrants {
            top_left: Self::new(self.x, self.y, left_width, top_height),
            top_right: Self::new(mid_x, self.y, right_width, top_height),
            bottom_right: Self::new(mid_x, mid_y, right_width, bottom_height),
            bottom_left: Self::new(self.x, mid_y, left_width, bottom_height),
        }
    }
}

/// Four values keyed by [`Corner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quadrants<T> {
    pub top_left: T,
    pub top_right: T,
    pub bottom_right: T,
    pub bottom_left: T,
}

impl<T> Quadrants<T> {
    /// Build by calling `f` once per corner, clockwise from the top-left.
    pub fn from_fn(mut f: impl FnMut(Corner) -> T) -> Self {
        Self {
            top_left: f(Corner::TopLeft),
            top_right: f(Corner::TopRight),
            bottom_right: f(Corner::BottomRight),
            bottom_left: f(Corner::BottomLeft),
        }
    }

    /// The value at `corner`.
    #[must_use]
    pub const fn get(&self, corner: Corner) -> &T {
        match corner {
            Corner::TopLeft => &self.top_left,
            Corner::TopRight => &self.top_right,
            Corner::BottomRight => &self.bottom_right,
            Corner::BottomLeft => &self.bottom_left,
        }
    }

    /// Pair each value with its corner, clockwise from the top-left.
    pub fn iter(&self) -> impl Iterator<Item = (Corner, &T)> {
        Corner::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Transform every value, keeping the corner keys.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Quadrants<U> {
        Quadrants {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_right: f(self.bottom_right),
            bottom_left: f(self.bottom_left),
        }
    }
}
