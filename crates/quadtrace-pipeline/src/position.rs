//! Position algebra: the eight cyclic positions around a square.
//!
//! Positions are numbered clockwise from the top-left corner:
//!
//! ```text
//!   0 TopLeft     1 Top      2 TopRight
//!   7 Left                   3 Right
//!   6 BottomLeft  5 Bottom   4 BottomRight
//! ```
//!
//! Corners sit on even indices and sides on odd indices. Every
//! adjacency computation in the quadtree is expressed with these
//! operations, so the typed [`Corner`] and [`Side`] views exist to make
//! the common cases total while [`Position`] keeps the raw arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of positions around a square.
const POSITION_COUNT: i32 = 8;

/// Errors from position arithmetic whose arguments are out of contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// `between` was called with positions that are not two steps apart.
    #[error("{0} and {1} are not exactly two rotations apart")]
    NotTwoApart(Position, Position),

    /// A side position was supplied where a corner was required.
    #[error("{0} is not a corner")]
    NotACorner(Position),

    /// A corner position was supplied where a side was required.
    #[error("{0} is not a side")]
    NotASide(Position),
}

/// One of the eight positions around a square, in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Position {
    /// All positions in index order.
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Right,
        Self::BottomRight,
        Self::Bottom,
        Self::BottomLeft,
        Self::Left,
    ];

    /// The four corner positions (even indices).
    pub const CORNERS: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    /// The four side positions (odd indices).
    pub const SIDES: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Index of this position in `0..8`.
    #[must_use]
    pub const fn index(self) -> i32 {
        match self {
            Self::TopLeft => 0,
            Self::Top => 1,
            Self::TopRight => 2,
            Self::Right => 3,
            Self::BottomRight => 4,
            Self::Bottom => 5,
            Self::BottomLeft => 6,
            Self::Left => 7,
        }
    }

    /// The position at `index`, wrapped into `0..8`.
    #[must_use]
    pub const fn from_index(index: i32) -> Self {
        match index.rem_euclid(POSITION_COUNT) {
            0 => Self::TopLeft,
            1 => Self::Top,
            2 => Self::TopRight,
            3 => Self::Right,
            4 => Self::BottomRight,
            5 => Self::Bottom,
            6 => Self::BottomLeft,
            _ => Self::Left,
        }
    }

    /// Whether this position is one of the four corners.
    #[must_use]
    pub const fn is_corner(self) -> bool {
        self.index() % 2 == 0
    }

    /// Whether this position is one of the four sides.
    #[must_use]
    pub const fn is_side(self) -> bool {
        !self.is_corner()
    }

    /// Rotate clockwise by `steps` (negative rotates counter-clockwise).
    #[must_use]
    pub const fn rotate(self, steps: i32) -> Self {
        Self::from_index(self.index() + steps)
    }

    /// The two positions one rotation away, counter-clockwise first.
    #[must_use]
    pub const fn adjacent(self) -> [Self; 2] {
        [self.rotate(-1), self.rotate(1)]
    }

    /// Whether `other` is exactly one rotation away from `self`.
    #[must_use]
    pub const fn is_rotationally_adjacent_to(self, other: Self) -> bool {
        let [ccw, cw] = self.adjacent();
        ccw.index() == other.index() || cw.index() == other.index()
    }

    /// The position directly across the square.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.rotate(4)
    }

    /// The position halfway between two positions that are exactly two
    /// rotations apart.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::NotTwoApart`] for any other pair.
    pub const fn between(self, other: Self) -> Result<Self, PositionError> {
        if self.rotate(2).index() == other.index() {
            Ok(self.rotate(1))
        } else if other.rotate(2).index() == self.index() {
            Ok(other.rotate(1))
        } else {
            Err(PositionError::NotTwoApart(self, other))
        }
    }

    /// Reflect `self` across the axis perpendicular to `toward`.
    ///
    /// Computed as `(2 * toward + 12 - self) mod 8`. Parity is preserved,
    /// so a corner always maps to a corner: moving from a child's corner
    /// toward a side lands on the corner of the quadrant on the other side
    /// of that edge (`BottomLeft` toward `Right` is `BottomRight`).
    #[must_use]
    pub const fn after_moving_towards(self, toward: Self) -> Self {
        Self::from_index(2 * toward.index() + 12 - self.index())
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::Top => "top",
            Self::TopRight => "top-right",
            Self::Right => "right",
            Self::BottomRight => "bottom-right",
            Self::Bottom => "bottom",
            Self::BottomLeft => "bottom-left",
            Self::Left => "left",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A corner of a square; the key for the four quadrants of a subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// All corners, clockwise from the top-left.
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    /// The two sides this corner touches.
    #[must_use]
    pub const fn sides(self) -> [Side; 2] {
        match self {
            Self::TopLeft => [Side::Left, Side::Top],
            Self::TopRight => [Side::Top, Side::Right],
            Self::BottomRight => [Side::Right, Side::Bottom],
            Self::BottomLeft => [Side::Bottom, Side::Left],
        }
    }

    /// The corner reached by crossing the edge in direction `side`.
    ///
    /// Typed form of [`Position::after_moving_towards`]: moving toward
    /// `Left`/`Right` swaps left and right, moving toward `Top`/`Bottom`
    /// swaps top and bottom.
    #[must_use]
    pub const fn after_moving_towards(self, side: Side) -> Self {
        match side {
            Side::Left | Side::Right => match self {
                Self::TopLeft => Self::TopRight,
                Self::TopRight => Self::TopLeft,
                Self::BottomRight => Self::BottomLeft,
                Self::BottomLeft => Self::BottomRight,
            },
            Side::Top | Side::Bottom => match self {
                Self::TopLeft => Self::BottomLeft,
                Self::TopRight => Self::BottomRight,
                Self::BottomRight => Self::TopRight,
                Self::BottomLeft => Self::TopLeft,
            },
        }
    }
}

impl From<Corner> for Position {
    fn from(corner: Corner) -> Self {
        match corner {
            Corner::TopLeft => Self::TopLeft,
            Corner::TopRight => Self::TopRight,
            Corner::BottomRight => Self::BottomRight,
            Corner::BottomLeft => Self::BottomLeft,
        }
    }
}

impl TryFrom<Position> for Corner {
    type Error = PositionError;

    fn try_from(position: Position) -> Result<Self, Self::Error> {
        match position {
            Position::TopLeft => Ok(Self::TopLeft),
            Position::TopRight => Ok(Self::TopRight),
            Position::BottomRight => Ok(Self::BottomRight),
            Position::BottomLeft => Ok(Self::BottomLeft),
            other => Err(PositionError::NotACorner(other)),
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Position::from(*self).fmt(f)
    }
}

/// A side of a square; the direction in which a neighbor is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// All sides, clockwise from the top.
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// The side across the square.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// Whether this side touches `corner` (i.e. leads out of the parent
    /// from a child in that corner).
    #[must_use]
    pub fn is_adjacent_to(self, corner: Corner) -> bool {
        Position::from(self).is_rotationally_adjacent_to(corner.into())
    }

    /// Whether segments along this side run horizontally.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

impl From<Side> for Position {
    fn from(side: Side) -> Self {
        match side {
            Side::Top => Self::Top,
            Side::Right => Self::Right,
            Side::Bottom => Self::Bottom,
            Side::Left => Self::Left,
        }
    }
}

impl TryFrom<Position> for Side {
    type Error = PositionError;

    fn try_from(position: Position) -> Result<Self, Self::Error> {
        match position {
            Position::Top => Ok(Self::Top),
            Position::Right => Ok(Self::Right),
            Position::Bottom => Ok(Self::Bottom),
            Position::Left => Ok(Self::Left),
            other => Err(PositionError::NotASide(other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Position::from(*self).fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips() {
        for (i, p) in (0..).zip(Position::ALL) {
            assert_eq!(p.index(), i);
            assert_eq!(Position::from_index(i), p);
        }
    }

    #[test]
    fn corners_are_even_sides_are_odd() {
        for p in Position::CORNERS {
            assert!(p.is_corner());
            assert_eq!(p.index() % 2, 0);
        }
        for p in Position::SIDES {
            assert!(p.is_side());
        }
    }

    #[test]
    fn rotate_composes() {
        for p in Position::ALL {
            for a in -17..17 {
                for b in -17..17 {
                    assert_eq!(p.rotate(a).rotate(b), p.rotate(a + b));
                }
            }
        }
    }

    #[test]
    fn rotate_negative_wraps() {
        assert_eq!(Position::TopLeft.rotate(-1), Position::Left);
        assert_eq!(Position::Top.rotate(-10), Position::BottomLeft);
    }

    #[test]
    fn opposite_is_involution() {
        for p in Position::ALL {
            assert_eq!(p.opposite().opposite(), p);
            assert_ne!(p.opposite(), p);
        }
        assert_eq!(Position::Top.opposite(), Position::Bottom);
        assert_eq!(Position::TopLeft.opposite(), Position::BottomRight);
    }

    #[test]
    fn between_defined_exactly_two_apart() {
        for a in Position::ALL {
            for b in Position::ALL {
                let two_apart = a.rotate(2) == b || b.rotate(2) == a;
                let result = a.between(b);
                assert_eq!(result.is_ok(), two_apart, "{a} / {b}");
                assert_eq!(result, b.between(a).map_err(|_| PositionError::NotTwoApart(a, b)));
            }
        }
    }

    #[test]
    fn between_examples() {
        assert_eq!(Position::TopLeft.between(Position::TopRight).unwrap(), Position::Top);
        assert_eq!(Position::Left.between(Position::Top).unwrap(), Position::TopLeft);
        assert_eq!(
            Position::Top.between(Position::Bottom),
            Err(PositionError::NotTwoApart(Position::Top, Position::Bottom))
        );
    }

    #[test]
    fn bottom_left_toward_right_is_bottom_right() {
        assert_eq!(
            Position::BottomLeft.after_moving_towards(Position::Right),
            Position::BottomRight
        );
    }

    #[test]
    fn after_moving_towards_preserves_category() {
        for from in Position::ALL {
            for toward in Position::ALL {
                assert_eq!(
                    from.after_moving_towards(toward).is_corner(),
                    from.is_corner()
                );
            }
        }
    }

    #[test]
    fn typed_corner_move_matches_formula() {
        for corner in Corner::ALL {
            for side in Side::ALL {
                let typed = Position::from(corner.after_moving_towards(side));
                let raw = Position::from(corner).after_moving_towards(side.into());
                assert_eq!(typed, raw, "{corner} toward {side}");
            }
        }
    }

    #[test]
    fn side_adjacency_to_corners() {
        for corner in Corner::ALL {
            let touching: Vec<Side> = Side::ALL
                .into_iter()
                .filter(|s| s.is_adjacent_to(corner))
                .collect();
            assert_eq!(touching.len(), 2);
            for side in corner.sides() {
                assert!(touching.contains(&side));
            }
        }
    }

    #[test]
    fn typed_conversions() {
        assert_eq!(Corner::try_from(Position::TopRight).unwrap(), Corner::TopRight);
        assert_eq!(
            Corner::try_from(Position::Top),
            Err(PositionError::NotACorner(Position::Top))
        );
        assert_eq!(Side::try_from(Position::Left).unwrap(), Side::Left);
        assert_eq!(
            Side::try_from(Position::BottomLeft),
            Err(PositionError::NotASide(Position::BottomLeft))
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(Position::BottomRight.to_string(), "bottom-right");
        assert_eq!(Side::Top.to_string(), "top");
        assert_eq!(Corner::BottomLeft.to_string(), "bottom-left");
    }
}
