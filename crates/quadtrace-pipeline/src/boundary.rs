//! Boundary segments between differently colored leaves.
//!
//! Every pair of adjacent leaves with different colors contributes one
//! axis-aligned segment along their shared edge. Segments on the same
//! line with the same color pair are then merged into maximal runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adjacency::{AdjacencyMap, AdjacencyPair, adjacency_pairs};
use crate::color::Color;
use crate::position::Side;
pub use crate::types::GridPoint;

/// Direction a segment runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    /// Runs left to right; `y` is constant.
    Horizontal,
    /// Runs top to bottom; `x` is constant.
    Vertical,
}

/// An axis-aligned lattice segment from `start` to `end`.
///
/// Segments built by this module always run left to right or top to
/// bottom, so `start <= end` componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    pub start: GridPoint,
    pub end: GridPoint,
}

impl Segment {
    /// Horizontal segment on row `y` from `x0` to `x1`.
    #[must_use]
    pub const fn horizontal(y: u32, x0: u32, x1: u32) -> Self {
        Self {
            start: GridPoint::new(x0, y),
            end: GridPoint::new(x1, y),
        }
    }

    /// Vertical segment on column `x` from `y0` to `y1`.
    #[must_use]
    pub const fn vertical(x: u32, y0: u32, y1: u32) -> Self {
        Self {
            start: GridPoint::new(x, y0),
            end: GridPoint::new(x, y1),
        }
    }

    /// Orientation of the segment. Zero-length segments count as
    /// horizontal.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        if self.start.y == self.end.y {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Length in pixels.
    #[must_use]
    pub const fn length(self) -> u32 {
        self.start.x.abs_diff(self.end.x) + self.start.y.abs_diff(self.end.y)
    }

    /// Constant coordinate: `y` for horizontal, `x` for vertical.
    const fn perpendicular(self) -> u32 {
        match self.orientation() {
            Orientation::Horizontal => self.start.y,
            Orientation::Vertical => self.start.x,
        }
    }

    /// Extent along the running axis.
    const fn extent(self) -> (u32, u32) {
        match self.orientation() {
            Orientation::Horizontal => (self.start.x, self.end.x),
            Orientation::Vertical => (self.start.y, self.end.y),
        }
    }
}

/// A segment tagged with the colors on either side of it.
///
/// `before` is the color above a horizontal segment or left of a
/// vertical one; `after` is the color on the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundarySegment {
    pub segment: Segment,
    pub before: Color,
    pub after: Color,
}

/// Convert one adjacency pair into its boundary segment.
///
/// Returns `None` when both leaves have the same color. The segment is
/// the full edge of `pair.from` on `pair.side`.
#[must_use]
pub fn segment_from_pair(pair: &AdjacencyPair<Color>) -> Option<BoundarySegment> {
    if pair.from_value == pair.to_value {
        return None;
    }
    let r = pair.from;
    let (inside, outside) = (pair.from_value, pair.to_value);
    let (segment, before, after) = match pair.side {
        Side::Top => (Segment::horizontal(r.y, r.x, r.right()), outside, inside),
        Side::Bottom => (Segment::horizontal(r.bottom(), r.x, r.right()), inside, outside),
        Side::Left => (Segment::vertical(r.x, r.y, r.bottom()), outside, inside),
        Side::Right => (Segment::vertical(r.right(), r.y, r.bottom()), inside, outside),
    };
    Some(BoundarySegment {
        segment,
        before,
        after,
    })
}

/// Segments for every differently colored pair, in pair order.
#[must_use]
pub fn segments_from_pairs(pairs: &[AdjacencyPair<Color>]) -> Vec<BoundarySegment> {
    pairs.iter().filter_map(segment_from_pair).collect()
}

/// Merge collinear segments that share a color pair and meet end to
/// start.
///
/// Segments are grouped by orientation, perpendicular coordinate and
/// color pair. Each group is sorted by start and swept once. Horizontal
/// groups come before vertical ones in the output.
#[must_use]
pub fn consolidate_segments(segments: &[BoundarySegment]) -> Vec<BoundarySegment> {
    let mut groups: BTreeMap<(Orientation, u32, Color, Color), Vec<(u32, u32)>> = BTreeMap::new();
    for s in segments {
        groups
            .entry((s.segment.orientation(), s.segment.perpendicular(), s.before, s.after))
            .or_default()
            .push(s.segment.extent());
    }

    let mut out = Vec::with_capacity(segments.len());
    for ((orientation, at, before, after), mut runs) in groups {
        runs.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(runs.len());
        for (start, end) in runs {
            match merged.last_mut() {
                Some(last) if last.1 == start => last.1 = end,
                _ => merged.push((start, end)),
            }
        }
        out.extend(merged.into_iter().map(|(start, end)| {
            let segment = match orientation {
                Orientation::Horizontal => Segment::horizontal(at, start, end),
                Orientation::Vertical => Segment::vertical(at, start, end),
            };
            BoundarySegment {
                segment,
                before,
                after,
            }
        }));
    }
    out
}

/// Boundary segments of an adjacency map: pairs, then consolidation.
#[must_use]
pub fn extract_boundaries(map: &AdjacencyMap<Color>) -> Vec<BoundarySegment> {
    let pairs = adjacency_pairs(map);
    let raw = segments_from_pairs(&pairs);
    let merged = consolidate_segments(&raw);
    tracing::debug!(
        "boundary: {} pairs, {} raw segments, {} after consolidation",
        pairs.len(),
        raw.len(),
        merged.len()
    );
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::adjacency::resolve_adjacencies;
    use crate::color::{ColorGrid, ColorSource};
    use crate::quadtree::QuadTree;
    use crate::region::Region;

    const A: Color = Color::new(220, 0, 0);
    const B: Color = Color::new(0, 0, 220);

    fn boundaries(grid: &ColorGrid) -> Vec<BoundarySegment> {
        let tree = QuadTree::from_source(grid, false);
        extract_boundaries(&resolve_adjacencies(&tree).unwrap())
    }

    /// Every unit pixel edge separating two different colors.
    fn unit_boundary_edges(grid: &ColorGrid) -> HashSet<Segment> {
        let mut edges = HashSet::new();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let c = grid.color_at(x, y);
                if x + 1 < grid.width() && grid.color_at(x + 1, y) != c {
                    edges.insert(Segment::vertical(x + 1, y, y + 1));
                }
                if y + 1 < grid.height() && grid.color_at(x, y + 1) != c {
                    edges.insert(Segment::horizontal(y + 1, x, x + 1));
                }
            }
        }
        edges
    }

    fn explode(segments: &[BoundarySegment]) -> Vec<Segment> {
        segments
            .iter()
            .flat_map(|s| {
                let seg = s.segment;
                let (start, end) = seg.extent();
                (start..end).map(move |i| match seg.orientation() {
                    Orientation::Horizontal => Segment::horizontal(seg.start.y, i, i + 1),
                    Orientation::Vertical => Segment::vertical(seg.start.x, i, i + 1),
                })
            })
            .collect()
    }

    fn pair(from: Region, side: Side, to: Region) -> AdjacencyPair<Color> {
        AdjacencyPair {
            from,
            from_value: A,
            to,
            to_value: B,
            side,
        }
    }

    #[test]
    fn pair_segments_follow_from_edge() {
        let r = Region::new(2, 2, 2, 2);
        let right = segment_from_pair(&pair(r, Side::Right, Region::new(4, 2, 2, 2))).unwrap();
        assert_eq!(right.segment, Segment::vertical(4, 2, 4));
        assert_eq!((right.before, right.after), (A, B));

        let top = segment_from_pair(&pair(r, Side::Top, Region::new(2, 0, 2, 2))).unwrap();
        assert_eq!(top.segment, Segment::horizontal(2, 2, 4));
        assert_eq!((top.before, top.after), (B, A));

        let left = segment_from_pair(&pair(r, Side::Left, Region::new(0, 2, 2, 2))).unwrap();
        assert_eq!(left.segment, Segment::vertical(2, 2, 4));
        assert_eq!((left.before, left.after), (B, A));

        let bottom = segment_from_pair(&pair(r, Side::Bottom, Region::new(2, 4, 2, 2))).unwrap();
        assert_eq!(bottom.segment, Segment::horizontal(4, 2, 4));
        assert_eq!((bottom.before, bottom.after), (A, B));
    }

    #[test]
    fn same_color_pair_is_skipped() {
        let mut p = pair(Region::new(0, 0, 1, 1), Side::Right, Region::new(1, 0, 1, 1));
        p.to_value = A;
        assert_eq!(segment_from_pair(&p), None);
    }

    #[test]
    fn consolidation_merges_touching_runs_only() {
        let seg = |x0, x1| BoundarySegment {
            segment: Segment::horizontal(3, x0, x1),
            before: A,
            after: B,
        };
        let flipped = BoundarySegment {
            segment: Segment::horizontal(3, 4, 6),
            before: B,
            after: A,
        };
        let merged = consolidate_segments(&[seg(2, 4), seg(0, 2), seg(5, 7), flipped]);
        let spans: Vec<_> = merged.iter().map(|s| (s.segment, s.before)).collect();
        assert!(spans.contains(&(Segment::horizontal(3, 0, 4), A)));
        assert!(spans.contains(&(Segment::horizontal(3, 5, 7), A)));
        assert!(spans.contains(&(Segment::horizontal(3, 4, 6), B)));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn horizontal_groups_come_first() {
        let v = BoundarySegment {
            segment: Segment::vertical(0, 0, 1),
            before: A,
            after: B,
        };
        let h = BoundarySegment {
            segment: Segment::horizontal(9, 0, 1),
            before: A,
            after: B,
        };
        let merged = consolidate_segments(&[v, h]);
        assert_eq!(merged[0].segment.orientation(), Orientation::Horizontal);
        assert_eq!(merged[1].segment.orientation(), Orientation::Vertical);
    }

    #[test]
    fn uniform_image_has_no_boundaries() {
        assert!(boundaries(&ColorGrid::filled(9, 6, A)).is_empty());
    }

    #[test]
    fn quadrant_image_has_one_cross() {
        let grid = ColorGrid::from_fn(4, 4, |x, y| if (x < 2) == (y < 2) { A } else { B });
        let segments = boundaries(&grid);
        let set: HashSet<Segment> = segments.iter().map(|s| s.segment).collect();
        let expected: HashSet<Segment> = [
            Segment::horizontal(2, 0, 2),
            Segment::horizontal(2, 2, 4),
            Segment::vertical(2, 0, 2),
            Segment::vertical(2, 2, 4),
        ]
        .into_iter()
        .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn segments_cover_every_boundary_edge_once() {
        for (w, h) in [(7, 5), (12, 9), (1, 6), (16, 16)] {
            let grid = ColorGrid::from_fn(w, h, |x, y| {
                if (x * x + y * 3) % 7 < 3 { A } else { B }
            });
            let segments = boundaries(&grid);
            let units = explode(&segments);
            let unique: HashSet<Segment> = units.iter().copied().collect();
            assert_eq!(unique.len(), units.len(), "duplicate edge for {w}x{h}");
            assert_eq!(unique, unit_boundary_edges(&grid), "coverage for {w}x{h}");
        }
    }

    #[test]
    fn before_is_above_or_left() {
        let grid = ColorGrid::from_fn(6, 6, |x, y| if x >= 3 || y >= 4 { B } else { A });
        for s in boundaries(&grid) {
            let (x, y) = (s.segment.start.x, s.segment.start.y);
            match s.segment.orientation() {
                Orientation::Horizontal => {
                    assert_eq!(grid.color_at(x, y - 1), s.before);
                    assert_eq!(grid.color_at(x, y), s.after);
                }
                Orientation::Vertical => {
                    assert_eq!(grid.color_at(x - 1, y), s.before);
                    assert_eq!(grid.color_at(x, y), s.after);
                }
            }
        }
    }
}
