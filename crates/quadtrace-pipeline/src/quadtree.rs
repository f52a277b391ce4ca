//! Region quadtree: recursive partition of an image into uniform,
//! mixed, and empty regions.
//!
//! The tree is built bottom-up. Every region of two or more pixels is
//! split with [`Region::subdivide`], the four children are built, and the
//! parent collapses to a single [`QuadTree::Homogeneous`] leaf whenever
//! all of its non-degenerate children are homogeneous with one value.

use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorSource};
use crate::region::{Quadrants, Region};

/// Regions with at least this many pixels build their four children on
/// the rayon pool when parallel construction is enabled. Smaller regions
/// recurse on the current thread.
pub const PARALLEL_MIN_AREA: u64 = 64 * 64;

/// A quadtree node over a [`Region`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadTree<T> {
    /// Every pixel in the region has `value`. Always a leaf.
    Homogeneous { region: Region, value: T },

    /// The region mixes values; its four quadrants are kept verbatim.
    Heterogeneous {
        region: Region,
        children: Box<Quadrants<QuadTree<T>>>,
    },

    /// Zero-area placeholder produced by subdividing an odd or unit
    /// dimension. Carries no value.
    Degenerate { region: Region },
}

impl<T> QuadTree<T> {
    /// The region this node covers.
    #[must_use]
    pub const fn region(&self) -> Region {
        match self {
            Self::Homogeneous { region, .. }
            | Self::Heterogeneous { region, .. }
            | Self::Degenerate { region } => *region,
        }
    }

    /// The uniform value, if this node is homogeneous.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Homogeneous { value, .. } => Some(value),
            Self::Heterogeneous { .. } | Self::Degenerate { .. } => None,
        }
    }

    /// The four children, if this node is heterogeneous.
    #[must_use]
    pub fn children(&self) -> Option<&Quadrants<Self>> {
        match self {
            Self::Heterogeneous { children, .. } => Some(children),
            Self::Homogeneous { .. } | Self::Degenerate { .. } => None,
        }
    }

    /// Whether this node is degenerate.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate { .. })
    }

    /// Visit every node in pre-order (parent before its children, children
    /// clockwise from the top-left).
    pub fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a Self)) {
        visitor(self);
        if let Self::Heterogeneous { children, .. } = self {
            for (_, child) in children.iter() {
                child.visit(visitor);
            }
        }
    }

    /// Pre-order traversal dispatching on the node kind.
    pub fn traverse<'a>(
        &'a self,
        on_heterogeneous: &mut impl FnMut(Region, &'a Quadrants<Self>),
        on_homogeneous: &mut impl FnMut(Region, &'a T),
        on_degenerate: &mut impl FnMut(Region),
    ) {
        match self {
            Self::Heterogeneous { region, children } => {
                on_heterogeneous(*region, children);
                for (_, child) in children.iter() {
                    child.traverse(on_heterogeneous, on_homogeneous, on_degenerate);
                }
            }
            Self::Homogeneous { region, value } => on_homogeneous(*region, value),
            Self::Degenerate { region } => on_degenerate(*region),
        }
    }

    /// Every homogeneous leaf in pre-order, paired with its region.
    #[must_use]
    pub fn leaves(&self) -> Vec<(Region, &T)> {
        let mut out = Vec::new();
        self.traverse(&mut |_, _| {}, &mut |r, v| out.push((r, v)), &mut |_| {});
        out
    }

    /// Node counts and depth.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.accumulate_stats(0, &mut stats);
        stats
    }

    fn accumulate_stats(&self, depth: usize, stats: &mut TreeStats) {
        stats.depth = stats.depth.max(depth);
        match self {
            Self::Homogeneous { .. } => stats.homogeneous += 1,
            Self::Degenerate { .. } => stats.degenerate += 1,
            Self::Heterogeneous { children, .. } => {
                stats.heterogeneous += 1;
                for (_, child) in children.iter() {
                    child.accumulate_stats(depth + 1, stats);
                }
            }
        }
    }
}

impl<T: Clone + PartialEq + Send> QuadTree<T> {
    /// Build the tree covering `region` by sampling `sample(x, y)`.
    ///
    /// `sample` must be deterministic. With `parallel` set, large regions
    /// build their quadrants concurrently; the result is identical to a
    /// sequential build.
    pub fn build<F>(region: Region, sample: &F, parallel: bool) -> Self
    where
        F: Fn(u32, u32) -> T + Sync,
    {
        if region.is_degenerate() {
            return Self::Degenerate { region };
        }
        if region.is_unit() {
            return Self::Homogeneous {
                region,
                value: sample(region.x, region.y),
            };
        }

        let quadrants = region.subdivide();
        let children = if parallel && region.area() >= PARALLEL_MIN_AREA {
            let ((top_left, top_right), (bottom_right, bottom_left)) = rayon::join(
                || {
                    rayon::join(
                        || Self::build(quadrants.top_left, sample, parallel),
                        || Self::build(quadrants.top_right, sample, parallel),
                    )
                },
                || {
                    rayon::join(
                        || Self::build(quadrants.bottom_right, sample, parallel),
                        || Self::build(quadrants.bottom_left, sample, parallel),
                    )
                },
            );
            Quadrants {
                top_left,
                top_right,
                bottom_right,
                bottom_left,
            }
        } else {
            quadrants.map(|q| Self::build(q, sample, parallel))
        };

        Self::collapse(region, children)
    }

    /// Join four built quadrants into one node, merging them into a
    /// homogeneous leaf when they agree.
    ///
    /// The top-left quadrant of a non-degenerate region is never
    /// degenerate, so it supplies the candidate value.
    #[must_use]
    pub fn collapse(region: Region, children: Quadrants<Self>) -> Self {
        if let Self::Homogeneous { value, .. } = &children.top_left {
            let uniform = children.iter().all(|(_, child)| match child {
                Self::Degenerate { .. } => true,
                Self::Homogeneous { value: other, .. } => other == value,
                Self::Heterogeneous { .. } => false,
            });
            if uniform {
                return Self::Homogeneous {
                    region,
                    value: value.clone(),
                };
            }
        }
        Self::Heterogeneous {
            region,
            children: Box::new(children),
        }
    }
}

impl QuadTree<Color> {
    /// Build the color tree covering the whole of `source`.
    pub fn from_source<S: ColorSource + ?Sized>(source: &S, parallel: bool) -> Self {
        let dims = source.dimensions();
        Self::build(
            Region::new(0, 0, dims.width, dims.height),
            &|x, y| source.color_at(x, y),
            parallel,
        )
    }
}

/// Node counts for a [`QuadTree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub homogeneous: usize,
    pub heterogeneous: usize,
    pub degenerate: usize,
    /// Depth of the deepest node (the root is depth 0).
    pub depth: usize,
}
