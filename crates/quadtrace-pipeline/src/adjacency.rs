//! Adjacency resolution: the neighbor of every quadtree leaf on each of
//! its four sides.
//!
//! The resolver walks the tree top-down carrying the parent's neighbors.
//! For a child in corner `c`, a side that does not touch `c` is internal
//! and its neighbor is the sibling reached by
//! [`Corner::after_moving_towards`]. A side that does touch `c` leaves the
//! parent, so the child inherits the parent's neighbor on that side,
//! descending one level into it when that neighbor is itself subdivided.
//! Each level is resolved exactly once, so the whole map costs one pass
//! over the tree.
//!
//! Degenerate quadrants need care. When the internal sibling across a
//! side has zero width or height, the real neighbor lies past it, outside
//! the parent. When the quadrant picked inside a subdivided neighbor is
//! degenerate, the one behind it (at the starting corner) is used.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::position::{Corner, Side};
use crate::quadtree::QuadTree;
use crate::region::Region;
use crate::types::Dimensions;

/// Errors found while resolving or validating adjacencies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdjacencyError {
    /// A degenerate node was resolved as a neighbor.
    #[error("degenerate region {neighbor:?} resolved on the {side} of {region:?}")]
    DegenerateNeighbor {
        region: Region,
        side: Side,
        neighbor: Region,
    },

    /// A region is used as a leaf but is not a homogeneous leaf of the tree.
    #[error("region {0:?} is not a homogeneous leaf of the tree")]
    NotALeaf(Region),

    /// A homogeneous leaf of the tree has no entry in the map.
    #[error("homogeneous leaf {0:?} is missing from the adjacency map")]
    MissingLeaf(Region),

    /// The image border was reported somewhere other than the image edge.
    #[error("border reported on the {side} of {region:?}, which is not at the image edge")]
    BorderInsideImage { region: Region, side: Side },

    /// A neighbor does not share the full edge on that side.
    #[error("{neighbor:?} does not abut the {side} of {region:?}")]
    NotAbutting {
        region: Region,
        side: Side,
        neighbor: Region,
    },
}

/// What lies across one side of a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Neighbor<T> {
    /// The image edge.
    Border,

    /// A homogeneous leaf whose edge covers this whole side.
    Leaf { region: Region, value: T },

    /// A subdivided node covering this whole side. The finer leaves
    /// inside it that touch this side report this leaf as their own
    /// neighbor.
    Subdivided { region: Region },
}

impl<T> Neighbor<T> {
    /// Region of the neighbor, if it is not the border.
    #[must_use]
    pub const fn region(&self) -> Option<Region> {
        match self {
            Self::Border => None,
            Self::Leaf { region, .. } | Self::Subdivided { region } => Some(*region),
        }
    }

    /// Whether this is the image edge.
    #[must_use]
    pub const fn is_border(&self) -> bool {
        matches!(self, Self::Border)
    }
}

/// One value per side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacencies<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T> Adjacencies<T> {
    /// Build by calling `f` once per side, clockwise from the top.
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self {
            top: f(Side::Top),
            right: f(Side::Right),
            bottom: f(Side::Bottom),
            left: f(Side::Left),
        }
    }

    /// Fallible form of [`from_fn`](Self::from_fn).
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_from_fn<E>(mut f: impl FnMut(Side) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            top: f(Side::Top)?,
            right: f(Side::Right)?,
            bottom: f(Side::Bottom)?,
            left: f(Side::Left)?,
        })
    }

    /// The value on `side`.
    #[must_use]
    pub const fn get(&self, side: Side) -> &T {
        match side {
            Side::Top => &self.top,
            Side::Right => &self.right,
            Side::Bottom => &self.bottom,
            Side::Left => &self.left,
        }
    }

    /// Pair each value with its side, clockwise from the top.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

/// A leaf's value together with its four neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafAdjacency<T> {
    pub value: T,
    pub neighbors: Adjacencies<Neighbor<T>>,
}

/// Adjacencies of every homogeneous leaf, keyed by the leaf's region.
///
/// Non-degenerate nodes tile the image and every child is strictly
/// smaller than its parent, so a region identifies exactly one node.
pub type AdjacencyMap<T> = BTreeMap<Region, LeafAdjacency<T>>;

/// A neighbor while walking the tree, borrowing the node it points at.
enum Incoming<'a, T> {
    Border,
    Node(&'a QuadTree<T>),
}

impl<T> Clone for Incoming<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Incoming<'_, T> {}

/// Resolve the four neighbors of every homogeneous leaf in `tree`.
///
/// The root sees the image border on every side.
///
/// # Errors
///
/// Returns [`AdjacencyError::DegenerateNeighbor`] if a degenerate node
/// would be recorded as a neighbor, which only happens for a malformed
/// tree.
pub fn resolve_adjacencies<T: Clone>(
    tree: &QuadTree<T>,
) -> Result<AdjacencyMap<T>, AdjacencyError> {
    let mut map = BTreeMap::new();
    let border = Adjacencies::from_fn(|_| Incoming::Border);
    resolve_node(tree, &border, &mut map)?;
    tracing::debug!("resolved adjacencies for {} leaves", map.len());
    Ok(map)
}

fn resolve_node<'a, T: Clone>(
    node: &'a QuadTree<T>,
    incoming: &Adjacencies<Incoming<'a, T>>,
    map: &mut AdjacencyMap<T>,
) -> Result<(), AdjacencyError> {
    match node {
        QuadTree::Degenerate { .. } => Ok(()),
        QuadTree::Homogeneous { region, value } => {
            let neighbors =
                Adjacencies::try_from_fn(|side| settle(*region, side, *incoming.get(side)))?;
            map.insert(
                *region,
                LeafAdjacency {
                    value: value.clone(),
                    neighbors,
                },
            );
            Ok(())
        }
        QuadTree::Heterogeneous { children, .. } => {
            for (corner, child) in children.iter() {
                let child_incoming = Adjacencies::from_fn(|side| {
                    if side.is_adjacent_to(corner) {
                        external(corner, side, incoming)
                    } else {
                        let sibling = children.get(corner.after_moving_towards(side));
                        if sibling.is_degenerate() {
                            // Step past the empty sibling; the walk now
                            // starts from its corner.
                            external(corner.after_moving_towards(side), side, incoming)
                        } else {
                            Incoming::Node(sibling)
                        }
                    }
                });
                resolve_node(child, &child_incoming, map)?;
            }
            Ok(())
        }
    }
}

/// Neighbor on `side` of the child at `start`, found outside the parent.
fn external<'a, T>(
    start: Corner,
    side: Side,
    parent: &Adjacencies<Incoming<'a, T>>,
) -> Incoming<'a, T> {
    match *parent.get(side) {
        Incoming::Node(QuadTree::Heterogeneous { children, .. }) => {
            let first = children.get(start.after_moving_towards(side));
            if first.is_degenerate() {
                // Moving toward the same side twice returns to `start`.
                Incoming::Node(children.get(start))
            } else {
                Incoming::Node(first)
            }
        }
        other => other,
    }
}

/// Convert a borrowed neighbor into its owned form.
fn settle<T: Clone>(
    region: Region,
    side: Side,
    incoming: Incoming<'_, T>,
) -> Result<Neighbor<T>, AdjacencyError> {
    match incoming {
        Incoming::Border => Ok(Neighbor::Border),
        Incoming::Node(QuadTree::Homogeneous { region: r, value }) => Ok(Neighbor::Leaf {
            region: *r,
            value: value.clone(),
        }),
        Incoming::Node(QuadTree::Heterogeneous { region: r, .. }) => {
            Ok(Neighbor::Subdivided { region: *r })
        }
        Incoming::Node(QuadTree::Degenerate { region: r }) => {
            Err(AdjacencyError::DegenerateNeighbor {
                region,
                side,
                neighbor: *r,
            })
        }
    }
}

/// Check the structural invariants of an adjacency map against its tree.
///
/// Every key must be a homogeneous leaf of `tree` and every leaf must be
/// a key. The border may only appear at the matching image edge. Every
/// other neighbor must touch the leaf along that side and cover the
/// leaf's whole edge, and a [`Neighbor::Leaf`] must itself be a leaf of
/// the tree.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_adjacencies<T>(
    tree: &QuadTree<T>,
    map: &AdjacencyMap<T>,
    dimensions: Dimensions,
) -> Result<(), AdjacencyError> {
    let leaves: BTreeSet<Region> = tree.leaves().into_iter().map(|(r, _)| r).collect();
    let image = Region::new(0, 0, dimensions.width, dimensions.height);

    for (region, entry) in map {
        if !leaves.contains(region) {
            return Err(AdjacencyError::NotALeaf(*region));
        }
        for (side, neighbor) in entry.neighbors.iter() {
            match neighbor {
                Neighbor::Border => {
                    if region.edge(side) != image.edge(side) {
                        return Err(AdjacencyError::BorderInsideImage {
                            region: *region,
                            side,
                        });
                    }
                }
                Neighbor::Leaf { region: other, .. } | Neighbor::Subdivided { region: other } => {
                    if other.is_degenerate() {
                        return Err(AdjacencyError::DegenerateNeighbor {
                            region: *region,
                            side,
                            neighbor: *other,
                        });
                    }
                    let (start, end) = region.span(side);
                    let (other_start, other_end) = other.span(side);
                    let abuts = other.edge(side.opposite()) == region.edge(side)
                        && other_start <= start
                        && end <= other_end;
                    if !abuts {
                        return Err(AdjacencyError::NotAbutting {
                            region: *region,
                            side,
                            neighbor: *other,
                        });
                    }
                    if matches!(neighbor, Neighbor::Leaf { .. }) && !leaves.contains(other) {
                        return Err(AdjacencyError::NotALeaf(*other));
                    }
                }
            }
        }
    }

    if let Some(missing) = leaves.iter().find(|r| !map.contains_key(r)) {
        return Err(AdjacencyError::MissingLeaf(*missing));
    }
    Ok(())
}

/// Two adjacent leaves and the side of `from` they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyPair<T> {
    pub from: Region,
    pub from_value: T,
    pub to: Region,
    pub to_value: T,
    pub side: Side,
}

/// Flatten the map into one pair per shared leaf edge.
///
/// A pair is always emitted from the leaf whose edge is shorter or equal,
/// so the pair's segment is exactly `from`'s edge. When `to` reports
/// `from` back on the opposite side the two edges are equal and only the
/// `Right`/`Bottom` direction is kept; otherwise `to` sees a subdivided
/// ancestor of `from` and will never emit the pair itself.
#[must_use]
pub fn adjacency_pairs<T: Clone>(map: &AdjacencyMap<T>) -> Vec<AdjacencyPair<T>> {
    let mut pairs = Vec::new();
    for (from, entry) in map {
        for (side, neighbor) in entry.neighbors.iter() {
            let Neighbor::Leaf { region: to, value } = neighbor else {
                continue;
            };
            let mutual = map.get(to).is_some_and(|other| {
                matches!(
                    other.neighbors.get(side.opposite()),
                    Neighbor::Leaf { region, .. } if region == from
                )
            });
            if mutual && !matches!(side, Side::Right | Side::Bottom) {
                continue;
            }
            pairs.push(AdjacencyPair {
                from: *from,
                from_value: entry.value.clone(),
                to: *to,
                to_value: value.clone(),
                side,
            });
        }
    }
    pairs
}
