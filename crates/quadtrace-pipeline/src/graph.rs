//! Undirected point graph built from boundary segments.
//!
//! Vertices are lattice points and edges are pieces of boundary
//! segments. The graph is consumed destructively by chain tracing: every
//! walked edge is removed, and a vertex is dropped as soon as its last
//! edge goes.

use petgraph::graphmap::UnGraphMap;

use crate::boundary::{BoundarySegment, Segment};
use crate::types::GridPoint;

/// Inconsistencies in the point graph.
///
/// None of these can arise from well-formed boundary segments; they
/// indicate a bug in an earlier stage and abort the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two segments produced the same edge.
    #[error("duplicate edge {0} - {1}")]
    DuplicateEdge(GridPoint, GridPoint),

    /// A segment has zero length.
    #[error("zero-length segment at {0}")]
    DegenerateSegment(GridPoint),

    /// A segment that does not run rightward or downward along one axis.
    #[error("malformed segment {0} - {1}")]
    MalformedSegment(GridPoint, GridPoint),

    /// A vertex with no incident edge.
    #[error("isolated point {0}")]
    IsolatedPoint(GridPoint),

    /// An edge from a vertex to itself.
    #[error("self-loop at {0}")]
    SelfLoop(GridPoint),

    /// `a` lists `b` as a neighbor but not the other way around.
    #[error("asymmetric adjacency {0} -> {1}")]
    Asymmetric(GridPoint, GridPoint),

    /// A walk reached a point with no unconsumed edge left.
    #[error("walk reached dead end at {0}")]
    DeadEnd(GridPoint),
}

/// Undirected graph over boundary points.
#[derive(Debug, Clone, Default)]
pub struct PointGraph {
    graph: UnGraphMap<GridPoint, ()>,
}

impl PointGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from boundary segments, splitting long spans.
    ///
    /// A segment of length `L` becomes `ceil(L / subdivision_length)`
    /// edges of near-equal length, so every span longer than
    /// `subdivision_length` gains interior points for the fitter to
    /// sample.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateEdge`] if two segments overlap,
    /// [`GraphError::DegenerateSegment`] for a zero-length segment and
    /// [`GraphError::MalformedSegment`] for one that is reversed or not
    /// axis-aligned.
    pub fn from_segments(
        segments: &[BoundarySegment],
        subdivision_length: u32,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for s in segments {
            let points = subdivide_segment(s.segment, subdivision_length)?;
            if points.len() < 2 {
                return Err(GraphError::DegenerateSegment(s.segment.start));
            }
            for pair in points.windows(2) {
                graph.add_edge(pair[0], pair[1])?;
            }
        }
        Ok(graph)
    }

    /// Add an undirected edge.
    ///
    /// # Errors
    ///
    /// Rejects an edge that is already present or joins a point to
    /// itself.
    pub fn add_edge(&mut self, a: GridPoint, b: GridPoint) -> Result<(), GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        if self.graph.contains_edge(a, b) {
            return Err(GraphError::DuplicateEdge(a, b));
        }
        self.graph.add_edge(a, b, ());
        Ok(())
    }

    /// Check structural invariants: no isolated vertices, no self-loops,
    /// symmetric adjacency, and no repeated neighbor.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), GraphError> {
        for p in self.graph.nodes() {
            let mut neighbors: Vec<GridPoint> = self.graph.neighbors(p).collect();
            if neighbors.is_empty() {
                return Err(GraphError::IsolatedPoint(p));
            }
            neighbors.sort_unstable();
            for pair in neighbors.windows(2) {
                if pair[0] == pair[1] {
                    return Err(GraphError::DuplicateEdge(p, pair[0]));
                }
            }
            for q in neighbors {
                if q == p {
                    return Err(GraphError::SelfLoop(p));
                }
                if !self.graph.neighbors(q).any(|r| r == p) {
                    return Err(GraphError::Asymmetric(p, q));
                }
            }
        }
        Ok(())
    }

    /// Number of vertices.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether every edge has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Remaining edges at `p`; zero for an unknown point.
    #[must_use]
    pub fn degree(&self, p: GridPoint) -> usize {
        self.graph.neighbors(p).count()
    }

    /// Whether the edge `a - b` is present.
    #[must_use]
    pub fn contains_edge(&self, a: GridPoint, b: GridPoint) -> bool {
        self.graph.contains_edge(a, b)
    }

    /// Points whose degree is not two: dead ends and branch points.
    ///
    /// Returned in insertion order, which follows segment order.
    #[must_use]
    pub fn junctions(&self) -> Vec<GridPoint> {
        self.graph
            .nodes()
            .filter(|&p| self.degree(p) != 2)
            .collect()
    }

    /// Any point that still has an edge.
    #[must_use]
    pub fn any_point(&self) -> Option<GridPoint> {
        self.graph.nodes().find(|&p| self.degree(p) > 0)
    }

    /// Iterate over the remaining edges.
    pub fn edges(&self) -> impl Iterator<Item = (GridPoint, GridPoint)> + '_ {
        self.graph.all_edges().map(|(a, b, ())| (a, b))
    }

    /// Consume one edge at `from` and return the point it leads to.
    ///
    /// Endpoints left without edges are removed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DeadEnd`] if `from` has no edge left.
    pub fn take_next(&mut self, from: GridPoint) -> Result<GridPoint, GraphError> {
        let to = self
            .graph
            .neighbors(from)
            .next()
            .ok_or(GraphError::DeadEnd(from))?;
        self.graph.remove_edge(from, to);
        for p in [from, to] {
            if self.degree(p) == 0 {
                self.graph.remove_node(p);
            }
        }
        Ok(to)
    }
}

// ---------------------------------------------------------------------------
// Span subdivision
// ---------------------------------------------------------------------------

/// Lattice points along `segment`, endpoints included, with at most
/// `subdivision_length` between consecutive points.
///
/// `segment` must run left to right or top to bottom; every point then
/// lies between its ends.
fn subdivide_segment(
    segment: Segment,
    subdivision_length: u32,
) -> Result<Vec<GridPoint>, GraphError> {
    let Segment { start, end } = segment;
    let malformed = || GraphError::MalformedSegment(start, end);
    let horizontal = start.y == end.y && start.x <= end.x;
    if !horizontal && !(start.x == end.x && start.y <= end.y) {
        return Err(malformed());
    }
    let length = segment.length();
    if length == 0 {
        return Ok(vec![start]);
    }
    let pieces = length.div_ceil(subdivision_length.max(1));
    (0..=pieces)
        .map(|k| {
            let offset = u64::from(k) * u64::from(length) / u64::from(pieces);
            let offset = u32::try_from(offset).map_err(|_| malformed())?;
            Ok(if horizontal {
                GridPoint::new(start.x + offset, start.y)
            } else {
                GridPoint::new(start.x, start.y + offset)
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn boundary(segment: Segment) -> BoundarySegment {
        BoundarySegment {
            segment,
            before: Color::BLACK,
            after: Color::WHITE,
        }
    }

    fn square(side: u32, subdivision_length: u32) -> PointGraph {
        let segments = [
            Segment::horizontal(0, 0, side),
            Segment::horizontal(side, 0, side),
            Segment::vertical(0, 0, side),
            Segment::vertical(side, 0, side),
        ]
        .map(boundary);
        PointGraph::from_segments(&segments, subdivision_length).unwrap()
    }

    #[test]
    fn subdivision_inserts_interior_points() {
        let points = subdivide_segment(Segment::horizontal(3, 0, 10), 4).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points.first(), Some(&GridPoint::new(0, 3)));
        assert_eq!(points.last(), Some(&GridPoint::new(10, 3)));
        assert!(points.windows(2).all(|w| w[1].x - w[0].x <= 4 && w[1].x > w[0].x));
    }

    #[test]
    fn short_segment_is_one_edge() {
        let points = subdivide_segment(Segment::vertical(1, 2, 5), 4).unwrap();
        assert_eq!(points, vec![GridPoint::new(1, 2), GridPoint::new(1, 5)]);
    }

    #[test]
    fn reversed_or_diagonal_segments_are_rejected() {
        let reversed = Segment::horizontal(0, u32::MAX, 0);
        assert_eq!(
            PointGraph::from_segments(&[boundary(reversed)], 4).unwrap_err(),
            GraphError::MalformedSegment(GridPoint::new(u32::MAX, 0), GridPoint::new(0, 0))
        );
        let diagonal = Segment {
            start: GridPoint::new(0, 0),
            end: GridPoint::new(3, 3),
        };
        let err: crate::types::PipelineError = PointGraph::from_segments(&[boundary(diagonal)], 4)
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            crate::types::PipelineError::Graph(GraphError::MalformedSegment(..))
        ));
    }

    #[test]
    fn segment_at_the_lattice_edge_subdivides_exactly() {
        let points = subdivide_segment(Segment::vertical(0, u32::MAX - 10, u32::MAX), 4).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points.last(), Some(&GridPoint::new(0, u32::MAX)));
    }

    #[test]
    fn square_has_no_junctions() {
        let graph = square(8, 4);
        graph.validate().unwrap();
        assert_eq!(graph.edge_count(), 8);
        assert_eq!(graph.point_count(), 8);
        assert!(graph.junctions().is_empty());
    }

    #[test]
    fn duplicate_segment_rejected() {
        let s = boundary(Segment::horizontal(1, 0, 2));
        let err = PointGraph::from_segments(&[s, s], 4).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEdge(..)));
    }

    #[test]
    fn zero_length_segment_rejected() {
        let s = boundary(Segment::horizontal(1, 2, 2));
        assert_eq!(
            PointGraph::from_segments(&[s], 4).unwrap_err(),
            GraphError::DegenerateSegment(GridPoint::new(2, 1))
        );
    }

    #[test]
    fn take_next_consumes_edges_and_points() {
        let mut graph = PointGraph::new();
        let (a, b, c) = (GridPoint::new(0, 0), GridPoint::new(1, 0), GridPoint::new(2, 0));
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, c).unwrap();
        assert_eq!(graph.junctions(), vec![a, c]);

        assert_eq!(graph.take_next(a).unwrap(), b);
        assert_eq!(graph.degree(a), 0);
        assert_eq!(graph.point_count(), 2);
        assert_eq!(graph.take_next(b).unwrap(), c);
        assert!(graph.is_empty());
        assert_eq!(graph.point_count(), 0);
        assert_eq!(graph.take_next(c), Err(GraphError::DeadEnd(c)));
    }

    #[test]
    fn self_loop_rejected() {
        let mut graph = PointGraph::new();
        let p = GridPoint::new(4, 4);
        assert_eq!(graph.add_edge(p, p), Err(GraphError::SelfLoop(p)));
    }

    #[test]
    fn t_junction_has_three_dead_ends_and_a_branch() {
        let segments = [
            Segment::horizontal(2, 0, 2),
            Segment::horizontal(2, 2, 4),
            Segment::vertical(2, 2, 4),
        ]
        .map(boundary);
        let graph = PointGraph::from_segments(&segments, 8).unwrap();
        graph.validate().unwrap();
        let mut junctions = graph.junctions();
        junctions.sort_unstable();
        assert_eq!(
            junctions,
            vec![
                GridPoint::new(0, 2),
                GridPoint::new(2, 2),
                GridPoint::new(2, 4),
                GridPoint::new(4, 2)
            ]
        );
        assert_eq!(graph.degree(GridPoint::new(2, 2)), 3);
    }
}
