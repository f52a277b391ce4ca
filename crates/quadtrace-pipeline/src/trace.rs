//! Chain tracing: decompose the point graph into simple paths and loops.
//!
//! Walks start at junctions (points whose degree is not two) and follow
//! the only unconsumed edge until they reach another junction. Whatever
//! is left afterwards has no junctions at all, so it falls apart into
//! closed loops, each walked from an arbitrary point back to itself.

use serde::{Deserialize, Serialize};

use crate::fit::CubicBezier;
use crate::graph::{GraphError, PointGraph};
use crate::types::GridPoint;

/// One traced boundary chain and what later stages derive from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPiece {
    /// Every point walked, in order.
    pub chain: Vec<GridPoint>,
    /// Whether the chain ends where it starts.
    pub is_loop: bool,
    /// Critical points kept by simplification; same ends as `chain`.
    pub simplified: Vec<GridPoint>,
    /// One cubic per section between consecutive critical points.
    pub curves: Vec<CubicBezier>,
}

impl BoundaryPiece {
    /// A freshly traced chain with nothing derived yet.
    #[must_use]
    pub fn new(chain: Vec<GridPoint>) -> Self {
        let is_loop = chain.len() > 1 && chain.first() == chain.last();
        Self {
            chain,
            is_loop,
            simplified: Vec::new(),
            curves: Vec::new(),
        }
    }

    /// Number of graph edges the chain consumed.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }
}

/// Decompose `graph` into chains, consuming every edge exactly once.
///
/// Junctions are classified once, up front, so a junction stays a walk
/// terminator even after some of its edges are consumed.
///
/// # Errors
///
/// Returns [`GraphError::DeadEnd`] if a walk enters a point with no
/// remaining edge, which a consistent graph never produces.
pub fn trace_chains(mut graph: PointGraph) -> Result<Vec<BoundaryPiece>, GraphError> {
    let total_edges = graph.edge_count();
    let mut junctions = graph.junctions();
    junctions.sort_unstable();

    let mut pieces = Vec::new();
    for &start in &junctions {
        while graph.degree(start) > 0 {
            let mut chain = vec![start];
            let mut current = graph.take_next(start)?;
            chain.push(current);
            while junctions.binary_search(&current).is_err() {
                current = graph.take_next(current)?;
                chain.push(current);
            }
            pieces.push(BoundaryPiece::new(chain));
        }
    }
    let junction_chains = pieces.len();

    while let Some(start) = graph.any_point() {
        let mut chain = vec![start];
        let mut current = graph.take_next(start)?;
        chain.push(current);
        while current != start {
            current = graph.take_next(current)?;
            chain.push(current);
        }
        pieces.push(BoundaryPiece::new(chain));
    }

    tracing::debug!(
        "trace: {} edges -> {} junction chains, {} loops",
        total_edges,
        junction_chains,
        pieces.len() - junction_chains
    );
    Ok(pieces)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::adjacency::resolve_adjacencies;
    use crate::boundary::{BoundarySegment, Segment, extract_boundaries};
    use crate::color::{Color, ColorGrid};
    use crate::quadtree::QuadTree;

    const A: Color = Color::new(0, 0, 0);
    const B: Color = Color::new(255, 255, 255);
    const C: Color = Color::new(0, 128, 0);

    fn graph_of(grid: &ColorGrid, subdivision_length: u32) -> PointGraph {
        let tree = QuadTree::from_source(grid, false);
        let segments = extract_boundaries(&resolve_adjacencies(&tree).unwrap());
        PointGraph::from_segments(&segments, subdivision_length).unwrap()
    }

    fn undirected(a: GridPoint, b: GridPoint) -> (GridPoint, GridPoint) {
        if a <= b { (a, b) } else { (b, a) }
    }

    fn assert_exact_cover(graph: &PointGraph, pieces: &[BoundaryPiece]) {
        let original: HashSet<_> = graph.edges().map(|(a, b)| undirected(a, b)).collect();
        let mut walked = HashSet::new();
        for piece in pieces {
            for w in piece.chain.windows(2) {
                assert!(walked.insert(undirected(w[0], w[1])), "edge walked twice");
            }
        }
        assert_eq!(walked, original);
        let total: usize = pieces.iter().map(BoundaryPiece::edge_count).sum();
        assert_eq!(total, graph.edge_count());
    }

    #[test]
    fn island_is_one_loop() {
        let grid = ColorGrid::from_fn(8, 8, |x, y| {
            if (2..6).contains(&x) && (2..6).contains(&y) { B } else { A }
        });
        let graph = graph_of(&grid, 4);
        let pieces = trace_chains(graph.clone()).unwrap();
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].is_loop);
        assert_eq!(pieces[0].chain.first(), pieces[0].chain.last());
        assert_exact_cover(&graph, &pieces);
    }

    #[test]
    fn split_image_is_one_open_chain() {
        let grid = ColorGrid::from_fn(6, 4, |x, _| if x < 3 { A } else { B });
        let graph = graph_of(&grid, 10);
        let pieces = trace_chains(graph.clone()).unwrap();
        assert_eq!(pieces.len(), 1);
        assert!(!pieces[0].is_loop);
        let ends: HashSet<_> = [pieces[0].chain[0], *pieces[0].chain.last().unwrap()].into();
        assert_eq!(ends, [GridPoint::new(3, 0), GridPoint::new(3, 4)].into());
    }

    #[test]
    fn three_colors_meet_at_branch_point() {
        let grid = ColorGrid::from_fn(8, 8, |x, y| match (x < 4, y < 4) {
            (true, true) => A,
            (false, true) => B,
            _ => C,
        });
        let graph = graph_of(&grid, 2);
        let pieces = trace_chains(graph.clone()).unwrap();
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| !p.is_loop));
        let branch = GridPoint::new(4, 4);
        assert!(pieces.iter().all(|p| p.chain[0] == branch || p.chain.last() == Some(&branch)));
        assert_exact_cover(&graph, &pieces);
    }

    #[test]
    fn chain_through_junction_closes_on_itself() {
        // A loop hanging off a branch point: walking out of the branch
        // returns to it.
        let segments = [
            Segment::horizontal(0, 0, 2),
            Segment::vertical(2, 0, 2),
            Segment::horizontal(2, 0, 2),
            Segment::vertical(0, 0, 2),
            Segment::horizontal(0, 2, 5),
        ]
        .map(|segment| BoundarySegment {
            segment,
            before: A,
            after: B,
        });
        let graph = PointGraph::from_segments(&segments, 8).unwrap();
        let pieces = trace_chains(graph.clone()).unwrap();
        assert_exact_cover(&graph, &pieces);
        assert_eq!(pieces.iter().filter(|p| p.is_loop).count(), 1);
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn noisy_image_traces_every_edge_once() {
        let grid = ColorGrid::from_fn(24, 17, |x, y| match (x * 5 + y * y + x * y) % 7 {
            0..=2 => A,
            3 | 4 => B,
            _ => C,
        });
        let graph = graph_of(&grid, 3);
        graph.validate().unwrap();
        let pieces = trace_chains(graph.clone()).unwrap();
        assert_exact_cover(&graph, &pieces);
        for piece in &pieces {
            assert_eq!(piece.is_loop, piece.chain.first() == piece.chain.last());
        }
    }

    #[test]
    fn empty_graph_has_no_chains() {
        assert!(trace_chains(PointGraph::new()).unwrap().is_empty());
    }
}
