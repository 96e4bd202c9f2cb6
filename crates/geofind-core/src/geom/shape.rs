//! The shape capability consumed by [`ShapeIndex`](super::ShapeIndex).
//!
//! A shape is a read-only collection of edges. The only geometry this crate
//! indexes is point sets, represented as *degenerate* edges whose endpoints
//! coincide, but the trait keeps the general vocabulary (chains, dimension,
//! reference point) so the index does not care what it is iterating over.
//!
//! Two implementations exist: [`PointVector`] holds its points in memory and
//! is what tests and small indexes use; the file-backed variant lives in the
//! spatial module because it is tied to the on-disk point store.

use super::Point;
use crate::error::Result;

/// An edge between two points on the sphere. Point shapes produce edges with
/// `v0 == v1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub v0: Point,
    pub v1: Point,
}

impl Edge {
    pub fn degenerate(p: Point) -> Edge {
        Edge { v0: p, v1: p }
    }
}

/// A contiguous run of edges within a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    pub start: usize,
    pub length: usize,
}

/// Position of an edge inside its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPosition {
    pub chain_id: usize,
    pub offset: usize,
}

/// Containment hint for the shape interior. Point sets have no interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePoint {
    pub contained: bool,
}

pub trait Shape {
    /// Number of edges in the shape.
    fn num_edges(&self) -> usize;

    /// The `i`-th edge. Fallible because a shape may be backed by a file.
    fn edge(&self, i: usize) -> Result<Edge>;

    /// Point shapes expose one single-edge chain per point.
    fn num_chains(&self) -> usize {
        self.num_edges()
    }

    fn chain(&self, i: usize) -> Chain {
        Chain {
            start: i,
            length: 1,
        }
    }

    fn chain_edge(&self, chain_id: usize, _offset: usize) -> Result<Edge> {
        self.edge(chain_id)
    }

    fn chain_position(&self, edge_id: usize) -> ChainPosition {
        ChainPosition {
            chain_id: edge_id,
            offset: 0,
        }
    }

    /// 0 for point sets, 1 for polylines, 2 for polygons.
    fn dimension(&self) -> u8 {
        0
    }

    fn is_empty(&self) -> bool {
        self.num_edges() == 0
    }

    fn is_full(&self) -> bool {
        false
    }

    fn reference_point(&self) -> ReferencePoint {
        ReferencePoint { contained: false }
    }
}

/// An in-memory point shape.
#[derive(Debug, Default)]
pub struct PointVector {
    points: Vec<Point>,
}

impl PointVector {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl Shape for PointVector {
    fn num_edges(&self) -> usize {
        self.points.len()
    }

    fn edge(&self, i: usize) -> Result<Edge> {
        Ok(Edge::degenerate(self.points[i]))
    }
}
