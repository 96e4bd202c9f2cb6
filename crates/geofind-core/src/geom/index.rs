//! Spatial index over shapes and the closest-edge query.
//!
//! [`ShapeIndex`] maps every edge of every registered shape to the leaf cell
//! of its first vertex and keeps the `(cell, shape, edge)` triples sorted by
//! cell id. Because a cell's descendants occupy one contiguous id range, the
//! set of edges inside any cell is a single slice of that sorted vector.
//!
//! [`ClosestEdgeQuery`] runs a best-first search over the implicit cell
//! tree: starting from the six face cells, it repeatedly expands the cell
//! with the smallest possible angular distance to the target (its bounding
//! cap gives an admissible lower bound) and scores actual edges once a cell
//! holds few enough of them. The search stops when the nearest unexplored
//! cell cannot beat the current k-th best result, which makes the returned
//! nearest neighbors exact, not approximate.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::cell::CellId;
use super::shape::Shape;
use super::{Angle, Point};
use crate::error::Result;

/// Identifier of a shape within a [`ShapeIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(pub u32);

/// Cells holding at most this many edges are scored exhaustively instead of
/// being subdivided further.
const MAX_LEAF_ENTRIES: usize = 8;

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    cell: CellId,
    shape: u32,
    edge: u32,
}

/// An ordered set of shapes supporting nearest-edge queries.
#[derive(Default)]
pub struct ShapeIndex {
    shapes: Vec<Box<dyn Shape + Send + Sync>>,
    entries: Vec<IndexEntry>,
}

impl ShapeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shape, indexing all of its edges. Returns the id the
    /// query results will refer to.
    pub fn add(&mut self, shape: Box<dyn Shape + Send + Sync>) -> Result<ShapeId> {
        let shape_id = self.shapes.len() as u32;
        let n = shape.num_edges();
        self.entries.reserve(n);
        for i in 0..n {
            let edge = shape.edge(i)?;
            self.entries.push(IndexEntry {
                cell: CellId::from_point(&edge.v0),
                shape: shape_id,
                edge: i as u32,
            });
        }
        self.shapes.push(shape);
        self.entries
            .sort_unstable_by_key(|e| (e.cell, e.shape, e.edge));
        Ok(ShapeId(shape_id))
    }

    pub fn shape(&self, id: ShapeId) -> &(dyn Shape + Send + Sync) {
        self.shapes[id.0 as usize].as_ref()
    }

    pub fn num_shapes(&self) -> usize {
        self.shapes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index range of the entries contained in `cell`, restricted to a known
    /// enclosing range.
    fn range_within(&self, cell: &CellId, lo: usize, hi: usize) -> (usize, usize) {
        let slice = &self.entries[lo..hi];
        let min = cell.range_min();
        let max = cell.range_max();
        let start = lo + slice.partition_point(|e| e.cell < min);
        let end = lo + slice.partition_point(|e| e.cell <= max);
        (start, end)
    }
}

/// Options for [`ClosestEdgeQuery`].
#[derive(Debug, Clone, Copy)]
pub struct ClosestEdgeOptions {
    max_results: usize,
    include_interiors: bool,
}

impl Default for ClosestEdgeOptions {
    fn default() -> Self {
        Self {
            max_results: 1,
            include_interiors: false,
        }
    }
}

impl ClosestEdgeOptions {
    pub fn max_results(mut self, n: usize) -> Self {
        self.max_results = n.max(1);
        self
    }

    /// Whether shape interiors count as distance zero. Point shapes have no
    /// interior, so this is accepted for API completeness and has no effect
    /// on dimension-0 shapes.
    pub fn include_interiors(mut self, yes: bool) -> Self {
        self.include_interiors = yes;
        self
    }
}

/// A single query result. Results are ordered by ascending distance; ties
/// are broken by the lower edge id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestEdgeResult {
    pub shape_id: ShapeId,
    pub edge_id: usize,
    pub distance: Angle,
}

struct Candidate {
    bound: f64,
    cell: CellId,
    lo: usize,
    hi: usize,
}

// BinaryHeap is a max-heap; order candidates by descending bound to pop the
// most promising cell first.
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .bound
            .total_cmp(&self.bound)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Reusable nearest-edge query.
///
/// The traversal heap and result buffer survive between invocations so a
/// long-lived query object does not reallocate per lookup; the state is
/// reset at the start of every search. The object is **not** re-entrant:
/// concurrent callers must serialize access (the finder wraps it in a
/// mutex).
pub struct ClosestEdgeQuery {
    opts: ClosestEdgeOptions,
    heap: BinaryHeap<Candidate>,
    results: Vec<ClosestEdgeResult>,
}

impl ClosestEdgeQuery {
    pub fn new(opts: ClosestEdgeOptions) -> Self {
        Self {
            opts,
            heap: BinaryHeap::new(),
            results: Vec::new(),
        }
    }

    /// Finds up to `max_results` closest edges to `target`, ordered by
    /// ascending angular distance. Returns an empty slice when the index
    /// has no edges.
    pub fn find_closest_edges(
        &mut self,
        index: &ShapeIndex,
        target: &Point,
    ) -> Result<&[ClosestEdgeResult]> {
        self.heap.clear();
        self.results.clear();
        if index.is_empty() {
            return Ok(&self.results);
        }

        for face in 0..6 {
            let cell = CellId::from_face(face);
            self.push_candidate(index, target, cell, 0, index.entries.len());
        }

        while let Some(candidate) = self.heap.pop() {
            if self.results.len() == self.opts.max_results {
                let worst = self.results[self.results.len() - 1].distance.radians();
                if candidate.bound > worst {
                    break;
                }
            }
            let count = candidate.hi - candidate.lo;
            if count <= MAX_LEAF_ENTRIES || candidate.cell.is_leaf() {
                self.score_entries(index, target, candidate.lo, candidate.hi)?;
            } else {
                for child in candidate.cell.children() {
                    self.push_candidate(index, target, child, candidate.lo, candidate.hi);
                }
            }
        }

        Ok(&self.results)
    }

    /// Convenience wrapper for the `max_results == 1` case.
    pub fn find_closest_edge(
        &mut self,
        index: &ShapeIndex,
        target: &Point,
    ) -> Result<Option<ClosestEdgeResult>> {
        Ok(self.find_closest_edges(index, target)?.first().copied())
    }

    fn push_candidate(
        &mut self,
        index: &ShapeIndex,
        target: &Point,
        cell: CellId,
        parent_lo: usize,
        parent_hi: usize,
    ) {
        let (lo, hi) = index.range_within(&cell, parent_lo, parent_hi);
        if lo == hi {
            return;
        }
        let (center, radius) = cell.cap();
        let bound = (target.angle(&center).radians() - radius.radians()).max(0.0);
        if self.results.len() == self.opts.max_results {
            let worst = self.results[self.results.len() - 1].distance.radians();
            if bound > worst {
                return;
            }
        }
        self.heap.push(Candidate {
            bound,
            cell,
            lo,
            hi,
        });
    }

    fn score_entries(
        &mut self,
        index: &ShapeIndex,
        target: &Point,
        lo: usize,
        hi: usize,
    ) -> Result<()> {
        for entry in &index.entries[lo..hi] {
            let edge = index.shapes[entry.shape as usize].edge(entry.edge as usize)?;
            let distance = target.angle(&edge.v0);
            self.offer(ClosestEdgeResult {
                shape_id: ShapeId(entry.shape),
                edge_id: entry.edge as usize,
                distance,
            });
        }
        Ok(())
    }

    fn offer(&mut self, result: ClosestEdgeResult) {
        let pos = self.results.partition_point(|r| {
            match r.distance.radians().total_cmp(&result.distance.radians()) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => {
                    (r.shape_id.0, r.edge_id) < (result.shape_id.0, result.edge_id)
                }
            }
        });
        if pos == self.opts.max_results {
            return;
        }
        self.results.insert(pos, result);
        self.results.truncate(self.opts.max_results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::shape::PointVector;
    use crate::geom::LatLng;

    fn index_of(coords: &[(f64, f64)]) -> ShapeIndex {
        let points = coords
            .iter()
            .map(|&(lat, lng)| LatLng::new(lat, lng).unwrap().to_point())
            .collect();
        let mut index = ShapeIndex::new();
        index.add(Box::new(PointVector::new(points))).unwrap();
        index
    }

    const CITIES: &[(f64, f64)] = &[
        (37.7749, -122.4194), // San Francisco
        (40.7128, -74.0060),  // New York
        (51.5074, -0.1278),   // London
        (35.6762, 139.6503),  // Tokyo
        (-33.8688, 151.2093), // Sydney
        (55.7558, 37.6173),   // Moscow
        (-23.5505, -46.6333), // São Paulo
        (64.1466, -21.9426),  // Reykjavík
        (78.2232, 15.6267),   // Longyearbyen (high latitude)
        (-0.1807, -78.4678),  // Quito (equator)
    ];

    fn brute_force_nearest(coords: &[(f64, f64)], target: &Point) -> (usize, f64) {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| {
                let p = LatLng::new(lat, lng).unwrap().to_point();
                (i, target.angle(&p).radians())
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap()
    }

    #[test]
    fn empty_index_yields_no_results() {
        let index = ShapeIndex::new();
        let mut query = ClosestEdgeQuery::new(ClosestEdgeOptions::default());
        let target = LatLng::new(0.0, 0.0).unwrap().to_point();
        assert!(query.find_closest_edge(&index, &target).unwrap().is_none());
    }

    #[test]
    fn exact_coordinate_returns_distance_zero() {
        let index = index_of(CITIES);
        let mut query = ClosestEdgeQuery::new(ClosestEdgeOptions::default());
        for (i, &(lat, lng)) in CITIES.iter().enumerate() {
            let target = LatLng::new(lat, lng).unwrap().to_point();
            let hit = query.find_closest_edge(&index, &target).unwrap().unwrap();
            assert_eq!(hit.edge_id, i);
            assert_eq!(hit.distance.radians(), 0.0);
        }
    }

    #[test]
    fn matches_brute_force_on_probe_grid() {
        let index = index_of(CITIES);
        let mut query = ClosestEdgeQuery::new(ClosestEdgeOptions::default());
        // Probe a lat/lng grid including poles and the anti-meridian.
        let mut lat = -85.0;
        while lat <= 85.0 {
            let mut lng = -180.0;
            while lng <= 180.0 {
                let target = LatLng::new(lat, lng).unwrap().to_point();
                let hit = query.find_closest_edge(&index, &target).unwrap().unwrap();
                let (want, want_dist) = brute_force_nearest(CITIES, &target);
                assert_eq!(hit.edge_id, want, "at ({lat}, {lng})");
                assert!((hit.distance.radians() - want_dist).abs() < 1e-12);
                lng += 17.0;
            }
            lat += 13.0;
        }
    }

    #[test]
    fn max_results_returns_ascending_distances() {
        let index = index_of(CITIES);
        let mut query = ClosestEdgeQuery::new(ClosestEdgeOptions::default().max_results(4));
        let target = LatLng::new(48.8566, 2.3522).unwrap().to_point();
        let results = query.find_closest_edges(&index, &target).unwrap().to_vec();
        assert_eq!(results.len(), 4);
        for w in results.windows(2) {
            assert!(w[0].distance.radians() <= w[1].distance.radians());
        }
        // London is the closest of the fixture set to Paris.
        assert_eq!(results[0].edge_id, 2);
    }

    #[test]
    fn equidistant_tie_prefers_lower_edge_id() {
        // Two identical points; any query must resolve to edge 0.
        let index = index_of(&[(10.0, 20.0), (10.0, 20.0)]);
        let mut query = ClosestEdgeQuery::new(ClosestEdgeOptions::default());
        let target = LatLng::new(10.1, 20.1).unwrap().to_point();
        let hit = query.find_closest_edge(&index, &target).unwrap().unwrap();
        assert_eq!(hit.edge_id, 0);
    }

    #[test]
    fn query_object_is_reusable() {
        let index = index_of(CITIES);
        let mut query = ClosestEdgeQuery::new(ClosestEdgeOptions::default());
        let a = LatLng::new(41.0, -73.0).unwrap().to_point();
        let b = LatLng::new(36.0, 140.0).unwrap().to_point();
        assert_eq!(
            query.find_closest_edge(&index, &a).unwrap().unwrap().edge_id,
            1
        );
        assert_eq!(
            query.find_closest_edge(&index, &b).unwrap().unwrap().edge_id,
            3
        );
        assert_eq!(
            query.find_closest_edge(&index, &a).unwrap().unwrap().edge_id,
            1
        );
    }
}
