//! The spherical nearest-place index.
//!
//! Build time streams city records: each record is appended to the cities
//! blob, its unit-sphere point to the points blob, and the resulting
//! `(offset, length, point offset)` triple to the meta's parallel vectors.
//! The index therefore never holds record payloads in memory; position `i`
//! in the vectors *is* the city id *is* the edge id in the point shape.
//!
//! Load time opens the two blobs read-only, registers a file-backed point
//! shape into a [`ShapeIndex`] and prepares a single-result closest-edge
//! query. Queries run concurrently: blob reads are positional, and the one
//! piece of mutable state (the query's traversal scratch) sits behind a
//! mutex.

use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::city::{City, CityId};
use crate::error::{GeoFindError, Result};
use crate::geom::{
    ClosestEdgeOptions, ClosestEdgeQuery, Edge, LatLng, Shape, ShapeIndex,
};
use crate::store::{CityStore, CityStoreWriter, PointStore, PointStoreWriter};

pub const SPATIAL_META_VERSION: u32 = 1;

/// The spatial meta blob: three equal-length parallel vectors binding city
/// ids to blob positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialMeta {
    pub version: u32,
    pub city_offsets: Vec<i64>,
    pub city_lengths: Vec<i64>,
    pub point_offsets: Vec<i64>,
}

impl SpatialMeta {
    pub fn new() -> Self {
        Self {
            version: SPATIAL_META_VERSION,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.city_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.city_offsets.is_empty()
    }

    /// Refuses version drift and parallel vectors of unequal length.
    pub fn validate(&self) -> Result<()> {
        if self.version != SPATIAL_META_VERSION {
            return Err(GeoFindError::CorruptMeta(format!(
                "unsupported meta version {} (expected {SPATIAL_META_VERSION})",
                self.version
            )));
        }
        if self.city_offsets.len() != self.city_lengths.len()
            || self.city_offsets.len() != self.point_offsets.len()
        {
            return Err(GeoFindError::CorruptMeta(format!(
                "parallel vectors disagree: {} offsets, {} lengths, {} points",
                self.city_offsets.len(),
                self.city_lengths.len(),
                self.point_offsets.len()
            )));
        }
        Ok(())
    }
}

/// Streaming builder for the spatial index's three on-disk artifacts.
pub struct SpatialIndexBuilder {
    cities: CityStoreWriter,
    points: PointStoreWriter,
    meta: SpatialMeta,
}

impl SpatialIndexBuilder {
    pub fn create(cities_path: &Path, points_path: &Path) -> Result<Self> {
        Ok(Self {
            cities: CityStoreWriter::create(cities_path)?,
            points: PointStoreWriter::create(points_path)?,
            meta: SpatialMeta::new(),
        })
    }

    /// Appends one city, assigning it the next dense id.
    pub fn push(&mut self, city: &City) -> Result<CityId> {
        let id = self.meta.len() as CityId;
        let point = city.to_point()?;
        let (offset, length) = self.cities.append(city)?;
        let point_offset = self.points.append(&point)?;
        self.meta.city_offsets.push(offset);
        self.meta.city_lengths.push(length);
        self.meta.point_offsets.push(point_offset);
        Ok(id)
    }

    /// Flushes both blobs and hands the meta to the caller for
    /// serialization.
    pub fn finish(self) -> Result<SpatialMeta> {
        self.cities.finish()?;
        self.points.finish()?;
        tracing::info!(cities = self.meta.len(), "spatial index built");
        Ok(self.meta)
    }
}

/// A point shape reading its vertices from the points blob on demand, so
/// registering 12M points costs one sequential scan, not 12M resident
/// records.
pub struct StoredPointShape {
    store: PointStore,
}

impl StoredPointShape {
    pub fn new(store: PointStore) -> Self {
        Self { store }
    }
}

impl Shape for StoredPointShape {
    fn num_edges(&self) -> usize {
        self.store.len()
    }

    fn edge(&self, i: usize) -> Result<Edge> {
        Ok(Edge::degenerate(self.store.read_at(i)?))
    }
}

/// The loaded, read-only nearest-place index.
pub struct SpatialIndex {
    cities: CityStore,
    index: ShapeIndex,
    query: Mutex<ClosestEdgeQuery>,
}

impl SpatialIndex {
    /// Opens the blobs named by a validated meta and registers the
    /// file-backed shape.
    pub fn open(cities_path: &Path, points_path: &Path, meta: SpatialMeta) -> Result<Self> {
        meta.validate()?;
        let SpatialMeta {
            city_offsets,
            city_lengths,
            point_offsets,
            ..
        } = meta;
        let cities = CityStore::open(cities_path, city_offsets, city_lengths)?;
        let points = PointStore::open(points_path, point_offsets)?;

        let mut index = ShapeIndex::new();
        index.add(Box::new(StoredPointShape::new(points)))?;
        debug_assert_eq!(index.num_edges(), cities.len());

        tracing::info!(cities = cities.len(), "spatial index loaded");
        Ok(Self {
            cities,
            index,
            query: Mutex::new(ClosestEdgeQuery::new(
                ClosestEdgeOptions::default()
                    .max_results(1)
                    .include_interiors(false),
            )),
        })
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Nearest city to the given coordinates and its great-circle distance
    /// in kilometers. Ties resolve to the lower city id, which is
    /// construction order.
    pub fn find_nearest(&self, lat: f64, lng: f64) -> Result<(CityId, City, f64)> {
        let target = LatLng::new(lat, lng)?.to_point();
        let hit = {
            let mut query = self
                .query
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            query.find_closest_edge(&self.index, &target)?
        };
        let Some(hit) = hit else {
            return Err(GeoFindError::NoResults);
        };
        let city = self.cities.read_at(hit.edge_id)?;
        Ok((hit.edge_id as CityId, city, hit.distance.to_km()))
    }

    /// Reads the record for a known city id.
    pub fn read_city(&self, id: CityId) -> Result<City> {
        self.cities.read_at(id as usize)
    }

    /// Tears down the index, releasing both blob handles. Field order gives
    /// reverse-of-construction teardown: the query scratch first, then the
    /// shape's point store, then the city store.
    pub fn close(self) {}
}
