//! Spherical geometry primitives.
//!
//! The Earth is modeled as a sphere of radius 6371.0088 km. Coordinates are
//! converted to unit 3-vectors once, at index build time, and every distance
//! computed afterwards is an angle between unit vectors. This avoids the
//! planar-distance singularities at the poles and the anti-meridian.

mod cell;
mod index;
mod shape;

pub use cell::CellId;
pub use index::{ClosestEdgeOptions, ClosestEdgeQuery, ClosestEdgeResult, ShapeIndex, ShapeId};
pub use shape::{Chain, ChainPosition, Edge, PointVector, ReferencePoint, Shape};

use serde::{Deserialize, Serialize};

use crate::error::{Coordinate, GeoFindError, Result};

/// Mean Earth radius in kilometers (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    /// Validates that both coordinates are finite and within range.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoFindError::OutOfRange(Coordinate::Latitude));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoFindError::OutOfRange(Coordinate::Longitude));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Converts to a unit vector on the sphere.
    pub fn to_point(self) -> Point {
        let phi = self.lat.to_radians();
        let theta = self.lng.to_radians();
        let cos_phi = phi.cos();
        Point {
            x: cos_phi * theta.cos(),
            y: cos_phi * theta.sin(),
            z: phi.sin(),
        }
    }
}

/// A point on the unit sphere.
///
/// Produced by [`LatLng::to_point`]; the constructor does not re-normalize,
/// so arithmetic results must be passed through [`Point::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub(crate) fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Point) -> Point {
        Point {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub(crate) fn normalized(&self) -> Point {
        let n = self.norm();
        Point {
            x: self.x / n,
            y: self.y / n,
            z: self.z / n,
        }
    }

    /// Angular distance to another unit vector.
    ///
    /// `atan2(|a × b|, a · b)` is numerically stable for both nearly-equal
    /// and nearly-antipodal inputs, unlike `acos` of the dot product.
    pub fn angle(&self, other: &Point) -> Angle {
        Angle(self.cross(other).norm().atan2(self.dot(other)))
    }

    /// Recovers latitude/longitude in degrees.
    pub fn to_lat_lng(&self) -> (f64, f64) {
        let lat = self.z.atan2((self.x * self.x + self.y * self.y).sqrt());
        let lng = self.y.atan2(self.x);
        (lat.to_degrees(), lng.to_degrees())
    }
}

/// An angular distance in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Angle(pub f64);

impl Angle {
    pub fn radians(&self) -> f64 {
        self.0
    }

    /// Great-circle distance in kilometers on the Earth sphere.
    pub fn to_km(&self) -> f64 {
        self.0 * EARTH_RADIUS_KM
    }
}
