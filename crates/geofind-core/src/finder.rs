//! The query facade over the three indexes.
//!
//! One `Finder` value owns the spatial, name and postal indexes and exposes
//! the three public lookups. It is the only type the adapters (HTTP, CLI)
//! talk to: it validates inputs, uppercases country codes, maps index
//! internals onto the error taxonomy and honors the caller's cancellation
//! token before issuing an index query and again after decoding a record.
//!
//! All state is read-only after load, so a `Finder` is `Send + Sync` and
//! queries run freely in parallel; the single serialized piece is the
//! closest-edge traversal scratch inside the spatial index, which guards
//! itself with a mutex.

use tokio_util::sync::CancellationToken;

use crate::city::City;
use crate::config::Config;
use crate::container;
use crate::error::{GeoFindError, Result};
use crate::name::NameIndex;
use crate::postal::PostalIndex;
use crate::spatial::SpatialIndex;

pub struct Finder {
    spatial: SpatialIndex,
    names: NameIndex,
    postal: PostalIndex,
    fuzzy_max_distance: u32,
}

impl Finder {
    /// Loads a previously built bundle.
    pub fn open(cfg: &Config) -> Result<Self> {
        let (spatial, names, postal) = container::load(cfg)?;
        Ok(Self {
            spatial,
            names,
            postal,
            fuzzy_max_distance: cfg.fuzzy_max_distance,
        })
    }

    /// Loads the bundle, building it first when it is missing or older than
    /// the datasets.
    pub fn ensure(cfg: &Config) -> Result<Self> {
        if !container::bundle_is_fresh(cfg) {
            container::build(cfg)?;
        }
        Self::open(cfg)
    }

    pub fn num_cities(&self) -> usize {
        self.spatial.len()
    }

    /// Closest city to the coordinates and its great-circle distance in
    /// kilometers.
    pub fn nearest_city(
        &self,
        lat: f64,
        lng: f64,
        cancel: &CancellationToken,
    ) -> Result<(City, f64)> {
        if cancel.is_cancelled() {
            return Err(GeoFindError::Cancelled);
        }
        let (_, city, km) = self.spatial.find_nearest(lat, lng)?;
        if cancel.is_cancelled() {
            return Err(GeoFindError::Cancelled);
        }
        Ok((city, km))
    }

    /// City matching a name or alternate name within the given country,
    /// tolerating small misspellings.
    pub fn city_by_name(
        &self,
        name: &str,
        country: &str,
        cancel: &CancellationToken,
    ) -> Result<City> {
        if name.is_empty() {
            return Err(GeoFindError::NoResults);
        }
        let country = country.to_uppercase();
        if cancel.is_cancelled() {
            return Err(GeoFindError::Cancelled);
        }
        let id = self
            .names
            .find(name, &country, self.fuzzy_max_distance)
            .ok_or(GeoFindError::NoResults)?;
        let city = self.spatial.read_city(id)?;
        if cancel.is_cancelled() {
            return Err(GeoFindError::Cancelled);
        }
        Ok(city)
    }

    /// Place registered under a postal code within the given country.
    pub fn city_by_postal_code(
        &self,
        code: &str,
        country: &str,
        cancel: &CancellationToken,
    ) -> Result<City> {
        if code.is_empty() {
            return Err(GeoFindError::NoResults);
        }
        let country = country.to_uppercase();
        if cancel.is_cancelled() {
            return Err(GeoFindError::Cancelled);
        }
        let city = self
            .postal
            .find(code, &country)
            .ok_or(GeoFindError::NoResults)?;
        if cancel.is_cancelled() {
            return Err(GeoFindError::Cancelled);
        }
        Ok(city)
    }

    /// Tears down the finder: indexes drop in declaration order, releasing
    /// the blob handles exactly once. Querying after close is
    /// unrepresentable, since `close` consumes the finder.
    pub fn close(self) {
        self.spatial.close();
    }
}
