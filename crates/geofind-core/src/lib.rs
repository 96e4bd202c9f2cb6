//! geofind-core — geospatial lookup over a static gazetteer.
//!
//! Three queries over the GeoNames corpus: nearest place to a coordinate,
//! place by (possibly misspelled) name and country, and place by postal
//! code and country. Indexes are built once from the tab-separated dumps,
//! serialized into an on-disk bundle and loaded read-only for querying;
//! see [`Finder`] for the entry point.

pub mod bktree;
pub mod city;
pub mod config;
pub mod container;
pub mod dataset;
pub mod error;
pub mod finder;
pub mod geom;
pub mod name;
pub mod postal;
pub mod spatial;
pub mod store;

// Re-exports for convenience
pub use crate::city::{City, CityId};
pub use crate::config::Config;
pub use crate::error::{GeoFindError, Result};
pub use crate::finder::Finder;
pub use crate::postal::PostalEntry;

pub use tokio_util::sync::CancellationToken;
