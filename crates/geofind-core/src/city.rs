use serde::{Deserialize, Serialize};

use crate::geom::{LatLng, Point};
use crate::error::Result;

/// Dense identifier of a city: its position in file-input order. Equals the
/// edge id in the spatial shape and the index into the meta's parallel
/// vectors.
pub type CityId = u32;

/// A populated place from the gazetteer.
///
/// Serializes to the wire shape `{"Name", "Country", "Latitude",
/// "Longitude", "AltNames"}`; the same field order is the stable on-disk
/// record layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct City {
    pub name: String,
    /// ISO 3166-1 alpha-2 code, upper case.
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Known alternate names, in input order. Empty when the source row did
    /// not carry any.
    pub alt_names: Vec<String>,
}

impl City {
    /// The city's position on the unit sphere.
    ///
    /// Validates the stored coordinates; a record that decodes fine but
    /// carries an impossible latitude is treated the same as any other
    /// out-of-range input.
    pub fn to_point(&self) -> Result<Point> {
        Ok(LatLng::new(self.latitude, self.longitude)?.to_point())
    }
}
