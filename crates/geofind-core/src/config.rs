//! Runtime configuration, loaded from a small JSON file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tuning block kept for config-file compatibility with cell-covering
/// deployments. The closest-edge index has no covering parameters, so only
/// `index_file` is consulted; the level and cell-count knobs are parsed and
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S2Config {
    pub min_level: u32,
    pub max_level: u32,
    pub max_cells: u32,
    pub index_file: String,
}

impl Default for S2Config {
    fn default() -> Self {
        Self {
            min_level: 15,
            max_level: 15,
            max_cells: 8,
            index_file: "spatial.meta".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the downloaded datasets and the built index blobs.
    pub datasets_folder: PathBuf,
    pub all_cities_url: String,
    pub postal_codes_url: String,
    pub all_cities_file: String,
    pub postal_codes_file: String,
    pub all_cities_zip: String,
    pub postal_codes_zip: String,
    pub name_index_file: String,
    pub postal_code_index_file: String,
    /// Maximum Levenshtein distance for fuzzy name fallback.
    pub fuzzy_max_distance: u32,
    pub s2: S2Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datasets_folder: PathBuf::from("datasets"),
            all_cities_url: "https://download.geonames.org/export/dump/allCountries.zip".into(),
            postal_codes_url: "https://download.geonames.org/export/zip/allCountries.zip".into(),
            all_cities_file: "allCountries.txt".into(),
            postal_codes_file: "postalCodes.txt".into(),
            all_cities_zip: "allCountries.zip".into(),
            postal_codes_zip: "postalCodes.zip".into(),
            name_index_file: "name.idx".into(),
            postal_code_index_file: "postal.idx".into(),
            fuzzy_max_distance: 2,
            s2: S2Config::default(),
        }
    }
}

impl Config {
    /// Reads a JSON config file. Absent keys fall back to the defaults.
    pub fn from_file(path: &Path) -> Result<Config> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .map_err(|e| crate::error::GeoFindError::CorruptMeta(format!("config: {e}")))
    }

    pub fn all_cities_path(&self) -> PathBuf {
        self.datasets_folder.join(&self.all_cities_file)
    }

    pub fn postal_codes_path(&self) -> PathBuf {
        self.datasets_folder.join(&self.postal_codes_file)
    }
}
