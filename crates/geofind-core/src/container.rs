//! The on-disk bundle: blob naming, build orchestration and loading.
//!
//! One bundle directory holds five files: the cities blob and points blob
//! written by the spatial builder, the spatial meta binding them, and the
//! serialized name and postal indexes. Building streams the datasets so
//! peak memory stays proportional to the index structures, not the record
//! payloads; the three indexes build in parallel, each worker returning its
//! result to the orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::city::CityId;
use crate::config::Config;
use crate::dataset::{GeoNamesReader, PostalReader};
use crate::error::{GeoFindError, Result};
use crate::name::NameIndex;
use crate::postal::PostalIndex;
use crate::spatial::{SpatialIndex, SpatialIndexBuilder, SpatialMeta};

/// Blob file names not exposed through the config.
pub const CITIES_BLOB: &str = "cities.bin";
pub const POINTS_BLOB: &str = "points.bin";

/// Upper bound on any single decoded blob, against corrupt length fields.
const MAX_BLOB_BYTES: u64 = 4 << 30;

fn blob_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_BLOB_BYTES)
}

pub fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let out = std::io::BufWriter::new(fs::File::create(path)?);
    blob_options()
        .serialize_into(out, value)
        .map_err(GeoFindError::Encode)
}

pub fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let input = std::io::BufReader::new(fs::File::open(path)?);
    blob_options()
        .deserialize_from(input)
        .map_err(|e| GeoFindError::CorruptMeta(format!("{}: {e}", path.display())))
}

/// Resolved locations of the five bundle files.
#[derive(Debug, Clone)]
pub struct BundlePaths {
    pub cities: PathBuf,
    pub points: PathBuf,
    pub spatial_meta: PathBuf,
    pub name_index: PathBuf,
    pub postal_index: PathBuf,
}

impl BundlePaths {
    pub fn new(cfg: &Config) -> Self {
        let dir = &cfg.datasets_folder;
        Self {
            cities: dir.join(CITIES_BLOB),
            points: dir.join(POINTS_BLOB),
            spatial_meta: dir.join(&cfg.s2.index_file),
            name_index: dir.join(&cfg.name_index_file),
            postal_index: dir.join(&cfg.postal_code_index_file),
        }
    }

    fn all(&self) -> [&Path; 5] {
        [
            &self.cities,
            &self.points,
            &self.spatial_meta,
            &self.name_index,
            &self.postal_index,
        ]
    }
}

/// Counts reported by a finished build.
#[derive(Debug, Clone, Copy)]
pub struct BuildStats {
    pub cities: usize,
    pub name_terms: usize,
    pub postal_codes: usize,
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when every bundle file exists and none is older than the dataset it
/// was built from. A missing dataset does not invalidate an existing bundle
/// (deployments ship the bundle without the raw dumps).
pub fn bundle_is_fresh(cfg: &Config) -> bool {
    let paths = BundlePaths::new(cfg);
    let Some(oldest_blob) = paths.all().iter().filter_map(|p| modified(p)).min() else {
        return false;
    };
    if paths.all().iter().any(|p| !p.exists()) {
        return false;
    }
    for dataset in [cfg.all_cities_path(), cfg.postal_codes_path()] {
        if let Some(t) = modified(&dataset) {
            if t > oldest_blob {
                return false;
            }
        }
    }
    true
}

/// Builds all three indexes from the configured datasets and serializes
/// them into the bundle directory.
///
/// The workers run in parallel on their own input streams; each returns
/// `Result` and the orchestrator decides what survives. The spatial and
/// name workers stream the same file independently; the row filter lives
/// in the parser, so both observe the identical record sequence and city
/// ids line up by construction.
pub fn build(cfg: &Config) -> Result<BuildStats> {
    fs::create_dir_all(&cfg.datasets_folder)?;
    let paths = BundlePaths::new(cfg);
    let cities_path = cfg.all_cities_path();
    let postal_path = cfg.postal_codes_path();

    tracing::info!(dataset = %cities_path.display(), "building indexes");

    let (meta, names, postal) = std::thread::scope(
        |scope| -> Result<(SpatialMeta, NameIndex, PostalIndex)> {
            let spatial_worker = scope.spawn(|| -> Result<SpatialMeta> {
                let mut builder = SpatialIndexBuilder::create(&paths.cities, &paths.points)?;
                for city in GeoNamesReader::open(&cities_path)? {
                    builder.push(&city?)?;
                }
                builder.finish()
            });

            let name_worker = scope.spawn(|| -> Result<NameIndex> {
                let mut index = NameIndex::new();
                for (id, city) in GeoNamesReader::open(&cities_path)?.enumerate() {
                    index.insert(&city?, id as CityId);
                }
                Ok(index)
            });

            let postal_worker = scope.spawn(|| -> Result<PostalIndex> {
                let mut index = PostalIndex::new();
                for entry in PostalReader::open(&postal_path)? {
                    index.insert(entry?);
                }
                Ok(index)
            });

            Ok((
                join(spatial_worker)?,
                join(name_worker)?,
                join(postal_worker)?,
            ))
        },
    )?;

    write_blob(&paths.spatial_meta, &meta)?;
    write_blob(&paths.name_index, &names)?;
    write_blob(&paths.postal_index, &postal)?;

    let stats = BuildStats {
        cities: meta.len(),
        name_terms: names.num_terms(),
        postal_codes: postal.len(),
    };
    tracing::info!(
        cities = stats.cities,
        name_terms = stats.name_terms,
        postal_codes = stats.postal_codes,
        "bundle written"
    );
    Ok(stats)
}

fn join<T>(handle: std::thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Loads the three indexes from a built bundle. The spatial meta is read
/// and validated first; a length mismatch or decode failure refuses the
/// whole load.
pub fn load(cfg: &Config) -> Result<(SpatialIndex, NameIndex, PostalIndex)> {
    let paths = BundlePaths::new(cfg);
    let meta: SpatialMeta = read_blob(&paths.spatial_meta)?;
    let spatial = SpatialIndex::open(&paths.cities, &paths.points, meta)?;
    let names: NameIndex = read_blob(&paths.name_index)?;
    let postal: PostalIndex = read_blob(&paths.postal_index)?;
    tracing::info!(cities = spatial.len(), "bundle loaded");
    Ok((spatial, names, postal))
}
