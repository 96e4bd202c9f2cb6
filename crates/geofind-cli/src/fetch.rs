//! Dataset download and extraction.
//!
//! Both GeoNames archives are fetched only when the extracted file is
//! missing, and an already-downloaded archive is not fetched again, so the
//! command is safe to rerun.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::Context;
use geofind_core::Config;

pub fn fetch_datasets(cfg: &Config) -> anyhow::Result<()> {
    fs::create_dir_all(&cfg.datasets_folder)?;
    fetch_one(
        &cfg.all_cities_url,
        &cfg.datasets_folder.join(&cfg.all_cities_zip),
        &cfg.all_cities_path(),
    )?;
    fetch_one(
        &cfg.postal_codes_url,
        &cfg.datasets_folder.join(&cfg.postal_codes_zip),
        &cfg.postal_codes_path(),
    )?;
    Ok(())
}

fn fetch_one(url: &str, zip_path: &Path, target: &Path) -> anyhow::Result<()> {
    if target.exists() {
        tracing::info!(file = %target.display(), "dataset present, skipping");
        return Ok(());
    }
    if !zip_path.exists() {
        download(url, zip_path)?;
    } else {
        tracing::info!(file = %zip_path.display(), "archive present, skipping download");
    }
    extract(zip_path, target)
}

fn download(url: &str, zip_path: &Path) -> anyhow::Result<()> {
    tracing::info!(%url, "downloading");
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("download {url}"))?;
    let mut out = File::create(zip_path)?;
    response.copy_to(&mut out)?;
    Ok(())
}

/// Extracts the data file from the archive under the configured target
/// name. GeoNames archives carry one data file plus an optional readme.
fn extract(zip_path: &Path, target: &Path) -> anyhow::Result<()> {
    tracing::info!(archive = %zip_path.display(), "extracting");
    let mut archive = zip::ZipArchive::new(File::open(zip_path)?)
        .with_context(|| format!("open archive {}", zip_path.display()))?;

    let names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    let entry = names
        .iter()
        .find(|n| n.ends_with(".txt") && !n.eq_ignore_ascii_case("readme.txt"))
        .with_context(|| format!("no data file in {}", zip_path.display()))?;

    let mut file = archive.by_name(entry)?;
    let mut out = File::create(target)?;
    io::copy(&mut file, &mut out)?;
    Ok(())
}
