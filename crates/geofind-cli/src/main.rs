//! geofind — command-line interface for geofind-core
//!
//! Usage examples
//! --------------
//!
//! - Download the datasets and build the bundle
//!   $ geofind fetch
//!   $ geofind build
//!
//! - Inspect what was built
//!   $ geofind stats
//!
//! - Ad-hoc lookups
//!   $ geofind nearest 40.7128 -74.0060
//!   $ geofind name Paris fr
//!   $ geofind postal 10001 US
//!
//! With no `--config`, the defaults put datasets and the bundle under
//! `./datasets`. Point `--config` at a JSON file to override paths, URLs
//! and the fuzzy-match threshold.

mod args;
mod fetch;

use std::path::Path;

use clap::Parser;
use geofind_core::{container, CancellationToken, City, Config, Finder};
use tracing_subscriber::EnvFilter;

use crate::args::{CliArgs, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = CliArgs::parse();
    let cfg = match &args.config {
        Some(path) => Config::from_file(Path::new(path))?,
        None => Config::default(),
    };

    match args.command {
        Commands::Fetch => fetch::fetch_datasets(&cfg)?,

        Commands::Build { force } => {
            if !force && container::bundle_is_fresh(&cfg) {
                println!("Bundle is up to date; use --force to rebuild.");
            } else {
                let stats = container::build(&cfg)?;
                println!("Built indexes:");
                println!("  Cities: {}", stats.cities);
                println!("  Name terms: {}", stats.name_terms);
                println!("  Postal codes: {}", stats.postal_codes);
            }
        }

        Commands::Stats => {
            let finder = Finder::open(&cfg)?;
            println!("Cities: {}", finder.num_cities());
        }

        Commands::Nearest { lat, lon } => {
            let finder = Finder::ensure(&cfg)?;
            let (city, km) = finder.nearest_city(lat, lon, &CancellationToken::new())?;
            print_city(&city);
            println!("Distance: {km:.3} km");
        }

        Commands::Name { name, country } => {
            let finder = Finder::ensure(&cfg)?;
            let city = finder.city_by_name(&name, &country, &CancellationToken::new())?;
            print_city(&city);
        }

        Commands::Postal { code, country } => {
            let finder = Finder::ensure(&cfg)?;
            let city = finder.city_by_postal_code(&code, &country, &CancellationToken::new())?;
            print_city(&city);
        }
    }

    Ok(())
}

fn print_city(city: &City) {
    println!("{} ({})", city.name, city.country);
    println!("  Latitude: {}", city.latitude);
    println!("  Longitude: {}", city.longitude);
    if !city.alt_names.is_empty() {
        println!("  Also known as: {}", city.alt_names.join(", "));
    }
}
