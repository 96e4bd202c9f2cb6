use clap::{Parser, Subcommand};

/// CLI arguments for geofind
#[derive(Debug, Parser)]
#[command(
    name = "geofind",
    version,
    about = "Build and query the geofind gazetteer indexes"
)]
pub struct CliArgs {
    /// Path to a JSON config file (defaults apply when omitted)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download and extract the GeoNames datasets if missing
    Fetch,

    /// Build the index bundle from the datasets
    Build {
        /// Rebuild even when the bundle is up to date
        #[arg(long)]
        force: bool,
    },

    /// Show a summary of a built bundle
    Stats,

    /// Nearest city to a coordinate pair
    Nearest {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Lookup a city by name (fuzzy) and country code
    Name {
        /// City name or alternate name
        name: String,
        /// ISO2 country code (e.g. DE, fr)
        country: String,
    },

    /// Lookup the place behind a postal code
    Postal {
        /// Postal code (e.g. 10001)
        code: String,
        /// ISO2 country code
        country: String,
    },
}
