//! geofind-server — HTTP surface over the gazetteer indexes.
//!
//! Loads (or builds) the index bundle at startup, then serves:
//!
//! - `GET /nearest?lat=..&lon=..`
//! - `GET /coordinates?name=..&country-code=..`
//! - `GET /postalCode?code=..&country-code=..`
//!
//! A bad bundle is fatal at startup. The finder is shared read-only across
//! workers; per-query state lives inside the core.

use std::path::Path;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use geofind_core::{Config, Finder};
use geofind_server::routes::{self, AppState};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geofind-server", version, about = "HTTP API for geofind lookups")]
struct Args {
    /// Path to a JSON config file (defaults apply when omitted)
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long = "port", default_value_t = 3000)]
    port: u16,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::from_file(Path::new(path))?,
        None => Config::default(),
    };

    let finder = Finder::ensure(&cfg)?;
    tracing::info!(cities = finder.num_cities(), port = args.port, "serving");
    let state = web::Data::new(AppState::new(finder));

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::configure))
        .bind(("0.0.0.0", args.port))?
        .run()
        .await?;
    Ok(())
}
