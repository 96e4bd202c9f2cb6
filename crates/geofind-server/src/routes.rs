//! The three HTTP routes.
//!
//! Thin adapters: parse and validate the query string, call the finder, map
//! the error taxonomy onto status codes. `OutOfRange` becomes 400 with the
//! error's own message, `NoResults` 404; a fatal error (meta corruption
//! observed at query time) flips the poisoned flag and the service refuses
//! all further queries with 500.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;

use geofind_core::{CancellationToken, Finder, GeoFindError};

pub struct AppState {
    pub finder: Finder,
    poisoned: AtomicBool,
}

impl AppState {
    pub fn new(finder: Finder) -> Self {
        Self {
            finder,
            poisoned: AtomicBool::new(false),
        }
    }
}

fn failure(state: &AppState, err: GeoFindError, not_found: String) -> HttpResponse {
    match err {
        GeoFindError::OutOfRange(_) => HttpResponse::BadRequest().body(err.to_string()),
        GeoFindError::NoResults => HttpResponse::NotFound().body(not_found),
        err => {
            tracing::error!(error = %err, fatal = err.is_fatal(), "query failed");
            if err.is_fatal() {
                state.poisoned.store(true, Ordering::Relaxed);
            }
            HttpResponse::InternalServerError().body(format!("Error finding city: {err}"))
        }
    }
}

fn refuse_if_poisoned(state: &AppState) -> Option<HttpResponse> {
    if state.poisoned.load(Ordering::Relaxed) {
        Some(HttpResponse::InternalServerError().body("Index corrupted; refusing queries"))
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
struct NearestParams {
    lat: Option<String>,
    lon: Option<String>,
}

#[get("/nearest")]
async fn nearest(
    params: web::Query<NearestParams>,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Some(refused) = refuse_if_poisoned(&state) {
        return refused;
    }
    let Some(lat) = params.lat.as_deref().and_then(|s| s.parse::<f64>().ok()) else {
        return HttpResponse::BadRequest().body("Invalid latitude");
    };
    let Some(lon) = params.lon.as_deref().and_then(|s| s.parse::<f64>().ok()) else {
        return HttpResponse::BadRequest().body("Invalid longitude");
    };

    match state
        .finder
        .nearest_city(lat, lon, &CancellationToken::new())
    {
        Ok((city, _km)) => HttpResponse::Ok().json(city),
        Err(err) => failure(
            &state,
            err,
            format!("City not found for lat: {lat}, lon: {lon}"),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct CoordinatesParams {
    name: Option<String>,
    #[serde(rename = "country-code")]
    country_code: Option<String>,
}

#[get("/coordinates")]
async fn coordinates(
    params: web::Query<CoordinatesParams>,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Some(refused) = refuse_if_poisoned(&state) {
        return refused;
    }
    let name = match params.name.as_deref() {
        Some(n) if !n.is_empty() => n,
        _ => return HttpResponse::BadRequest().body("Name is required"),
    };
    let country = match params.country_code.as_deref() {
        Some(c) if !c.is_empty() => c,
        _ => return HttpResponse::BadRequest().body("Country code is required"),
    };

    match state
        .finder
        .city_by_name(name, country, &CancellationToken::new())
    {
        Ok(city) => HttpResponse::Ok().json(city),
        Err(err) => failure(&state, err, "City not found".into()),
    }
}

#[derive(Debug, Deserialize)]
struct PostalParams {
    code: Option<String>,
    #[serde(rename = "country-code")]
    country_code: Option<String>,
}

#[get("/postalCode")]
async fn postal_code(
    params: web::Query<PostalParams>,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Some(refused) = refuse_if_poisoned(&state) {
        return refused;
    }
    let code = match params.code.as_deref() {
        Some(c) if !c.is_empty() => c,
        _ => return HttpResponse::BadRequest().body("Postal code is required"),
    };
    let country = match params.country_code.as_deref() {
        Some(c) if !c.is_empty() => c,
        _ => return HttpResponse::BadRequest().body("Country code is required"),
    };

    match state
        .finder
        .city_by_postal_code(code, country, &CancellationToken::new())
    {
        Ok(city) => HttpResponse::Ok().json(city),
        Err(err) => failure(&state, err, "City not found".into()),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(nearest).service(coordinates).service(postal_code);
}
