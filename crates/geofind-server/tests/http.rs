//! Route-level tests against a bundle built from a small fixture dataset.

use std::fs;
use std::io::Write;
use std::path::Path;

use actix_web::{body::to_bytes, http::StatusCode, test, web, App};
use tempfile::TempDir;

use geofind_core::{Config, Finder};
use geofind_server::routes::{self, AppState};

fn write_datasets(dir: &Path) {
    let mut cities = fs::File::create(dir.join("allCountries.txt")).unwrap();
    for (id, name, alt, lat, lng, cc) in [
        (1, "New York City", "NYC", 40.71427, -74.00597, "US"),
        (2, "Paris", "Lutece", 48.85341, 2.3488, "FR"),
        (3, "Paris", "", 33.66094, -95.55551, "US"),
        (4, "Beijing", "Peking", 39.9075, 116.39723, "CN"),
    ] {
        writeln!(
            cities,
            "{id}\t{name}\t{name}\t{alt}\t{lat}\t{lng}\tP\tPPLC\t{cc}\t\t\t\t\t\t100\t\t\tEtc/UTC\t2022-01-01"
        )
        .unwrap();
    }
    let mut postal = fs::File::create(dir.join("postalCodes.txt")).unwrap();
    writeln!(
        postal,
        "US\t10001\tNew York\tNew York\tNY\tNew York\t061\t\t\t40.75061\t-73.99716\t4"
    )
    .unwrap();
}

fn state(dir: &TempDir) -> web::Data<AppState> {
    write_datasets(dir.path());
    let cfg = Config {
        datasets_folder: dir.path().to_path_buf(),
        ..Config::default()
    };
    let finder = Finder::ensure(&cfg).unwrap();
    web::Data::new(AppState::new(finder))
}

macro_rules! app {
    ($dir:expr) => {
        test::init_service(
            App::new()
                .app_data(state($dir))
                .configure(routes::configure),
        )
        .await
    };
}

async fn body_string(res: actix_web::dev::ServiceResponse) -> String {
    let bytes = to_bytes(res.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_web::test]
async fn nearest_returns_city_json() {
    let dir = TempDir::new().unwrap();
    let app = app!(&dir);

    let req = test::TestRequest::get()
        .uri("/nearest?lat=40.7128&lon=-74.0060")
        .to_request();
    let city: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(city["Name"], "New York City");
    assert_eq!(city["Country"], "US");
    assert_eq!(city["AltNames"][0], "NYC");
}

#[actix_web::test]
async fn nearest_rejects_unparseable_latitude() {
    let dir = TempDir::new().unwrap();
    let app = app!(&dir);

    let req = test::TestRequest::get()
        .uri("/nearest?lat=invalid&lon=-74.0060")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Invalid latitude");

    // A missing parameter reads the same as an unparseable one.
    let req = test::TestRequest::get().uri("/nearest?lon=-74.0060").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Invalid latitude");
}

#[actix_web::test]
async fn nearest_rejects_out_of_range_latitude() {
    let dir = TempDir::new().unwrap();
    let app = app!(&dir);

    let req = test::TestRequest::get().uri("/nearest?lat=91&lon=0").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Latitude must be between -90 and 90");
}

#[actix_web::test]
async fn coordinates_scopes_by_country() {
    let dir = TempDir::new().unwrap();
    let app = app!(&dir);

    let req = test::TestRequest::get()
        .uri("/coordinates?name=Paris&country-code=fr")
        .to_request();
    let city: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(city["Country"], "FR");
    assert!((city["Latitude"].as_f64().unwrap() - 48.85).abs() < 0.01);
    assert!((city["Longitude"].as_f64().unwrap() - 2.35).abs() < 0.01);

    let req = test::TestRequest::get()
        .uri("/coordinates?name=Paris&country-code=us")
        .to_request();
    let city: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(city["Country"], "US");

    let req = test::TestRequest::get()
        .uri("/coordinates?name=Paris&country-code=jp")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(res).await, "City not found");
}

#[actix_web::test]
async fn coordinates_requires_both_params() {
    let dir = TempDir::new().unwrap();
    let app = app!(&dir);

    let req = test::TestRequest::get()
        .uri("/coordinates?country-code=fr")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Name is required");

    let req = test::TestRequest::get()
        .uri("/coordinates?name=Paris")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Country code is required");
}

#[actix_web::test]
async fn fuzzy_name_lookup_over_http() {
    let dir = TempDir::new().unwrap();
    let app = app!(&dir);

    let req = test::TestRequest::get()
        .uri("/coordinates?name=Bejing&country-code=CN")
        .to_request();
    let city: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(city["Name"], "Beijing");
}

#[actix_web::test]
async fn postal_code_lookup() {
    let dir = TempDir::new().unwrap();
    let app = app!(&dir);

    let req = test::TestRequest::get()
        .uri("/postalCode?code=10001&country-code=US")
        .to_request();
    let city: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!((city["Latitude"].as_f64().unwrap() - 40.75).abs() < 0.01);
    assert!((city["Longitude"].as_f64().unwrap() - -74.00).abs() < 0.01);

    let req = test::TestRequest::get()
        .uri("/postalCode?country-code=US")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Postal code is required");

    let req = test::TestRequest::get()
        .uri("/postalCode?code=00000&country-code=US")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
