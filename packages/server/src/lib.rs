#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the waysure route safety service.
//!
//! Serves the REST API for route search, route details, incident reports,
//! panic alerts, and fleet statistics, plus the static frontend. All
//! safety scores are computed per request from the `SQLite` database.

mod handlers;
pub mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use switchy_database::Database;
use waysure_database::{DatabaseStore, db, open_db};
use waysure_scoring::clock::{Clock, SystemClock};
use waysure_server_models::ApiError;

/// Shared application state.
pub struct AppState {
    /// `SQLite` database handle for inserts and detail lookups.
    pub db: Arc<dyn Database>,
    /// Scorer view over the same database.
    pub store: DatabaseStore,
    /// Time source for score evaluation and report timestamps.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Builds state over a database handle and clock.
    #[must_use]
    pub fn new(db: Arc<dyn Database>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DatabaseStore::new(db.clone()),
            db,
            clock,
        }
    }
}

/// Listener and static file settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`, default `127.0.0.1`).
    pub bind_addr: String,
    /// Port to bind (`PORT`, default `5000`).
    pub port: u16,
    /// Directory served at `/` (`STATIC_DIR`, default `static`).
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Default port.
    pub const DEFAULT_PORT: u16 = 5000;

    /// Reads the configuration from `BIND_ADDR`, `PORT`, and `STATIC_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("BIND_ADDR").ok(),
            std::env::var("PORT").ok(),
            std::env::var("STATIC_DIR").ok(),
        )
    }

    fn from_vars(
        bind_addr: Option<String>,
        port: Option<String>,
        static_dir: Option<String>,
    ) -> Self {
        Self {
            bind_addr: bind_addr.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: port
                .and_then(|p| p.parse().ok())
                .unwrap_or(Self::DEFAULT_PORT),
            static_dir: static_dir.map_or_else(|| PathBuf::from("static"), PathBuf::from),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ApiError::new(message)),
        )
        .into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/routes/search", web::get().to(handlers::search_routes))
            .route(
                "/routes/{route_id}/details",
                web::get().to(handlers::route_details),
            )
            .route("/incidents/report", web::post().to(handlers::report_incident))
            .route("/panic", web::post().to(handlers::panic_alert))
            .route("/stats", web::get().to(handlers::stats)),
    );
}

/// Starts the waysure API server with the database named by
/// `DATABASE_PATH` and the listener settings from [`ServerConfig::from_env`].
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// the HTTP server fails to bind, or it encounters a runtime error.
pub async fn run_server() -> std::io::Result<()> {
    run_server_with(&db::path_from_env(), ServerConfig::from_env()).await
}

/// Opens the database at `db_path`, ensures the schema exists, and serves
/// the API and static files as described by `config`.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// the HTTP server fails to bind, or it encounters a runtime error.
pub async fn run_server_with(db_path: &Path, config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening database at {}", db_path.display());
    let db_conn = open_db(db_path)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let state = web::Data::new(AppState::new(Arc::from(db_conn), Arc::new(SystemClock)));

    log::info!(
        "Starting server on {}:{} (static files from {})",
        config.bind_addr,
        config.port,
        config.static_dir.display()
    );

    let static_dir = config.static_dir.clone();

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files
            .service(Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use chrono::{DateTime, Duration, Utc};
    use serde_json::{Value, json};
    use waysure_database::{open_db, queries, seed::seed_sample_data};
    use waysure_scoring::clock::FixedClock;

    use super::*;

    const NOON: &str = "2026-10-14T12:00:00+00:00";

    async fn seeded_state(name: &str) -> web::Data<AppState> {
        let path = std::env::temp_dir().join(format!("waysure_server_test_{name}.db"));
        let _ = std::fs::remove_file(&path);
        let db = open_db(&path).await.unwrap();
        let now = DateTime::parse_from_rfc3339(NOON).unwrap();
        seed_sample_data(db.as_ref(), now.with_timezone(&Utc))
            .await
            .unwrap();
        web::Data::new(AppState::new(
            Arc::from(db),
            Arc::new(FixedClock::new(now)),
        ))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure_api)).await
        };
    }

    #[::core::prelude::v1::test]
    fn config_defaults_and_overrides() {
        let config = ServerConfig::from_vars(None, Some("not-a-port".to_string()), None);
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.static_dir, PathBuf::from("static"));

        let config = ServerConfig::from_vars(
            Some("0.0.0.0".to_string()),
            Some("8080".to_string()),
            Some("public".to_string()),
        );
        assert_eq!(config.port, 8080);
        assert_eq!(config.static_dir, PathBuf::from("public"));
    }

    #[actix_web::test]
    async fn search_ranks_safest_first() {
        let state = seeded_state("search").await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/routes/search")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let scores: Vec<u64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["safety_score"].as_u64().unwrap())
            .collect();
        assert_eq!(scores, vec![95, 70, 60, 54, 40]);
        assert_eq!(body[0]["route_number"], "56D");
        assert_eq!(body[0]["status"], "safe");
        assert_eq!(body[4]["route_number"], "45B");
        assert_eq!(body[4]["status"], "unsafe");
    }

    #[actix_web::test]
    async fn search_filters_by_origin_then_destination() {
        let state = seeded_state("search_filter").await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/routes/search?origin=university")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["route_number"], "12A");
        assert_eq!(body[0]["start"], "University Gate");
        assert_eq!(body[0]["status"], "safe");

        let req = test::TestRequest::get()
            .uri("/api/routes/search?origin=&destination=downtown")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["route_number"], "56D");
    }

    #[actix_web::test]
    async fn details_include_score_and_recent_incidents() {
        let state = seeded_state("details").await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/routes/1/details")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["route"]["route_number"], "45B");
        assert_eq!(body["safety_score"], 40);
        let recent = body["recent_incidents"].as_array().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0]["type"], "theft");
        assert_eq!(recent[1]["type"], "harassment");

        // The 12-day-old accident on 78C counts toward the score but is
        // not "recent".
        let req = test::TestRequest::get()
            .uri("/api/routes/3/details")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["safety_score"], 54);
        assert!(body["recent_incidents"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn details_of_unknown_route_is_not_found() {
        let state = seeded_state("details_404").await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/routes/42/details")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn report_stores_incident_and_lowers_score() {
        let state = seeded_state("report").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/incidents/report")
            .set_json(json!({
                "route_id": 5,
                "incident_type": "harassment",
                "severity": "high",
                "latitude": 10.83,
                "longitude": 76.27,
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let id = body["incident_id"].as_i64().unwrap();
        let stored = queries::get_incident(state.db.as_ref(), id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.route_id, 5);
        assert_eq!(stored.reported_at, state.clock.now().with_timezone(&Utc));

        let req = test::TestRequest::get()
            .uri("/api/routes/5/details")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["safety_score"], 50);
        assert_eq!(body["status"], "caution");
    }

    #[actix_web::test]
    async fn report_with_missing_fields_writes_nothing() {
        let state = seeded_state("report_400").await;
        let app = app!(state);
        let before = queries::count_incidents(state.db.as_ref()).await.unwrap();

        let req = test::TestRequest::post()
            .uri("/api/incidents/report")
            .set_json(json!({ "route_id": 1, "severity": "high" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("incident_type"));

        let req = test::TestRequest::post()
            .uri("/api/incidents/report")
            .set_json(json!({
                "route_id": 1,
                "incident_type": "theft",
                "severity": "extreme",
                "latitude": 10.8,
                "longitude": 76.2,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let after = queries::count_incidents(state.db.as_ref()).await.unwrap();
        assert_eq!(before, after);
    }

    #[actix_web::test]
    async fn report_for_unknown_route_is_not_found() {
        let state = seeded_state("report_404").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/incidents/report")
            .set_json(json!({
                "route_id": 77,
                "incident_type": "theft",
                "severity": "low",
                "latitude": 10.8,
                "longitude": 76.2,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let state = seeded_state("bad_json").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/panic")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn panic_returns_maps_link() {
        let state = seeded_state("panic").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/panic")
            .set_json(json!({ "latitude": 10.8231, "longitude": 76.2711 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["maps_link"], "https://maps.google.com/?q=10.8231,76.2711");
        let alert = queries::get_panic_alert(state.db.as_ref(), body["alert_id"].as_i64().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alert.user_id, 1);

        let req = test::TestRequest::post()
            .uri("/api/panic")
            .set_json(json!({ "user_id": 3 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn stats_report_worst_route() {
        let state = seeded_state("stats").await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["total_routes"], 5);
        assert_eq!(body["total_incidents"], 5);
        assert_eq!(body["most_dangerous_route"], "45B");
        assert_eq!(body["most_dangerous_route_id"], 1);
        assert_eq!(body["lowest_safety_score"], 40);
    }

    #[actix_web::test]
    async fn stats_ignore_incidents_outside_window() {
        let state = seeded_state("stats_window").await;
        let old = state.clock.now().with_timezone(&Utc) - Duration::days(45);
        queries::insert_incident(
            state.db.as_ref(),
            &waysure_route_models::NewIncident {
                route_id: 5,
                incident_type: "theft".to_string(),
                severity: waysure_route_models::IncidentSeverity::High,
                description: None,
                latitude: 10.8,
                longitude: 76.2,
            },
            old,
        )
        .await
        .unwrap();
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_incidents"], 5);
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let state = seeded_state("health").await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
