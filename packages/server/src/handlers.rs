//! HTTP handler functions for the waysure API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use waysure_database::queries;
use waysure_scoring::score::recent_cutoff;
use waysure_scoring::{score_route_at, search, stats as fleet};
use waysure_server_models::{
    ApiError, ApiHealth, ApiPanicResponse, ApiRecentIncident, ApiReportIncidentResponse,
    ApiRouteDetails, ApiRouteResult, ApiStats, PanicRequest, ReportIncidentRequest, SearchParams,
};

use crate::AppState;

fn internal_error(context: &str, e: &dyn std::fmt::Display) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(ApiError::new(context))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/routes/search`
///
/// Returns matching routes ranked by safety score, safest first.
pub async fn search_routes(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    match search::search_routes(&state.store, state.clock.as_ref(), params.term()).await {
        Ok(ranked) => {
            let results: Vec<ApiRouteResult> =
                ranked.into_iter().map(ApiRouteResult::from).collect();
            HttpResponse::Ok().json(results)
        }
        Err(e) => internal_error("Failed to search routes", &e),
    }
}

/// `GET /api/routes/{route_id}/details`
///
/// Returns the route, its current score, and incidents from the last
/// 7 days.
pub async fn route_details(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let route_id = path.into_inner();

    let route = match queries::get_route(state.db.as_ref(), route_id).await {
        Ok(Some(route)) => route,
        Ok(None) => return HttpResponse::NotFound().json(ApiError::new("Route not found")),
        Err(e) => return internal_error("Failed to load route", &e),
    };

    let now = state.clock.now();

    let recent = match queries::list_route_incidents_since(
        state.db.as_ref(),
        route_id,
        recent_cutoff(now.with_timezone(&Utc)),
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => return internal_error("Failed to load recent incidents", &e),
    };

    match score_route_at(&state.store, route_id, now).await {
        Ok(safety) => HttpResponse::Ok().json(ApiRouteDetails {
            route: route.into(),
            safety_score: safety.score,
            status: safety.status,
            recent_incidents: recent.into_iter().map(ApiRecentIncident::from).collect(),
        }),
        Err(e) => internal_error("Failed to compute safety score", &e),
    }
}

/// `POST /api/incidents/report`
///
/// Validates and stores an incident report.
pub async fn report_incident(
    state: web::Data<AppState>,
    body: web::Json<ReportIncidentRequest>,
) -> HttpResponse {
    let incident = match body.validate() {
        Ok(incident) => incident,
        Err(e) => return HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    };

    match queries::get_route(state.db.as_ref(), incident.route_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::NotFound().json(ApiError::new("Route not found")),
        Err(e) => return internal_error("Failed to load route", &e),
    }

    let reported_at = state.clock.now().with_timezone(&Utc);

    match queries::insert_incident(state.db.as_ref(), &incident, reported_at).await {
        Ok(incident_id) => {
            log::info!(
                "Incident {incident_id} reported on route {} ({}, {})",
                incident.route_id,
                incident.incident_type,
                incident.severity
            );
            HttpResponse::Ok().json(ApiReportIncidentResponse {
                success: true,
                incident_id,
                message: "Incident reported successfully".to_string(),
            })
        }
        Err(e) => internal_error("Failed to store incident", &e),
    }
}

/// `POST /api/panic`
///
/// Stores an emergency alert and returns a map link for its location.
pub async fn panic_alert(
    state: web::Data<AppState>,
    body: web::Json<PanicRequest>,
) -> HttpResponse {
    let alert = match body.validate() {
        Ok(alert) => alert,
        Err(e) => return HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    };

    let alert_time = state.clock.now().with_timezone(&Utc);

    match queries::insert_panic_alert(state.db.as_ref(), &alert, alert_time).await {
        Ok(alert_id) => {
            let maps_link = alert.maps_link();
            log::warn!(
                "Emergency alert {alert_id} raised by user {} at {maps_link}",
                alert.user_id
            );
            HttpResponse::Ok().json(ApiPanicResponse {
                success: true,
                alert_id,
                maps_link,
                message: "Emergency alert activated".to_string(),
            })
        }
        Err(e) => internal_error("Failed to store panic alert", &e),
    }
}

/// `GET /api/stats`
///
/// Returns the fleet-wide summary including the most dangerous route.
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    match fleet::fleet_stats(&state.store, state.clock.as_ref()).await {
        Ok(summary) => HttpResponse::Ok().json(ApiStats::from(summary)),
        Err(e) => internal_error("Failed to compute stats", &e),
    }
}
