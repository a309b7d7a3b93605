#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the waysure server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types in `waysure_route_models` so the wire contract
//! can evolve independently. Request bodies deserialize every field as
//! optional and are checked by `validate()`, which reports all missing
//! fields at once instead of failing on the first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waysure_route_models::{
    DEMO_USER_ID, Incident, IncidentSeverity, NewIncident, NewPanicAlert, Route, SafetyStatus,
};
use waysure_scoring::search::RankedRoute;
use waysure_scoring::stats::FleetStats;

/// Reasons a request body is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// One or more required fields were absent or blank.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The severity is not one of `low`, `medium`, `high`.
    #[error("Invalid severity '{0}': expected low, medium, or high")]
    InvalidSeverity(String),

    /// Latitude or longitude is out of range.
    #[error("Invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Rejected latitude.
        latitude: f64,
        /// Rejected longitude.
        longitude: f64,
    },
}

fn check_location(latitude: f64, longitude: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLocation {
            latitude,
            longitude,
        })
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Server package version.
    pub version: String,
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Query parameters for the route search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Substring of the starting point.
    pub origin: Option<String>,
    /// Substring of the destination, used when `origin` is empty.
    pub destination: Option<String>,
}

impl SearchParams {
    /// The search term: `origin` if non-empty, else `destination`, else
    /// the empty string (which matches every route).
    #[must_use]
    pub fn term(&self) -> &str {
        self.origin
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.destination.as_deref())
            .unwrap_or("")
    }
}

/// A route search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRouteResult {
    /// Route primary key.
    pub route_id: i64,
    /// Public route number.
    pub route_number: String,
    /// Route name.
    pub route_name: String,
    /// First stop.
    pub start: String,
    /// Last stop.
    pub end: String,
    /// Distance in kilometres.
    pub distance: f64,
    /// Typical duration in minutes.
    pub duration: i64,
    /// Current safety score.
    pub safety_score: u8,
    /// Status derived from the score.
    pub status: SafetyStatus,
}

impl From<RankedRoute> for ApiRouteResult {
    fn from(ranked: RankedRoute) -> Self {
        Self {
            route_id: ranked.route.id,
            route_number: ranked.route.number,
            route_name: ranked.route.name,
            start: ranked.route.start_location,
            end: ranked.route.end_location,
            distance: ranked.route.distance_km,
            duration: ranked.route.avg_duration_mins,
            safety_score: ranked.safety.score,
            status: ranked.safety.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Route details
// ---------------------------------------------------------------------------

/// A route as stored, using the storage column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRoute {
    /// Primary key.
    pub route_id: i64,
    /// Public route number.
    pub route_number: String,
    /// Route name.
    pub route_name: String,
    /// First stop.
    pub start_location: String,
    /// Last stop.
    pub end_location: String,
    /// Distance in kilometres.
    pub distance_km: f64,
    /// Typical duration in minutes.
    pub avg_duration_mins: i64,
}

impl From<Route> for ApiRoute {
    fn from(route: Route) -> Self {
        Self {
            route_id: route.id,
            route_number: route.number,
            route_name: route.name,
            start_location: route.start_location,
            end_location: route.end_location,
            distance_km: route.distance_km,
            avg_duration_mins: route.avg_duration_mins,
        }
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApiLocation {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// An incident in the route details view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRecentIncident {
    /// Incident tag.
    #[serde(rename = "type")]
    pub incident_type: String,
    /// Severity level.
    pub severity: IncidentSeverity,
    /// Reporter's description.
    pub description: Option<String>,
    /// When it was reported.
    pub date: DateTime<Utc>,
    /// Where it happened.
    pub location: ApiLocation,
}

impl From<Incident> for ApiRecentIncident {
    fn from(incident: Incident) -> Self {
        Self {
            incident_type: incident.incident_type,
            severity: incident.severity,
            description: incident.description,
            date: incident.reported_at,
            location: ApiLocation {
                lat: incident.latitude,
                lng: incident.longitude,
            },
        }
    }
}

/// Response of the route details endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRouteDetails {
    /// The route.
    pub route: ApiRoute,
    /// Current safety score.
    pub safety_score: u8,
    /// Status derived from the score.
    pub status: SafetyStatus,
    /// Incidents from the last 7 days, newest first.
    pub recent_incidents: Vec<ApiRecentIncident>,
}

// ---------------------------------------------------------------------------
// Incident reports
// ---------------------------------------------------------------------------

/// Body of an incident report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportIncidentRequest {
    /// Route the incident happened on.
    pub route_id: Option<i64>,
    /// Incident tag.
    pub incident_type: Option<String>,
    /// `low`, `medium`, or `high`.
    pub severity: Option<String>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// Free-text description.
    pub description: Option<String>,
}

impl ReportIncidentRequest {
    /// Checks required fields and converts to a [`NewIncident`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a required field is missing, the
    /// severity is unknown, or the location is out of range.
    pub fn validate(&self) -> Result<NewIncident, ValidationError> {
        let incident_type = self
            .incident_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let severity = self.severity.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut missing = Vec::new();
        if self.route_id.is_none() {
            missing.push("route_id");
        }
        if incident_type.is_none() {
            missing.push("incident_type");
        }
        if severity.is_none() {
            missing.push("severity");
        }
        if self.latitude.is_none() {
            missing.push("latitude");
        }
        if self.longitude.is_none() {
            missing.push("longitude");
        }

        let (Some(route_id), Some(incident_type), Some(severity), Some(latitude), Some(longitude)) = (
            self.route_id,
            incident_type,
            severity,
            self.latitude,
            self.longitude,
        ) else {
            return Err(ValidationError::MissingFields(missing));
        };

        let severity = severity
            .parse::<IncidentSeverity>()
            .map_err(|_| ValidationError::InvalidSeverity(severity.to_string()))?;
        check_location(latitude, longitude)?;

        Ok(NewIncident {
            route_id,
            incident_type: incident_type.to_string(),
            severity,
            description: self.description.clone().filter(|d| !d.is_empty()),
            latitude,
            longitude,
        })
    }
}

/// Response of the incident report endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiReportIncidentResponse {
    /// Always `true`; failures use [`ApiError`].
    pub success: bool,
    /// ID of the stored incident.
    pub incident_id: i64,
    /// Confirmation text.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Panic alerts
// ---------------------------------------------------------------------------

/// Body of a panic alert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanicRequest {
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// Alerting user; defaults to the demo user.
    pub user_id: Option<i64>,
}

impl PanicRequest {
    /// Checks the location and converts to a [`NewPanicAlert`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if either coordinate is missing or out
    /// of range.
    pub fn validate(&self) -> Result<NewPanicAlert, ValidationError> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            let mut missing = Vec::new();
            if self.latitude.is_none() {
                missing.push("latitude");
            }
            if self.longitude.is_none() {
                missing.push("longitude");
            }
            return Err(ValidationError::MissingFields(missing));
        };
        check_location(latitude, longitude)?;

        Ok(NewPanicAlert {
            user_id: self.user_id.unwrap_or(DEMO_USER_ID),
            latitude,
            longitude,
        })
    }
}

/// Response of the panic endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPanicResponse {
    /// Always `true`; failures use [`ApiError`].
    pub success: bool,
    /// ID of the stored alert.
    pub alert_id: i64,
    /// Web map link for the alert location.
    pub maps_link: String,
    /// Confirmation text.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Fleet-wide summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStats {
    /// Number of routes.
    pub total_routes: u64,
    /// Incidents in the last 30 days.
    pub total_incidents: u64,
    /// Number of the lowest-scoring route.
    pub most_dangerous_route: Option<String>,
    /// ID of the lowest-scoring route.
    pub most_dangerous_route_id: Option<i64>,
    /// Its score.
    pub lowest_safety_score: Option<u8>,
}

impl From<FleetStats> for ApiStats {
    fn from(stats: FleetStats) -> Self {
        let (id, number, score) = stats
            .most_dangerous
            .map_or((None, None, None), |w| {
                (Some(w.route_id), Some(w.route_number), Some(w.score))
            });
        Self {
            total_routes: stats.total_routes,
            total_incidents: stats.total_incidents,
            most_dangerous_route: number,
            most_dangerous_route_id: id,
            lowest_safety_score: score,
        }
    }
}
