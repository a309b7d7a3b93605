//! Database query functions for routes, incidents, and panic alerts.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};
use waysure_route_models::{
    AlertStatus, Incident, IncidentSeverity, NewIncident, NewPanicAlert, PanicAlert, Route,
    ScoredIncident, User,
};

use crate::DbError;

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// Formats a timestamp the way it is stored: RFC 3339, UTC, whole seconds.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a stored timestamp.
///
/// Accepts RFC 3339 as well as the bare `YYYY-MM-DD HH:MM:SS` form, which
/// is read as UTC.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if neither format matches.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| DbError::Conversion {
            message: format!("Invalid timestamp '{value}': {e}"),
        })
}

fn parse_severity(value: &str) -> Result<IncidentSeverity, DbError> {
    value.parse().map_err(|_| DbError::Conversion {
        message: format!("Invalid severity '{value}': expected low, medium, or high"),
    })
}

fn opt_str(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |s| DatabaseValue::String(s.to_string()))
}

fn returning_id(rows: &[Row], column: &str) -> Result<i64, DbError> {
    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: format!("Insert returned no {column}"),
    })?;
    row.to_value(column).map_err(decode_error(column))
}

fn decode_error<E: std::fmt::Display>(column: &str) -> impl FnOnce(E) -> DbError + '_ {
    move |e| DbError::Conversion {
        message: format!("Failed to parse {column}: {e}"),
    }
}

fn count_of(rows: &[Row]) -> Result<u64, DbError> {
    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Count query returned no rows".to_string(),
    })?;
    let count: i64 = row.to_value("cnt").map_err(decode_error("cnt"))?;
    u64::try_from(count).map_err(decode_error("cnt"))
}

fn route_from_row(row: &Row) -> Result<Route, DbError> {
    Ok(Route {
        id: row.to_value("route_id").map_err(decode_error("route_id"))?,
        number: row.to_value("route_number").map_err(decode_error("route_number"))?,
        name: row.to_value("route_name").map_err(decode_error("route_name"))?,
        start_location: row
            .to_value("start_location")
            .map_err(decode_error("start_location"))?,
        end_location: row
            .to_value("end_location")
            .map_err(decode_error("end_location"))?,
        distance_km: row.to_value("distance_km").map_err(decode_error("distance_km"))?,
        avg_duration_mins: row
            .to_value("avg_duration_mins")
            .map_err(decode_error("avg_duration_mins"))?,
    })
}

fn scored_from_row(row: &Row) -> Result<ScoredIncident, DbError> {
    let severity: String = row.to_value("severity").map_err(decode_error("severity"))?;
    let reported_at: String = row
        .to_value("reported_at")
        .map_err(decode_error("reported_at"))?;

    Ok(ScoredIncident {
        severity: parse_severity(&severity)?,
        reported_at: parse_timestamp(&reported_at)?,
    })
}

fn incident_from_row(row: &Row) -> Result<Incident, DbError> {
    let scored = scored_from_row(row)?;

    Ok(Incident {
        id: row.to_value("incident_id").map_err(decode_error("incident_id"))?,
        route_id: row.to_value("route_id").map_err(decode_error("route_id"))?,
        incident_type: row
            .to_value("incident_type")
            .map_err(decode_error("incident_type"))?,
        severity: scored.severity,
        description: row.to_value("description").map_err(decode_error("description"))?,
        latitude: row.to_value("latitude").map_err(decode_error("latitude"))?,
        longitude: row.to_value("longitude").map_err(decode_error("longitude"))?,
        reported_at: scored.reported_at,
    })
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Returns every route ordered by ID.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn list_routes(db: &dyn Database) -> Result<Vec<Route>, DbError> {
    let rows = db
        .query_raw_params("SELECT * FROM routes ORDER BY route_id", &[])
        .await?;

    rows.iter().map(route_from_row).collect()
}

/// Looks up a single route.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_route(db: &dyn Database, route_id: i64) -> Result<Option<Route>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM routes WHERE route_id = ?",
            &[DatabaseValue::Int64(route_id)],
        )
        .await?;

    rows.first().map(route_from_row).transpose()
}

/// Inserts a route unless one with the same ID already exists.
///
/// Returns the number of rows written (0 or 1).
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_route(db: &dyn Database, route: &Route) -> Result<u64, DbError> {
    let written = db
        .exec_raw_params(
            "INSERT OR IGNORE INTO routes (route_id, route_number, route_name,
                 start_location, end_location, distance_km, avg_duration_mins)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            &[
                DatabaseValue::Int64(route.id),
                DatabaseValue::String(route.number.clone()),
                DatabaseValue::String(route.name.clone()),
                DatabaseValue::String(route.start_location.clone()),
                DatabaseValue::String(route.end_location.clone()),
                DatabaseValue::Real64(route.distance_km),
                DatabaseValue::Int64(route.avg_duration_mins),
            ],
        )
        .await?;

    Ok(written)
}

// ---------------------------------------------------------------------------
// Incidents
// ---------------------------------------------------------------------------

/// Returns severity and report time for incidents on `route_id` reported
/// strictly after `cutoff`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row holds an unknown
/// severity or malformed timestamp.
pub async fn list_incidents_since(
    db: &dyn Database,
    route_id: i64,
    cutoff: DateTime<Utc>,
) -> Result<Vec<ScoredIncident>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT severity, reported_at FROM incidents
             WHERE route_id = ? AND julianday(reported_at) > julianday(?)",
            &[
                DatabaseValue::Int64(route_id),
                DatabaseValue::String(format_timestamp(cutoff)),
            ],
        )
        .await?;

    rows.iter().map(scored_from_row).collect()
}

/// Returns full incident rows on `route_id` reported strictly after
/// `cutoff`, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn list_route_incidents_since(
    db: &dyn Database,
    route_id: i64,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Incident>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM incidents
             WHERE route_id = ? AND julianday(reported_at) > julianday(?)
             ORDER BY julianday(reported_at) DESC, incident_id DESC",
            &[
                DatabaseValue::Int64(route_id),
                DatabaseValue::String(format_timestamp(cutoff)),
            ],
        )
        .await?;

    rows.iter().map(incident_from_row).collect()
}

/// Looks up a single incident.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_incident(db: &dyn Database, incident_id: i64) -> Result<Option<Incident>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM incidents WHERE incident_id = ?",
            &[DatabaseValue::Int64(incident_id)],
        )
        .await?;

    rows.first().map(incident_from_row).transpose()
}

/// Counts incidents on any route reported strictly after `cutoff`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the count cannot be decoded.
pub async fn count_incidents_since(
    db: &dyn Database,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*) as cnt FROM incidents WHERE julianday(reported_at) > julianday(?)",
            &[DatabaseValue::String(format_timestamp(cutoff))],
        )
        .await?;

    count_of(&rows)
}

/// Counts every stored incident.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the count cannot be decoded.
pub async fn count_incidents(db: &dyn Database) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) as cnt FROM incidents", &[])
        .await?;

    count_of(&rows)
}

/// Stores an incident report and returns its auto-generated ID.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_incident(
    db: &dyn Database,
    incident: &NewIncident,
    reported_at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO incidents (route_id, incident_type, severity,
                 latitude, longitude, description, reported_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING incident_id",
            &[
                DatabaseValue::Int64(incident.route_id),
                DatabaseValue::String(incident.incident_type.clone()),
                DatabaseValue::String(incident.severity.as_ref().to_string()),
                DatabaseValue::Real64(incident.latitude),
                DatabaseValue::Real64(incident.longitude),
                opt_str(incident.description.as_deref()),
                DatabaseValue::String(format_timestamp(reported_at)),
            ],
        )
        .await?;

    returning_id(&rows, "incident_id")
}

/// Inserts an incident with a fixed ID unless it already exists.
///
/// Returns the number of rows written (0 or 1).
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_incident_with_id(db: &dyn Database, incident: &Incident) -> Result<u64, DbError> {
    let written = db
        .exec_raw_params(
            "INSERT OR IGNORE INTO incidents (incident_id, route_id, incident_type,
                 severity, description, latitude, longitude, reported_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            &[
                DatabaseValue::Int64(incident.id),
                DatabaseValue::Int64(incident.route_id),
                DatabaseValue::String(incident.incident_type.clone()),
                DatabaseValue::String(incident.severity.as_ref().to_string()),
                opt_str(incident.description.as_deref()),
                DatabaseValue::Real64(incident.latitude),
                DatabaseValue::Real64(incident.longitude),
                DatabaseValue::String(format_timestamp(incident.reported_at)),
            ],
        )
        .await?;

    Ok(written)
}

// ---------------------------------------------------------------------------
// Users & panic alerts
// ---------------------------------------------------------------------------

/// Inserts a user unless one with the same ID already exists.
///
/// Returns the number of rows written (0 or 1).
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_user(db: &dyn Database, user: &User) -> Result<u64, DbError> {
    let written = db
        .exec_raw_params(
            "INSERT OR IGNORE INTO users (user_id, username, email, phone_number)
             VALUES (?, ?, ?, ?)",
            &[
                DatabaseValue::Int64(user.id),
                DatabaseValue::String(user.username.clone()),
                DatabaseValue::String(user.email.clone()),
                DatabaseValue::String(user.phone_number.clone()),
            ],
        )
        .await?;

    Ok(written)
}

/// Stores a panic alert with status `active` and returns its ID.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_panic_alert(
    db: &dyn Database,
    alert: &NewPanicAlert,
    alert_time: DateTime<Utc>,
) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO panic_alerts (user_id, latitude, longitude, alert_time, status)
             VALUES (?, ?, ?, ?, ?)
             RETURNING alert_id",
            &[
                DatabaseValue::Int64(alert.user_id),
                DatabaseValue::Real64(alert.latitude),
                DatabaseValue::Real64(alert.longitude),
                DatabaseValue::String(format_timestamp(alert_time)),
                DatabaseValue::String(AlertStatus::Active.as_ref().to_string()),
            ],
        )
        .await?;

    returning_id(&rows, "alert_id")
}

/// Looks up a single panic alert.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_panic_alert(db: &dyn Database, alert_id: i64) -> Result<Option<PanicAlert>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM panic_alerts WHERE alert_id = ?",
            &[DatabaseValue::Int64(alert_id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let alert_time: String = row.to_value("alert_time").map_err(decode_error("alert_time"))?;
    let status: String = row.to_value("status").map_err(decode_error("status"))?;
    let status = status.parse::<AlertStatus>().map_err(|_| DbError::Conversion {
        message: format!("Invalid alert status '{status}'"),
    })?;

    Ok(Some(PanicAlert {
        id: row.to_value("alert_id").map_err(decode_error("alert_id"))?,
        user_id: row.to_value("user_id").map_err(decode_error("user_id"))?,
        latitude: row.to_value("latitude").map_err(decode_error("latitude"))?,
        longitude: row.to_value("longitude").map_err(decode_error("longitude"))?,
        alert_time: parse_timestamp(&alert_time)?,
        status,
    }))
}
