//! Sample fleet used by `setup-db`.
//!
//! Inserts five routes, five incidents, and the demo user. Rows are keyed
//! by fixed IDs and written with `INSERT OR IGNORE`, so running the seed
//! twice leaves the first run's data untouched. Incident timestamps are
//! relative to `now` so a freshly seeded database has live scores.

use chrono::{DateTime, Duration, Utc};
use switchy_database::Database;
use waysure_route_models::{DEMO_USER_ID, Incident, IncidentSeverity, Route, User};

use crate::{DbError, queries};

/// Rows written by [`seed_sample_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Routes inserted.
    pub routes: u64,
    /// Incidents inserted.
    pub incidents: u64,
    /// Users inserted.
    pub users: u64,
}

fn route(id: i64, number: &str, name: &str, start: &str, end: &str, km: f64, mins: i64) -> Route {
    Route {
        id,
        number: number.to_string(),
        name: name.to_string(),
        start_location: start.to_string(),
        end_location: end.to_string(),
        distance_km: km,
        avg_duration_mins: mins,
    }
}

/// The sample routes.
#[must_use]
pub fn sample_routes() -> Vec<Route> {
    vec![
        route(1, "45B", "City Center to Tech Park", "Central Station", "Tech Park", 12.5, 35),
        route(2, "12A", "University Line", "University Gate", "Mall Road", 8.3, 25),
        route(3, "78C", "Airport Express", "Airport Terminal", "Railway Station", 18.7, 45),
        route(4, "23X", "Beach Route", "Marina Beach", "Shopping District", 6.2, 20),
        route(5, "56D", "Industrial Line", "Industrial Area", "Downtown", 15.4, 40),
    ]
}

/// The sample incidents, dated relative to `now`.
#[must_use]
pub fn sample_incidents(now: DateTime<Utc>) -> Vec<Incident> {
    let ago = |days: i64, hours: i64| now - Duration::days(days) - Duration::hours(hours);
    let incident = |id, route_id, kind: &str, severity, description: &str, lat, lng, at| Incident {
        id,
        route_id,
        incident_type: kind.to_string(),
        severity,
        description: Some(description.to_string()),
        latitude: lat,
        longitude: lng,
        reported_at: at,
    };

    vec![
        incident(1, 1, "theft", IncidentSeverity::High, "Phone stolen", 10.8231, 76.2711, ago(0, 2)),
        incident(2, 1, "harassment", IncidentSeverity::Medium, "Verbal abuse", 10.8245, 76.2725, ago(1, 18)),
        incident(3, 2, "overcrowding", IncidentSeverity::Low, "Very crowded bus", 10.8156, 76.2844, ago(3, 3)),
        incident(4, 3, "accident", IncidentSeverity::High, "Minor collision", 10.8478, 76.2712, ago(12, 0)),
        incident(5, 4, "theft", IncidentSeverity::Medium, "Bag snatching", 10.8234, 76.2899, ago(1, 12)),
    ]
}

/// The demo user that owns anonymous panic alerts.
#[must_use]
pub fn demo_user() -> User {
    User {
        id: DEMO_USER_ID,
        username: "demo_user".to_string(),
        email: "demo@waysure.com".to_string(),
        phone_number: "+919876543210".to_string(),
    }
}

/// Inserts the sample fleet, skipping rows that already exist.
///
/// # Errors
///
/// Returns [`DbError`] if any insert fails.
pub async fn seed_sample_data(db: &dyn Database, now: DateTime<Utc>) -> Result<SeedSummary, DbError> {
    let mut summary = SeedSummary::default();

    for route in &sample_routes() {
        summary.routes += queries::insert_route(db, route).await?;
    }
    log::info!("Sample routes added ({} new)", summary.routes);

    for incident in &sample_incidents(now) {
        summary.incidents += queries::insert_incident_with_id(db, incident).await?;
    }
    log::info!("Sample incidents added ({} new)", summary.incidents);

    summary.users += queries::insert_user(db, &demo_user()).await?;
    log::info!("Demo user added ({} new)", summary.users);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_db;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let (db, path) = temp_db("seed_idempotent").await;
        let now = Utc::now();

        let first = seed_sample_data(db.as_ref(), now).await.unwrap();
        assert_eq!(
            first,
            SeedSummary {
                routes: 5,
                incidents: 5,
                users: 1,
            }
        );

        let second = seed_sample_data(db.as_ref(), now).await.unwrap();
        assert_eq!(second, SeedSummary::default());

        assert_eq!(queries::list_routes(db.as_ref()).await.unwrap().len(), 5);
        assert_eq!(queries::count_incidents(db.as_ref()).await.unwrap(), 5);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn sample_incidents_fall_inside_the_window() {
        let now = Utc::now();
        for incident in sample_incidents(now) {
            let age = now - incident.reported_at;
            assert!(age > Duration::zero() && age < Duration::days(30));
        }
    }
}
