//! In-memory [`IncidentStore`] used by this crate's tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use waysure_route_models::{IncidentSeverity, Route, ScoredIncident};

use crate::{IncidentStore, ScoringError};

pub fn noon() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-10-14T12:00:00+00:00").unwrap()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    routes: Vec<Route>,
    incidents: Vec<(i64, ScoredIncident)>,
    fail: bool,
}

impl MemoryStore {
    /// Routes get ids 1, 2, 3, ... in the order given.
    pub fn with_routes(numbers: &[&str]) -> Self {
        let routes = numbers
            .iter()
            .zip(1..)
            .map(|(number, id)| Route {
                id,
                number: (*number).to_string(),
                name: format!("Line {number}"),
                start_location: format!("Depot {id}"),
                end_location: "Downtown".to_string(),
                distance_km: 10.0,
                avg_duration_mins: 30,
            })
            .collect();
        Self {
            routes,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn add_incident(
        &mut self,
        route_id: i64,
        now: DateTime<FixedOffset>,
        days_ago: i64,
        severity: IncidentSeverity,
    ) {
        self.incidents.push((
            route_id,
            ScoredIncident {
                severity,
                reported_at: now.with_timezone(&Utc) - Duration::days(days_ago),
            },
        ));
    }

    fn check(&self) -> Result<(), ScoringError> {
        if self.fail {
            Err(ScoringError::Store("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn list_incidents_since(
        &self,
        route_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ScoredIncident>, ScoringError> {
        self.check()?;
        Ok(self
            .incidents
            .iter()
            .filter(|(id, i)| *id == route_id && i.reported_at > cutoff)
            .map(|(_, i)| *i)
            .collect())
    }

    async fn list_all_routes(&self) -> Result<Vec<Route>, ScoringError> {
        self.check()?;
        Ok(self.routes.clone())
    }

    async fn count_incidents_since(&self, cutoff: DateTime<Utc>) -> Result<u64, ScoringError> {
        self.check()?;
        let count = self
            .incidents
            .iter()
            .filter(|(_, i)| i.reported_at > cutoff)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
