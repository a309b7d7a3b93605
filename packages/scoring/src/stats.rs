//! Fleet-wide safety summary.

use chrono::Utc;
use futures::stream::{self, StreamExt as _, TryStreamExt as _};
use serde::Serialize;
use waysure_route_models::Route;

use crate::clock::Clock;
use crate::score::window_cutoff;
use crate::{IncidentStore, SCORE_CONCURRENCY, SafetyScore, ScoringError, score_route_at};

/// The lowest-scoring route in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorstRoute {
    /// Route primary key.
    pub route_id: i64,
    /// Public route number.
    pub route_number: String,
    /// Its score.
    pub score: u8,
}

/// Summary across every route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetStats {
    /// Number of routes.
    pub total_routes: u64,
    /// Incidents on any route in the last 30 days.
    pub total_incidents: u64,
    /// Lowest-scoring route, `None` when there are no routes.
    pub most_dangerous: Option<WorstRoute>,
}

/// Picks the route with the minimum score. On ties the first route in
/// iteration order wins.
pub fn most_dangerous<'a>(
    scored: impl IntoIterator<Item = (&'a Route, u8)>,
) -> Option<WorstRoute> {
    let mut worst: Option<(&Route, u8)> = None;
    for (route, score) in scored {
        if worst.is_none_or(|(_, lowest)| score < lowest) {
            worst = Some((route, score));
        }
    }
    worst.map(|(route, score)| WorstRoute {
        route_id: route.id,
        route_number: route.number.clone(),
        score,
    })
}

/// Computes the fleet summary as of the clock's current time.
///
/// Each route is scored independently against the store; all scores share
/// one evaluation instant.
///
/// # Errors
///
/// Returns [`ScoringError`] if any store query fails.
pub async fn fleet_stats(
    store: &dyn IncidentStore,
    clock: &dyn Clock,
) -> Result<FleetStats, ScoringError> {
    let now = clock.now();
    let routes = store.list_all_routes().await?;
    let total_incidents = store
        .count_incidents_since(window_cutoff(now.with_timezone(&Utc)))
        .await?;

    let scores: Vec<SafetyScore> = stream::iter(
        routes
            .iter()
            .map(|route| score_route_at(store, route.id, now)),
    )
    .buffered(SCORE_CONCURRENCY)
    .try_collect()
    .await?;

    let most_dangerous = most_dangerous(routes.iter().zip(scores.iter().map(|s| s.score)));

    if let Some(worst) = &most_dangerous {
        log::debug!(
            "Most dangerous route: {} ({}) with score {}",
            worst.route_number,
            worst.route_id,
            worst.score
        );
    }

    Ok(FleetStats {
        total_routes: u64::try_from(routes.len()).unwrap_or(u64::MAX),
        total_incidents,
        most_dangerous,
    })
}
