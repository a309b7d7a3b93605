//! Route search ranked by safety.

use futures::stream::{self, StreamExt as _, TryStreamExt as _};
use serde::Serialize;
use waysure_route_models::Route;

use crate::clock::Clock;
use crate::{IncidentStore, SCORE_CONCURRENCY, SafetyScore, ScoringError, score_route_at};

/// A matching route with its current score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRoute {
    /// The route.
    pub route: Route,
    /// Its score as of the search.
    pub safety: SafetyScore,
}

/// Finds routes whose number, name, start, or end contains `term`
/// (case-insensitive) and ranks them safest first.
///
/// Routes with equal scores keep their listing order. Every route shares
/// a single evaluation instant read from `clock`.
///
/// # Errors
///
/// Returns [`ScoringError`] if any store query fails.
pub async fn search_routes(
    store: &dyn IncidentStore,
    clock: &dyn Clock,
    term: &str,
) -> Result<Vec<RankedRoute>, ScoringError> {
    let now = clock.now();
    let matches: Vec<Route> = store
        .list_all_routes()
        .await?
        .into_iter()
        .filter(|route| route.matches(term))
        .collect();

    log::debug!("Search '{term}' matched {} route(s)", matches.len());

    let scores: Vec<SafetyScore> = stream::iter(
        matches
            .iter()
            .map(|route| score_route_at(store, route.id, now)),
    )
    .buffered(SCORE_CONCURRENCY)
    .try_collect()
    .await?;

    let ranked = matches
        .into_iter()
        .zip(scores)
        .map(|(route, safety)| RankedRoute { route, safety })
        .collect();

    Ok(rank(ranked))
}

/// Sorts by score descending. The sort is stable, so ties keep their
/// incoming order.
#[must_use]
pub fn rank(mut routes: Vec<RankedRoute>) -> Vec<RankedRoute> {
    routes.sort_by_key(|r| std::cmp::Reverse(r.safety.score));
    routes
}
