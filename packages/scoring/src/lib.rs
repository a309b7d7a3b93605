#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route safety scoring.
//!
//! [`score::score_incidents`] turns a route's recent incidents into a
//! bounded score. The rest of this crate applies it against an
//! [`IncidentStore`]: single-route lookups, [`search`] ranking, and the
//! fleet-wide [`stats`] summary. Every score is recomputed from the store
//! on each call.

pub mod clock;
pub mod score;
pub mod search;
pub mod stats;

#[cfg(test)]
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use thiserror::Error;
use waysure_route_models::{Route, SafetyStatus, ScoredIncident};

use crate::clock::Clock;
use crate::score::{ScoreBreakdown, score_incidents, window_cutoff};

/// Maximum number of route scores computed concurrently.
pub(crate) const SCORE_CONCURRENCY: usize = 8;

/// Errors that can occur while computing scores.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The incident store could not answer a query.
    #[error("Incident store error: {0}")]
    Store(String),
}

/// Read access to routes and incidents needed by the scorer.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Returns the severity and report time of every incident on
    /// `route_id` reported strictly after `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError`] if the store cannot be queried.
    async fn list_incidents_since(
        &self,
        route_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ScoredIncident>, ScoringError>;

    /// Returns every route in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError`] if the store cannot be queried.
    async fn list_all_routes(&self) -> Result<Vec<Route>, ScoringError>;

    /// Counts incidents on all routes reported strictly after `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError`] if the store cannot be queried.
    async fn count_incidents_since(&self, cutoff: DateTime<Utc>) -> Result<u64, ScoringError>;
}

/// A route's score with its derived status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafetyScore {
    /// Route the score belongs to.
    pub route_id: i64,
    /// Score from 0 to 100.
    pub score: u8,
    /// Status label derived from `score`.
    pub status: SafetyStatus,
    /// Intermediate values of the computation.
    pub breakdown: ScoreBreakdown,
}

/// Scores a route as of the clock's current time.
///
/// An unknown `route_id` has no incidents and scores 95.
///
/// # Errors
///
/// Returns [`ScoringError`] if the incident store query fails.
pub async fn route_safety_score(
    store: &dyn IncidentStore,
    clock: &dyn Clock,
    route_id: i64,
) -> Result<SafetyScore, ScoringError> {
    score_route_at(store, route_id, clock.now()).await
}

/// Scores a route as of `now`.
///
/// # Errors
///
/// Returns [`ScoringError`] if the incident store query fails.
pub async fn score_route_at(
    store: &dyn IncidentStore,
    route_id: i64,
    now: DateTime<FixedOffset>,
) -> Result<SafetyScore, ScoringError> {
    let cutoff = window_cutoff(now.with_timezone(&Utc));
    let incidents = store.list_incidents_since(route_id, cutoff).await?;
    let breakdown = score_incidents(&incidents, now);

    log::debug!(
        "Route {route_id}: {} incident(s) in window, score {}",
        breakdown.incident_count,
        breakdown.score
    );

    Ok(SafetyScore {
        route_id,
        score: breakdown.score,
        status: breakdown.status(),
        breakdown,
    })
}
