#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Route, incident, and panic alert types shared across the system.
//!
//! Defines the incident severity scale used by the safety scorer and the
//! tri-state [`SafetyStatus`] label derived from a score. Storage rows,
//! scoring inputs, and API types are all built on these definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// User that owns panic alerts when the request does not name one.
pub const DEMO_USER_ID: i64 = 1;

/// Severity of a reported incident, from 1 (low) to 3 (high).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IncidentSeverity {
    /// Level 1: nuisance incidents (overcrowding, minor disturbances)
    Low = 1,
    /// Level 2: harassment, bag snatching, verbal abuse
    Medium = 2,
    /// Level 3: theft, accidents, assault
    High = 3,
}

impl IncidentSeverity {
    /// Returns the numeric value used when averaging severities.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// Tri-state label derived from a safety score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SafetyStatus {
    /// Score of 70 or above.
    Safe,
    /// Score from 50 to 69.
    Caution,
    /// Score below 50.
    Unsafe,
}

impl SafetyStatus {
    /// Lowest score labelled [`SafetyStatus::Safe`].
    pub const SAFE_THRESHOLD: u8 = 70;
    /// Lowest score labelled [`SafetyStatus::Caution`].
    pub const CAUTION_THRESHOLD: u8 = 50;

    /// Derives the status label for a score.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score >= Self::SAFE_THRESHOLD {
            Self::Safe
        } else if score >= Self::CAUTION_THRESHOLD {
            Self::Caution
        } else {
            Self::Unsafe
        }
    }
}

/// Lifecycle state of a panic alert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertStatus {
    /// Raised and not yet handled.
    Active,
    /// Handled by a responder.
    Resolved,
}

/// A transit route. Reference data, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Primary key.
    pub id: i64,
    /// Public route number (e.g. `"45B"`).
    pub number: String,
    /// Human-readable route name.
    pub name: String,
    /// Name of the first stop.
    pub start_location: String,
    /// Name of the last stop.
    pub end_location: String,
    /// End-to-end distance in kilometres.
    pub distance_km: f64,
    /// Typical end-to-end duration in minutes.
    pub avg_duration_mins: i64,
}

impl Route {
    /// Whether `term` is a case-insensitive substring of the route number,
    /// name, start, or end location. An empty term matches every route.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        [
            &self.start_location,
            &self.end_location,
            &self.name,
            &self.number,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A safety incident as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Primary key.
    pub id: i64,
    /// Route the incident was reported on.
    pub route_id: i64,
    /// Free-form tag (`"theft"`, `"harassment"`, ...).
    pub incident_type: String,
    /// Severity level.
    pub severity: IncidentSeverity,
    /// Reporter's description.
    pub description: Option<String>,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// When the incident was reported.
    pub reported_at: DateTime<Utc>,
}

/// A validated incident report waiting to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncident {
    /// Route the incident was reported on.
    pub route_id: i64,
    /// Free-form tag.
    pub incident_type: String,
    /// Severity level.
    pub severity: IncidentSeverity,
    /// Reporter's description.
    pub description: Option<String>,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

/// The two incident attributes the safety scorer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredIncident {
    /// Severity level.
    pub severity: IncidentSeverity,
    /// When the incident was reported.
    pub reported_at: DateTime<Utc>,
}

/// An emergency alert raised by a rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanicAlert {
    /// Primary key.
    pub id: i64,
    /// User who raised the alert.
    pub user_id: i64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// When the alert was raised.
    pub alert_time: DateTime<Utc>,
    /// Lifecycle state.
    pub status: AlertStatus,
}

/// A validated panic alert waiting to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewPanicAlert {
    /// User who raised the alert.
    pub user_id: i64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

impl NewPanicAlert {
    /// Link that opens the alert location in a web map.
    #[must_use]
    pub fn maps_link(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.latitude, self.longitude
        )
    }
}

/// A registered rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number for alert delivery.
    pub phone_number: String,
}
