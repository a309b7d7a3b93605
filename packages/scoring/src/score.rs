//! The safety score calculation.
//!
//! A score is derived from incidents reported in the last
//! [`WINDOW_DAYS`] days:
//!
//! ```text
//! raw   = 100 - (15 * weighted_count + 10 * severity_avg + 5 * time_risk)
//! score = clamp(floor(raw), 0, 100)
//! ```
//!
//! `weighted_count` sums a recency weight per incident, `severity_avg` is
//! the plain mean of severity values, and `time_risk` is 1.5 at night
//! (local hour >= 20 or <= 6) and 1.0 otherwise. An empty window scores
//! [`EMPTY_WINDOW_SCORE`].
//!
//! Weights are carried as integer tenths and the whole formula is scaled
//! by `2 * incident_count`, so the floor is taken on an exact integer
//! quotient rather than on an accumulated float.

use chrono::{DateTime, Duration, FixedOffset, Timelike as _, Utc};
use serde::Serialize;
use waysure_route_models::{SafetyStatus, ScoredIncident};

/// Size of the scoring window.
pub const WINDOW_DAYS: i64 = 30;

/// Score of a route with no incidents inside the window.
pub const EMPTY_WINDOW_SCORE: u8 = 95;

/// Size of the window for the "recent incidents" list on route details.
pub const RECENT_DAYS: i64 = 7;

/// Returns the exclusive lower bound of the scoring window.
#[must_use]
pub fn window_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WINDOW_DAYS)
}

/// Returns the exclusive lower bound of the recent-incidents window.
#[must_use]
pub fn recent_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RECENT_DAYS)
}

/// Recency band of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyWeight {
    /// Reported at most 7 days ago.
    Recent,
    /// Reported more than 7 and at most 14 days ago.
    Fading,
    /// Reported more than 14 days ago.
    Stale,
}

impl RecencyWeight {
    /// Picks the band for an incident of the given age. Incidents dated
    /// in the future count as [`RecencyWeight::Recent`].
    #[must_use]
    pub fn for_age(age: Duration) -> Self {
        if age <= Duration::days(7) {
            Self::Recent
        } else if age <= Duration::days(14) {
            Self::Fading
        } else {
            Self::Stale
        }
    }

    /// Weight in tenths: 10, 7, or 4.
    #[must_use]
    pub const fn tenths(self) -> i64 {
        match self {
            Self::Recent => 10,
            Self::Fading => 7,
            Self::Stale => 4,
        }
    }
}

/// Whether the local hour falls in the elevated-risk night band.
#[must_use]
pub const fn is_night_hour(hour: u32) -> bool {
    hour >= 20 || hour <= 6
}

/// Intermediate values of a score computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Incidents inside the window.
    pub incident_count: usize,
    /// Sum of recency weights.
    pub weighted_count: f64,
    /// Mean severity value (0 when the window is empty).
    pub severity_avg: f64,
    /// Time-of-day multiplier (1.0 or 1.5).
    pub time_risk: f64,
    /// Final clamped score.
    pub score: u8,
}

impl ScoreBreakdown {
    /// Status label for the score.
    #[must_use]
    pub const fn status(&self) -> SafetyStatus {
        SafetyStatus::from_score(self.score)
    }
}

/// Computes the safety score for a route's incidents as of `now`.
///
/// Incidents reported at or before `now - 30 days` are ignored, so the
/// caller may pass a superset of the window.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_incidents(
    incidents: &[ScoredIncident],
    now: DateTime<FixedOffset>,
) -> ScoreBreakdown {
    let now_utc = now.with_timezone(&Utc);
    let cutoff = window_cutoff(now_utc);
    let night = is_night_hour(now.hour());
    let time_risk = if night { 1.5 } else { 1.0 };

    let mut count = 0i64;
    let mut weight_tenths = 0i64;
    let mut severity_sum = 0i64;

    for incident in incidents.iter().filter(|i| i.reported_at > cutoff) {
        count += 1;
        weight_tenths += RecencyWeight::for_age(now_utc - incident.reported_at).tenths();
        severity_sum += i64::from(incident.severity.value());
    }

    if count == 0 {
        return ScoreBreakdown {
            incident_count: 0,
            weighted_count: 0.0,
            severity_avg: 0.0,
            time_risk,
            score: EMPTY_WINDOW_SCORE,
        };
    }

    // 2n * raw = 200n - 3n * tenths - 20 * severity_sum - n * (10 | 15)
    let time_term = if night { 15 } else { 10 };
    let numerator =
        200 * count - 3 * count * weight_tenths - 20 * severity_sum - count * time_term;
    let floored = numerator.div_euclid(2 * count);
    let score = u8::try_from(floored.clamp(0, 100)).unwrap_or(0);

    ScoreBreakdown {
        incident_count: usize::try_from(count).unwrap_or(usize::MAX),
        weighted_count: weight_tenths as f64 / 10.0,
        severity_avg: severity_sum as f64 / count as f64,
        time_risk,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waysure_route_models::IncidentSeverity;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn incident(
        now: DateTime<FixedOffset>,
        days_ago: i64,
        severity: IncidentSeverity,
    ) -> ScoredIncident {
        ScoredIncident {
            severity,
            reported_at: now.with_timezone(&Utc) - Duration::days(days_ago),
        }
    }

    const NOON: &str = "2026-10-14T12:00:00+00:00";
    const NIGHT: &str = "2026-10-14T22:00:00+00:00";

    #[test]
    fn empty_window_scores_95() {
        let now = at(NOON);
        let result = score_incidents(&[], now);
        assert_eq!(result.score, 95);
        assert_eq!(result.status(), SafetyStatus::Safe);
        assert_eq!(result.incident_count, 0);
    }

    #[test]
    fn incidents_older_than_window_are_ignored() {
        let now = at(NIGHT);
        let old = [
            incident(now, 30, IncidentSeverity::High),
            incident(now, 45, IncidentSeverity::High),
            incident(now, 400, IncidentSeverity::Medium),
        ];
        let result = score_incidents(&old, now);
        assert_eq!(result.score, 95);
        assert_eq!(result.incident_count, 0);
    }

    #[test]
    fn single_recent_high_incident_at_noon() {
        let now = at(NOON);
        let result = score_incidents(&[incident(now, 2, IncidentSeverity::High)], now);
        assert!((result.weighted_count - 1.0).abs() < f64::EPSILON);
        assert!((result.severity_avg - 3.0).abs() < f64::EPSILON);
        assert!((result.time_risk - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.score, 50);
        assert_eq!(result.status(), SafetyStatus::Caution);
    }

    #[test]
    fn single_stale_low_incident_at_night() {
        let now = at(NIGHT);
        let result = score_incidents(&[incident(now, 20, IncidentSeverity::Low)], now);
        assert!((result.weighted_count - 0.4).abs() < 1e-9);
        assert!((result.time_risk - 1.5).abs() < f64::EPSILON);
        // 100 - (6 + 10 + 7.5) = 76.5
        assert_eq!(result.score, 76);
        assert_eq!(result.status(), SafetyStatus::Safe);
    }

    #[test]
    fn recency_bands_strictly_decrease() {
        let three = RecencyWeight::for_age(Duration::days(3));
        let ten = RecencyWeight::for_age(Duration::days(10));
        let twenty = RecencyWeight::for_age(Duration::days(20));
        assert!(three.tenths() > ten.tenths());
        assert!(ten.tenths() > twenty.tenths());
        assert_eq!(twenty.tenths(), 4);
    }

    #[test]
    fn recency_band_edges_are_inclusive() {
        assert_eq!(RecencyWeight::for_age(Duration::days(7)), RecencyWeight::Recent);
        assert_eq!(
            RecencyWeight::for_age(Duration::days(7) + Duration::seconds(1)),
            RecencyWeight::Fading
        );
        assert_eq!(RecencyWeight::for_age(Duration::days(14)), RecencyWeight::Fading);
        assert_eq!(
            RecencyWeight::for_age(Duration::days(14) + Duration::seconds(1)),
            RecencyWeight::Stale
        );
        assert_eq!(RecencyWeight::for_age(Duration::hours(-3)), RecencyWeight::Recent);
    }

    #[test]
    fn night_band_edges() {
        assert!(is_night_hour(0));
        assert!(is_night_hour(6));
        assert!(!is_night_hour(7));
        assert!(!is_night_hour(19));
        assert!(is_night_hour(20));
        assert!(is_night_hour(23));
    }

    #[test]
    fn time_risk_uses_local_hour() {
        // 15:00 UTC is 20:30 in +05:30, so the night band applies.
        let now = at("2026-10-14T20:30:00+05:30");
        let result = score_incidents(&[incident(now, 2, IncidentSeverity::High)], now);
        assert!((result.time_risk - 1.5).abs() < f64::EPSILON);
        // 100 - (15 + 30 + 7.5) = 47.5
        assert_eq!(result.score, 47);
    }

    #[test]
    fn severity_average_is_unweighted() {
        let now = at(NOON);
        let incidents = [
            incident(now, 1, IncidentSeverity::Low),
            incident(now, 20, IncidentSeverity::High),
        ];
        let result = score_incidents(&incidents, now);
        assert!((result.severity_avg - 2.0).abs() < f64::EPSILON);
        assert!((result.weighted_count - 1.4).abs() < 1e-9);
        // 100 - (21 + 20 + 5) = 54
        assert_eq!(result.score, 54);
    }

    #[test]
    fn score_clamps_at_zero() {
        let now = at(NIGHT);
        let incidents: Vec<_> = (0..20)
            .map(|_| incident(now, 1, IncidentSeverity::High))
            .collect();
        let result = score_incidents(&incidents, now);
        assert_eq!(result.score, 0);
        assert_eq!(result.status(), SafetyStatus::Unsafe);
    }

    #[test]
    fn adding_incidents_from_last_two_weeks_never_raises_score() {
        let severities = IncidentSeverity::all();
        for now in [at(NOON), at(NIGHT)] {
            let mut incidents = vec![incident(now, 25, IncidentSeverity::High)];
            let mut previous = score_incidents(&incidents, now).score;
            for step in 0..40usize {
                let severity = severities[step % severities.len()];
                let days_ago = i64::try_from(step % 14).unwrap();
                incidents.push(incident(now, days_ago, severity));
                let score = score_incidents(&incidents, now).score;
                assert!(score <= 100);
                assert!(score <= previous, "score rose from {previous} to {score} at step {step}");
                previous = score;
            }
        }
    }

    #[test]
    fn stale_low_incident_can_lift_a_single_high_window() {
        // The mean-severity term drops by more than the 0.4 weight adds:
        // 100 - (6 + 30 + 5) = 59, then 100 - (12 + 20 + 5) = 63.
        let now = at(NOON);
        let mut incidents = vec![incident(now, 20, IncidentSeverity::High)];
        assert_eq!(score_incidents(&incidents, now).score, 59);
        incidents.push(incident(now, 20, IncidentSeverity::Low));
        assert_eq!(score_incidents(&incidents, now).score, 63);
    }

    #[test]
    fn adding_high_incident_to_low_window_never_raises_score() {
        let now = at(NOON);
        let mut incidents = vec![incident(now, 20, IncidentSeverity::Low)];
        let before = score_incidents(&incidents, now).score;
        incidents.push(incident(now, 0, IncidentSeverity::High));
        let after = score_incidents(&incidents, now).score;
        assert!(after <= before);
    }

    #[test]
    fn exact_triple_fading_weight_floors_correctly() {
        // Three 10-day-old medium incidents at noon:
        // 100 - (15 * 2.1 + 20 + 5) = 43.5 -> 43
        let now = at(NOON);
        let incidents: Vec<_> = (0..3)
            .map(|_| incident(now, 10, IncidentSeverity::Medium))
            .collect();
        assert_eq!(score_incidents(&incidents, now).score, 43);
    }

    #[test]
    fn window_cutoff_is_thirty_days_back() {
        let now = at(NOON).with_timezone(&Utc);
        assert_eq!(now - window_cutoff(now), Duration::days(30));
        assert_eq!(now - recent_cutoff(now), Duration::days(7));
    }
}
