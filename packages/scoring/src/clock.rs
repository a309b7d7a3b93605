//! Time sources for score evaluation.
//!
//! The scorer never reads the wall clock itself. Callers hand it a
//! [`Clock`], which is [`SystemClock`] in the server and [`FixedClock`]
//! in tests.

use chrono::{DateTime, FixedOffset, Local};

/// Source of the current instant, carrying the local UTC offset so the
/// time-of-day risk can be evaluated against the local hour.
pub trait Clock: Send + Sync {
    /// Returns the current instant in local time.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the host's wall clock and local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<FixedOffset>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
