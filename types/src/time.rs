//! Timestamps, calendar days and the clock abstraction.
//!
//! Timestamps are Unix epoch seconds (UTC). Calendar days are derived from a
//! timestamp plus a fixed UTC offset so that "today" and "yesterday" follow the
//! community's local midnight rather than UTC midnight.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SECS_PER_DAY: u64 = 86_400;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before 1970 reads as the epoch.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }

    /// The local calendar day this instant falls on.
    pub fn calendar_day(&self, utc_offset_secs: i64) -> CalendarDay {
        let shifted = (self.0 as i64).saturating_add(utc_offset_secs).max(0) as u64;
        CalendarDay(shifted / SECS_PER_DAY)
    }

    pub fn saturating_sub_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// A whole local day, counted from the epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDay(u64);

impl CalendarDay {
    pub const fn new(day: u64) -> Self {
        Self(day)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The day before, saturating at day zero.
    pub fn previous(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Number of whole days from `earlier` to `self` (zero if `earlier` is later).
    pub fn days_since(&self, earlier: CalendarDay) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {}", self.0)
    }
}

/// Source of the current time.
///
/// Production code uses [`SystemClock`]; tests swap in a deterministic clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
