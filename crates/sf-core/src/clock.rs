//! Routing clock: integer millisecond ticks since simulation start.
//!
//! Elapsed routing time is kept as an integer so that repeated step
//! additions never drift, and converted to calendar dates on demand.

use chrono::{Duration, NaiveDateTime};

use crate::numeric::Real;

/// Elapsed routing time in milliseconds since simulation start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub i64);

impl Ticks {
    pub const ZERO: Ticks = Ticks(0);
    /// Sentinel for "never" (e.g. the start of a routing event past the last one).
    pub const NEVER: Ticks = Ticks(i64::MAX);

    pub const PER_SECOND: i64 = 1000;

    /// Convert a duration in seconds to the nearest whole tick.
    pub fn from_secs(secs: Real) -> Self {
        Ticks((secs * Self::PER_SECOND as Real).round() as i64)
    }

    pub fn as_secs(self) -> Real {
        self.0 as Real / Self::PER_SECOND as Real
    }

    /// Advance by a step given in seconds.
    pub fn advance(self, secs: Real) -> Self {
        Ticks(self.0.saturating_add(Self::from_secs(secs).0))
    }

    /// Seconds from `self` until `later` (negative if `later` is earlier).
    pub fn secs_until(self, later: Ticks) -> Real {
        Ticks(later.0.saturating_sub(self.0)).as_secs()
    }

    /// True when the two instants are at most one tick apart.
    pub fn within_one_tick(self, other: Ticks) -> bool {
        self.0.abs_diff(other.0) <= 1
    }
}

impl core::ops::Add for Ticks {
    type Output = Ticks;

    fn add(self, rhs: Ticks) -> Ticks {
        Ticks(self.0.saturating_add(rhs.0))
    }
}

/// Maps routing ticks onto the calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    pub start: NaiveDateTime,
}

impl SimClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { start }
    }

    /// Calendar date/time at the given elapsed routing time.
    pub fn date_at(&self, t: Ticks) -> NaiveDateTime {
        self.start + Duration::milliseconds(t.0)
    }

    /// Elapsed routing time at the given calendar date/time.
    pub fn ticks_at(&self, date: NaiveDateTime) -> Ticks {
        Ticks((date - self.start).num_milliseconds())
    }

    /// Elapsed time in (fractional) days.
    pub fn elapsed_days(&self, t: Ticks) -> Real {
        t.as_secs() / 86_400.0
    }
}
