//! Time patterns: multiplicative adjustments keyed by month, weekday or hour.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use sf_core::Real;

use crate::error::{NetworkError, NetworkResult};

/// Which calendar field a pattern is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// 12 factors, January first.
    Monthly,
    /// 7 factors, Sunday first.
    Daily,
    /// 24 factors, midnight first.
    Hourly,
    /// 24 hourly factors applied on Saturday and Sunday only.
    Weekend,
}

impl PatternKind {
    pub fn len(self) -> usize {
        match self {
            PatternKind::Monthly => 12,
            PatternKind::Daily => 7,
            PatternKind::Hourly | PatternKind::Weekend => 24,
        }
    }

    fn label(self) -> &'static str {
        match self {
            PatternKind::Monthly => "Monthly",
            PatternKind::Daily => "Daily",
            PatternKind::Hourly => "Hourly",
            PatternKind::Weekend => "Weekend",
        }
    }
}

/// Calendar fields a pattern lookup needs, decomposed once per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarKey {
    /// 0 = January
    pub month: usize,
    /// 0 = Sunday
    pub weekday: usize,
    /// 0..24
    pub hour: usize,
}

impl CalendarKey {
    pub fn from_date(date: NaiveDateTime) -> Self {
        Self {
            month: date.month0() as usize,
            weekday: date.weekday().num_days_from_sunday() as usize,
            hour: date.hour() as usize,
        }
    }

    pub fn is_weekend(&self) -> bool {
        self.weekday == 0 || self.weekday == 6
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    kind: PatternKind,
    factors: Vec<Real>,
}

impl Pattern {
    pub fn new(kind: PatternKind, factors: Vec<Real>) -> NetworkResult<Self> {
        if factors.len() != kind.len() {
            return Err(NetworkError::PatternLength {
                kind: kind.label(),
                expected: kind.len(),
                got: factors.len(),
            });
        }
        Ok(Self { kind, factors })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Multiplier for the given instant. Weekend patterns are neutral on weekdays.
    pub fn factor(&self, key: CalendarKey) -> Real {
        match self.kind {
            PatternKind::Monthly => self.factors[key.month],
            PatternKind::Daily => self.factors[key.weekday],
            PatternKind::Hourly => self.factors[key.hour],
            PatternKind::Weekend if key.is_weekend() => self.factors[key.hour],
            PatternKind::Weekend => 1.0,
        }
    }
}

/// The up-to-four patterns a dry-weather inflow may be adjusted by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwfPatterns {
    pub monthly: Option<Pattern>,
    pub daily: Option<Pattern>,
    pub hourly: Option<Pattern>,
    pub weekend: Option<Pattern>,
}

impl DwfPatterns {
    /// Combined multiplier. On weekends a weekend pattern replaces the hourly one.
    pub fn factor(&self, key: CalendarKey) -> Real {
        let mut f = 1.0;
        if let Some(p) = &self.monthly {
            f *= p.factor(key);
        }
        if let Some(p) = &self.daily {
            f *= p.factor(key);
        }
        match (&self.weekend, &self.hourly) {
            (Some(w), _) if key.is_weekend() => f *= w.factor(key),
            (_, Some(h)) => f *= h.factor(key),
            _ => {}
        }
        f
    }
}
