//! Date-keyed time series with linear interpolation.

use chrono::NaiveDateTime;
use sf_core::Real;

use crate::error::{NetworkError, NetworkResult};

/// Outside its date range a series contributes nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    points: Vec<(NaiveDateTime, Real)>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, points: Vec<(NaiveDateTime, Real)>) -> NetworkResult<Self> {
        let name = name.into();
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(NetworkError::UnsortedSeries { name });
        }
        Ok(Self { name, points })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, date: NaiveDateTime) -> Real {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if date < first.0 || date > last.0 {
            return 0.0;
        }
        // First point strictly after `date`; everything before it is <= date.
        let i = self.points.partition_point(|(d, _)| *d <= date);
        if i == self.points.len() {
            return last.1;
        }
        let (d0, v0) = self.points[i - 1];
        let (d1, v1) = self.points[i];
        let span = (d1 - d0).num_milliseconds() as Real;
        let frac = (date - d0).num_milliseconds() as Real / span;
        v0 + frac * (v1 - v0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn interpolates_between_points() {
        let ts = TimeSeries::new(
            "ts",
            vec![(t0(), 0.0), (t0() + Duration::hours(2), 4.0)],
        )
        .unwrap();
        assert_eq!(ts.value_at(t0()), 0.0);
        assert_eq!(ts.value_at(t0() + Duration::hours(1)), 2.0);
        assert_eq!(ts.value_at(t0() + Duration::hours(2)), 4.0);
    }

    #[test]
    fn zero_outside_range() {
        let ts = TimeSeries::new("ts", vec![(t0(), 3.0), (t0() + Duration::hours(1), 3.0)])
            .unwrap();
        assert_eq!(ts.value_at(t0() - Duration::seconds(1)), 0.0);
        assert_eq!(ts.value_at(t0() + Duration::hours(2)), 0.0);
    }

    #[test]
    fn rejects_unsorted_points() {
        let err = TimeSeries::new("bad", vec![(t0(), 1.0), (t0(), 2.0)]).unwrap_err();
        assert!(matches!(err, NetworkError::UnsortedSeries { .. }));
    }
}
