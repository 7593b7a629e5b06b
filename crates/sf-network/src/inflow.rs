//! Node-owned inflow records: direct (external) and dry-weather.

use chrono::NaiveDateTime;
use sf_core::{PollutantIdx, Real};

use crate::pattern::{CalendarKey, DwfPatterns, Pattern};
use crate::timeseries::TimeSeries;

/// How a pollutant record's value becomes a mass rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBasis {
    /// Value is a concentration; multiplied by the node's flow inflow.
    Concentration,
    /// Value is already a mass rate.
    Mass,
}

/// What an external inflow record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalTarget {
    Flow,
    Pollutant {
        index: PollutantIdx,
        basis: LoadBasis,
    },
}

/// Direct inflow: `conversion * (scale * series(t) + baseline * pattern(t))`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalInflow {
    pub target: ExternalTarget,
    pub series: Option<TimeSeries>,
    pub scale: Real,
    pub baseline: Real,
    pub baseline_pattern: Option<Pattern>,
    /// Unit conversion (flow units, or mass-rate units for `LoadBasis::Mass`).
    pub conversion: Real,
}

impl ExternalInflow {
    /// A constant flow inflow.
    pub fn constant_flow(baseline: Real) -> Self {
        Self {
            target: ExternalTarget::Flow,
            series: None,
            scale: 1.0,
            baseline,
            baseline_pattern: None,
            conversion: 1.0,
        }
    }

    /// A flow inflow driven by a time series.
    pub fn flow_series(series: TimeSeries, scale: Real) -> Self {
        Self {
            series: Some(series),
            scale,
            ..Self::constant_flow(0.0)
        }
    }

    /// A constant pollutant inflow.
    pub fn constant_pollutant(index: PollutantIdx, basis: LoadBasis, baseline: Real) -> Self {
        Self {
            target: ExternalTarget::Pollutant { index, basis },
            ..Self::constant_flow(baseline)
        }
    }

    pub fn is_flow(&self) -> bool {
        matches!(self.target, ExternalTarget::Flow)
    }

    pub fn value_at(&self, date: NaiveDateTime) -> Real {
        let mut baseline = self.baseline;
        if let Some(p) = &self.baseline_pattern {
            baseline *= p.factor(CalendarKey::from_date(date));
        }
        let series = self
            .series
            .as_ref()
            .map(|ts| ts.value_at(date) * self.scale)
            .unwrap_or(0.0);
        self.conversion * (series + baseline)
    }
}

/// What a dry-weather record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwfTarget {
    Flow,
    /// Value is a concentration applied to the dry-weather flow.
    Pollutant(PollutantIdx),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DryWeatherInflow {
    pub target: DwfTarget,
    pub average: Real,
    pub patterns: DwfPatterns,
}

impl DryWeatherInflow {
    pub fn flow(average: Real) -> Self {
        Self {
            target: DwfTarget::Flow,
            average,
            patterns: DwfPatterns::default(),
        }
    }

    pub fn pollutant(index: PollutantIdx, concentration: Real) -> Self {
        Self {
            target: DwfTarget::Pollutant(index),
            average: concentration,
            patterns: DwfPatterns::default(),
        }
    }

    pub fn with_patterns(mut self, patterns: DwfPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn is_flow(&self) -> bool {
        matches!(self.target, DwfTarget::Flow)
    }

    pub fn value_at(&self, key: CalendarKey) -> Real {
        self.average * self.patterns.factor(key)
    }
}
