//! Flow-routing step statistics.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sf_core::Real;
use sf_routing::FlowStatistics;

/// Upper bounds (seconds) of the step-size histogram bins; the last bin is open.
pub const STEP_BINS: [Real; 8] = [0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0];

/// Step counts per size bin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepHistogram {
    pub counts: [usize; STEP_BINS.len() + 1],
}

impl StepHistogram {
    pub fn record(&mut self, step: Real) {
        let bin = STEP_BINS
            .iter()
            .position(|&upper| step < upper)
            .unwrap_or(STEP_BINS.len());
        self.counts[bin] += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Summary of routing steps taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub steps: usize,
    pub steady_steps: usize,
    pub min_step: Real,
    pub max_step: Real,
    pub mean_step: Real,
    pub total_iterations: usize,
    /// Mean iterations over the steps where the solver ran.
    pub mean_iterations: Real,
    /// Percent of steps treated as steady state.
    pub steady_pct: Real,
    pub last_date: Option<NaiveDateTime>,
    pub histogram: StepHistogram,
}

#[derive(Debug, Clone, Default)]
pub struct RoutingStats {
    steps: usize,
    steady_steps: usize,
    routed_steps: usize,
    min_step: Option<Real>,
    max_step: Real,
    total_time: Real,
    total_iterations: usize,
    last_date: Option<NaiveDateTime>,
    histogram: StepHistogram,
}

impl RoutingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn report(&self) -> StatsReport {
        let per_step = |x: Real, n: usize| if n > 0 { x / n as Real } else { 0.0 };
        StatsReport {
            steps: self.steps,
            steady_steps: self.steady_steps,
            min_step: self.min_step.unwrap_or(0.0),
            max_step: self.max_step,
            mean_step: per_step(self.total_time, self.steps),
            total_iterations: self.total_iterations,
            mean_iterations: per_step(self.total_iterations as Real, self.routed_steps),
            steady_pct: 100.0 * per_step(self.steady_steps as Real, self.steps),
            last_date: self.last_date,
            histogram: self.histogram.clone(),
        }
    }
}

impl FlowStatistics for RoutingStats {
    fn record_flow_stats(
        &mut self,
        step: Real,
        end_date: NaiveDateTime,
        iterations: usize,
        steady_state: bool,
    ) {
        self.steps += 1;
        self.total_time += step;
        self.max_step = self.max_step.max(step);
        self.min_step = Some(self.min_step.map_or(step, |m| m.min(step)));
        self.histogram.record(step);
        self.last_date = Some(end_date);
        if steady_state {
            self.steady_steps += 1;
        } else {
            self.routed_steps += 1;
            self.total_iterations += iterations;
        }
    }
}
