//! Flow and pollutant continuity ledger.

use serde::{Deserialize, Serialize};
use sf_core::{PollutantIdx, Real};
use sf_routing::{InflowCategory, MassBalance};
use tracing::debug;

/// Flow quantities by source and sink.
///
/// Holds rates for the current step, or volumes once integrated over time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub dry_weather: Real,
    pub wet_weather: Real,
    pub groundwater: Real,
    pub rdii: Real,
    pub external: Real,
    pub flooding: Real,
    pub outflow: Real,
    pub evap_loss: Real,
    pub seep_loss: Real,
}

impl FlowTotals {
    pub fn total_inflow(&self) -> Real {
        self.dry_weather + self.wet_weather + self.groundwater + self.rdii + self.external
    }

    pub fn total_outflow(&self) -> Real {
        self.flooding + self.outflow + self.evap_loss + self.seep_loss
    }

    fn add_inflow(&mut self, category: InflowCategory, q: Real) {
        let slot = match category {
            InflowCategory::DryWeather => &mut self.dry_weather,
            InflowCategory::WetWeather => &mut self.wet_weather,
            InflowCategory::Groundwater => &mut self.groundwater,
            InflowCategory::Rdii => &mut self.rdii,
            InflowCategory::External => &mut self.external,
        };
        *slot += q;
    }

    fn add_scaled(&mut self, rates: &FlowTotals, dt: Real) {
        self.dry_weather += rates.dry_weather * dt;
        self.wet_weather += rates.wet_weather * dt;
        self.groundwater += rates.groundwater * dt;
        self.rdii += rates.rdii * dt;
        self.external += rates.external * dt;
        self.flooding += rates.flooding * dt;
        self.outflow += rates.outflow * dt;
        self.evap_loss += rates.evap_loss * dt;
        self.seep_loss += rates.seep_loss * dt;
    }
}

/// Pollutant mass by source and sink, for one pollutant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityTotals {
    pub dry_weather: Real,
    pub wet_weather: Real,
    pub groundwater: Real,
    pub rdii: Real,
    pub external: Real,
    pub flooding: Real,
    pub outflow: Real,
}

impl QualityTotals {
    pub fn total_inflow(&self) -> Real {
        self.dry_weather + self.wet_weather + self.groundwater + self.rdii + self.external
    }

    pub fn total_outflow(&self) -> Real {
        self.flooding + self.outflow
    }

    fn add_inflow(&mut self, category: InflowCategory, w: Real) {
        let slot = match category {
            InflowCategory::DryWeather => &mut self.dry_weather,
            InflowCategory::WetWeather => &mut self.wet_weather,
            InflowCategory::Groundwater => &mut self.groundwater,
            InflowCategory::Rdii => &mut self.rdii,
            InflowCategory::External => &mut self.external,
        };
        *slot += w;
    }

    fn add_scaled(&mut self, rates: &QualityTotals, dt: Real) {
        self.dry_weather += rates.dry_weather * dt;
        self.wet_weather += rates.wet_weather * dt;
        self.groundwater += rates.groundwater * dt;
        self.rdii += rates.rdii * dt;
        self.external += rates.external * dt;
        self.flooding += rates.flooding * dt;
        self.outflow += rates.outflow * dt;
    }
}

/// End-of-run continuity summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityReport {
    pub flow: FlowTotals,
    pub initial_storage: Real,
    pub final_storage: Real,
    /// Percent of total inflow (storage included) not accounted for.
    pub flow_error_pct: Real,
    pub quality: Vec<QualityTotals>,
    pub quality_error_pct: Vec<Real>,
}

/// Routing continuity ledger.
///
/// Step totals are rates; the routing engine integrates them into the
/// cumulative volumes by calling [`MassBalance::accumulate_half_step`] at
/// the start and end of every step (trapezoidal in time).
#[derive(Debug, Clone, Default)]
pub struct ContinuityLedger {
    step: FlowTotals,
    total: FlowTotals,
    step_qual: Vec<QualityTotals>,
    total_qual: Vec<QualityTotals>,
    initial_storage: Real,
}

impl ContinuityLedger {
    pub fn new(n_pollutants: usize) -> Self {
        Self {
            step_qual: vec![QualityTotals::default(); n_pollutants],
            total_qual: vec![QualityTotals::default(); n_pollutants],
            ..Self::default()
        }
    }

    /// Volume held in the network when routing starts.
    pub fn with_initial_storage(mut self, volume: Real) -> Self {
        self.initial_storage = volume;
        self
    }

    /// Rates booked in the current step.
    pub fn step_totals(&self) -> &FlowTotals {
        &self.step
    }

    /// Volumes accumulated so far.
    pub fn flow_totals(&self) -> &FlowTotals {
        &self.total
    }

    pub fn quality_totals(&self, pollutant: PollutantIdx) -> Option<&QualityTotals> {
        self.total_qual.get(pollutant)
    }

    /// Continuity summary given the volume still stored at the end.
    pub fn report(&self, final_storage: Real) -> ContinuityReport {
        let inflow = self.total.total_inflow() + self.initial_storage;
        let outflow = self.total.total_outflow() + final_storage;
        debug!(inflow, outflow, final_storage, "continuity totals");
        ContinuityReport {
            flow: self.total,
            initial_storage: self.initial_storage,
            final_storage,
            flow_error_pct: percent_error(inflow, outflow),
            quality: self.total_qual.clone(),
            quality_error_pct: self
                .total_qual
                .iter()
                .map(|q| percent_error(q.total_inflow(), q.total_outflow()))
                .collect(),
        }
    }
}

fn percent_error(inflow: Real, outflow: Real) -> Real {
    if inflow > 0.0 {
        100.0 * (1.0 - outflow / inflow)
    } else if outflow > 0.0 {
        100.0 * (inflow / outflow - 1.0)
    } else {
        0.0
    }
}

impl MassBalance for ContinuityLedger {
    fn accumulate_half_step(&mut self, dt: Real) {
        self.total.add_scaled(&self.step, dt);
        for (total, step) in self.total_qual.iter_mut().zip(&self.step_qual) {
            total.add_scaled(step, dt);
        }
    }

    fn begin_step_totals(&mut self) {
        self.step = FlowTotals::default();
        self.step_qual
            .iter_mut()
            .for_each(|q| *q = QualityTotals::default());
    }

    fn add_inflow(&mut self, category: InflowCategory, flow: Real) {
        self.step.add_inflow(category, flow);
    }

    fn add_inflow_quality(&mut self, category: InflowCategory, pollutant: PollutantIdx, mass: Real) {
        if let Some(q) = self.step_qual.get_mut(pollutant) {
            q.add_inflow(category, mass);
        }
    }

    fn add_outflow(&mut self, flow: Real, flooded: bool) {
        if flooded {
            self.step.flooding += flow;
        } else {
            self.step.outflow += flow;
        }
    }

    fn add_outflow_quality(&mut self, pollutant: PollutantIdx, mass: Real, flooded: bool) {
        if let Some(q) = self.step_qual.get_mut(pollutant) {
            if flooded {
                q.flooding += mass;
            } else {
                q.outflow += mass;
            }
        }
    }

    fn add_node_losses(&mut self, evap_rate: Real, seep_rate: Real) {
        self.step.evap_loss += evap_rate;
        self.step.seep_loss += seep_rate;
    }

    fn add_link_losses(&mut self, evap_total: Real, seep_total: Real) {
        self.step.evap_loss += evap_total;
        self.step.seep_loss += seep_total;
    }

    fn step_flow_error(&self) -> Real {
        let inflow = self.step.total_inflow();
        let outflow = self.step.total_outflow();
        if inflow > 0.0 {
            1.0 - outflow / inflow
        } else if outflow > 0.0 {
            inflow / outflow - 1.0
        } else {
            0.0
        }
    }
}
