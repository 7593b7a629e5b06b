//! Collaborator seams: everything the routing engine drives but does not own.

use chrono::NaiveDateTime;
use sf_core::{LinkId, NodeId, PollutantIdx, Real};
use sf_network::Network;

use crate::error::RoutingResult;

/// Ledger category an inflow is booked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InflowCategory {
    DryWeather,
    WetWeather,
    Groundwater,
    Rdii,
    External,
}

/// Hydraulic solver that moves lateral inflow through the links.
pub trait FlowRouter {
    /// Solver name for diagnostics.
    fn name(&self) -> &'static str;

    fn initialize(&mut self, network: &mut Network) -> RoutingResult<()>;

    /// Largest stable step not exceeding `requested` (seconds).
    fn step_size(&self, network: &Network, requested: Real) -> Real;

    /// Route one step, visiting links in `order`. Returns the iteration count.
    fn route(&mut self, network: &mut Network, order: &[LinkId], step: Real)
    -> RoutingResult<usize>;

    fn shutdown(&mut self, _network: &mut Network) {}
}

/// Water quality transport solver.
pub trait QualityRouter {
    fn name(&self) -> &'static str;

    fn initialize(&mut self, network: &mut Network) -> RoutingResult<()>;

    /// On entry each node's `new_qual` holds this step's lateral mass inflow;
    /// on exit it holds the node's concentration.
    fn route(&mut self, network: &mut Network, order: &[LinkId], step: Real) -> RoutingResult<()>;
}

/// Continuity bookkeeping for everything entering and leaving the network.
pub trait MassBalance {
    /// Integrate the current step totals over `dt` seconds.
    fn accumulate_half_step(&mut self, dt: Real);
    /// Clear the per-step totals.
    fn begin_step_totals(&mut self);
    fn add_inflow(&mut self, category: InflowCategory, flow: Real);
    fn add_inflow_quality(&mut self, category: InflowCategory, pollutant: PollutantIdx, mass: Real);
    fn add_outflow(&mut self, flow: Real, flooded: bool);
    fn add_outflow_quality(&mut self, pollutant: PollutantIdx, mass: Real, flooded: bool);
    fn add_node_losses(&mut self, evap_rate: Real, seep_rate: Real);
    fn add_link_losses(&mut self, evap_total: Real, seep_total: Real);
    /// Relative flow imbalance of the most recently completed step.
    fn step_flow_error(&self) -> Real;
}

/// Operator control rules; may change link target settings.
pub trait ControlRules {
    fn evaluate(
        &mut self,
        network: &mut Network,
        date: NaiveDateTime,
        elapsed_days: Real,
        step_days: Real,
    );
}

/// Receives per-step routing statistics.
pub trait FlowStatistics {
    fn record_flow_stats(
        &mut self,
        step: Real,
        end_date: NaiveDateTime,
        iterations: usize,
        steady_state: bool,
    );
}

/// Rainfall-derived infiltration/inflow, looked up by date.
pub trait RdiiSource {
    /// Append `(node, flow)` pairs for the given date.
    fn rdii_flows(&mut self, date: NaiveDateTime, out: &mut Vec<(NodeId, Real)>);
}

/// One node's entry in a routing interface file.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceInflow {
    pub node: NodeId,
    pub flow: Real,
    /// Concentration per pollutant.
    pub concen: Vec<Real>,
}

/// Inflows replayed from an upstream run's interface file.
pub trait InterfaceSource {
    fn interface_inflows(&mut self, date: NaiveDateTime, out: &mut Vec<InterfaceInflow>);
}

/// Quality router for runs without pollutants.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoQuality;

impl QualityRouter for NoQuality {
    fn name(&self) -> &'static str {
        "none"
    }

    fn initialize(&mut self, _network: &mut Network) -> RoutingResult<()> {
        Ok(())
    }

    fn route(&mut self, _network: &mut Network, _order: &[LinkId], _step: Real) -> RoutingResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoRules;

impl ControlRules for NoRules {
    fn evaluate(&mut self, _: &mut Network, _: NaiveDateTime, _: Real, _: Real) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoStats;

impl FlowStatistics for NoStats {
    fn record_flow_stats(&mut self, _: Real, _: NaiveDateTime, _: usize, _: bool) {}
}
