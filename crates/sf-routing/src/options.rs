//! Routing options.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Flow routing method, passed through to the flow router for labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingModel {
    #[default]
    SteadyFlow,
    KinematicWave,
    DynamicWave,
}

/// An operator-defined window outside of which routing is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingEvent {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingOptions {
    pub routing_model: RoutingModel,
    /// Reuse the previous flow field while inflows are unchanged.
    pub skip_steady_state: bool,
    /// Relative lateral-inflow change that breaks steady state.
    pub lat_flow_tol: f64,
    /// Step flow-balance error that breaks steady state.
    pub sys_flow_tol: f64,
    /// Control-rule evaluation interval in seconds; 0 evaluates every step.
    pub rule_step_s: f64,
    pub ignore_quality: bool,
    pub flow_stats: bool,
    pub events: Vec<RoutingEvent>,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            routing_model: RoutingModel::default(),
            skip_steady_state: false,
            lat_flow_tol: 0.05,
            sys_flow_tol: 0.05,
            rule_step_s: 0.0,
            ignore_quality: false,
            flow_stats: true,
            events: Vec::new(),
        }
    }
}
