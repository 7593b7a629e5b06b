//! Shared fixtures for routing integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use sf_core::{LinkId, PollutantIdx, Real};
use sf_network::Network;
use sf_routing::{
    FlowRouter, FlowStatistics, InflowCategory, MassBalance, PassThroughRouter, RoutingResult,
};

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Ledger that keeps step totals and a running inflow sum.
#[derive(Debug, Default)]
pub struct Ledger {
    pub step_in: Real,
    pub step_out: Real,
    pub total_in: Real,
    pub by_category: Vec<(InflowCategory, Real)>,
    pub half_steps: Vec<Real>,
}

impl MassBalance for Ledger {
    fn accumulate_half_step(&mut self, dt: Real) {
        self.half_steps.push(dt);
    }

    fn begin_step_totals(&mut self) {
        self.step_in = 0.0;
        self.step_out = 0.0;
        self.by_category.clear();
    }

    fn add_inflow(&mut self, category: InflowCategory, flow: Real) {
        self.step_in += flow;
        self.total_in += flow;
        self.by_category.push((category, flow));
    }

    fn add_inflow_quality(&mut self, _: InflowCategory, _: PollutantIdx, _: Real) {}

    fn add_outflow(&mut self, flow: Real, _: bool) {
        self.step_out += flow;
    }

    fn add_outflow_quality(&mut self, _: PollutantIdx, _: Real, _: bool) {}

    fn add_node_losses(&mut self, evap: Real, seep: Real) {
        self.step_out += evap + seep;
    }

    fn add_link_losses(&mut self, evap: Real, seep: Real) {
        self.step_out += evap + seep;
    }

    fn step_flow_error(&self) -> Real {
        if self.step_in > 0.0 {
            1.0 - self.step_out / self.step_in
        } else if self.step_out > 0.0 {
            self.step_in / self.step_out - 1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    pub steps: Vec<(Real, usize, bool)>,
}

impl FlowStatistics for Stats {
    fn record_flow_stats(&mut self, step: Real, _: NaiveDateTime, iterations: usize, steady: bool) {
        self.steps.push((step, iterations, steady));
    }
}

/// Pass-through routing that counts how often it is asked to route.
#[derive(Debug, Clone)]
pub struct CountingRouter {
    inner: PassThroughRouter,
    pub calls: Rc<Cell<usize>>,
    pub max_step: Real,
}

impl CountingRouter {
    pub fn new() -> Self {
        Self {
            inner: PassThroughRouter::new(),
            calls: Rc::new(Cell::new(0)),
            max_step: Real::INFINITY,
        }
    }
}

impl FlowRouter for CountingRouter {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn initialize(&mut self, network: &mut Network) -> RoutingResult<()> {
        self.inner.initialize(network)
    }

    fn step_size(&self, _: &Network, requested: Real) -> Real {
        requested.min(self.max_step)
    }

    fn route(&mut self, network: &mut Network, order: &[LinkId], step: Real) -> RoutingResult<usize> {
        self.calls.set(self.calls.get() + 1);
        self.inner.route(network, order, step)
    }
}
