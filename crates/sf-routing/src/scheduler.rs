//! The routing engine: step sizing and the per-step execution sequence.

use sf_core::{LinkId, Real, Ticks};
use tracing::{debug, info, warn};

use crate::context::SimContext;
use crate::error::{RoutingError, RoutingResult};
use crate::events::{EventGate, EventWindow};
use crate::inflows::{InflowInstant, aggregate_inflows};
use crate::losses::reconcile;
use crate::options::RoutingOptions;
use crate::routers::{MixingQuality, PassThroughRouter};
use crate::rules::RuleTimer;
use crate::steady_state::inflow_has_changed;
use crate::traits::{ControlRules, FlowRouter, FlowStatistics, MassBalance, NoRules, QualityRouter};

const SECONDS_PER_DAY: Real = 86_400.0;

/// What happened during one executed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step: Real,
    /// Solver iterations; zero when the solver did not run.
    pub iterations: usize,
    pub steady_state: bool,
    pub between_events: bool,
    /// Links whose setting changed at the start of the step.
    pub actions: usize,
    /// Routing clock at the end of the step.
    pub clock: Ticks,
}

/// Assembles the collaborators of a [`RoutingEngine`].
pub struct EngineBuilder {
    options: RoutingOptions,
    flow: Box<dyn FlowRouter>,
    quality: Box<dyn QualityRouter>,
    rules: Box<dyn ControlRules>,
}

impl EngineBuilder {
    pub fn flow_router(mut self, router: impl FlowRouter + 'static) -> Self {
        self.flow = Box::new(router);
        self
    }

    pub fn quality_router(mut self, router: impl QualityRouter + 'static) -> Self {
        self.quality = Box::new(router);
        self
    }

    pub fn control_rules(mut self, rules: impl ControlRules + 'static) -> Self {
        self.rules = Box::new(rules);
        self
    }

    /// Like [`control_rules`](Self::control_rules) for an already boxed rule set.
    pub fn boxed_control_rules(mut self, rules: Box<dyn ControlRules>) -> Self {
        self.rules = rules;
        self
    }

    /// Validate the topology, initialize the solvers and arm the event gate.
    pub fn open(self, ctx: &mut SimContext) -> RoutingResult<RoutingEngine> {
        let EngineBuilder {
            options,
            mut flow,
            mut quality,
            rules,
        } = self;

        if !(options.lat_flow_tol >= 0.0) || !(options.sys_flow_tol >= 0.0) {
            return Err(RoutingError::InvalidArg {
                what: "flow tolerances must be non-negative",
            });
        }

        let order = sf_network::sort_links(&ctx.network)?;
        if !order.acyclic {
            warn!("network contains a loop; links routed in ID order");
        }

        flow.initialize(&mut ctx.network)
            .map_err(|e| init_error(flow.name(), e))?;

        let route_quality = ctx.network.pollutant_count() > 0 && !options.ignore_quality;
        if route_quality {
            quality
                .initialize(&mut ctx.network)
                .map_err(|e| init_error(quality.name(), e))?;
        }

        let windows = options
            .events
            .iter()
            .map(|e| EventWindow::new(ctx.clock.ticks_at(e.start), ctx.clock.ticks_at(e.end)))
            .collect();
        let gate = EventGate::new(windows);

        info!(
            model = ?options.routing_model,
            solver = flow.name(),
            nodes = ctx.network.nodes().len(),
            links = order.links.len(),
            events = gate.events().len(),
            "routing engine opened"
        );

        Ok(RoutingEngine {
            rule_timer: RuleTimer::new(options.rule_step_s),
            options,
            flow,
            quality,
            rules,
            order: order.links,
            gate,
            route_quality,
            old_time: Ticks::ZERO,
            new_time: Ticks::ZERO,
            solver_ran: false,
            halted: false,
        })
    }
}

/// A usable step is finite and moves the clock by at least one tick.
fn advances_clock(step: Real) -> bool {
    step.is_finite() && step > 0.0 && Ticks::from_secs(step) > Ticks::ZERO
}

fn init_error(solver: &'static str, e: RoutingError) -> RoutingError {
    match e {
        e @ RoutingError::SolverInit { .. } => e,
        other => RoutingError::SolverInit {
            solver,
            message: other.to_string(),
        },
    }
}

fn solver_error(solver: &'static str, e: RoutingError) -> RoutingError {
    match e {
        e @ RoutingError::Solver { .. } => e,
        other => RoutingError::Solver {
            solver,
            message: other.to_string(),
        },
    }
}

/// Drives flow and quality routing through the network one step at a time.
///
/// The engine borrows the [`SimContext`] for each call and owns only its
/// scheduling state. Any error halts it: every later call returns
/// [`RoutingError::Halted`] and leaves the context untouched.
pub struct RoutingEngine {
    options: RoutingOptions,
    flow: Box<dyn FlowRouter>,
    quality: Box<dyn QualityRouter>,
    rules: Box<dyn ControlRules>,
    order: Vec<LinkId>,
    gate: EventGate,
    rule_timer: RuleTimer,
    route_quality: bool,
    old_time: Ticks,
    new_time: Ticks,
    /// Whether the flow solver has run at least once.
    solver_ran: bool,
    halted: bool,
}

impl std::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("solver", &self.flow.name())
            .field("quality", &self.quality.name())
            .field("clock", &self.new_time)
            .field("gate", &self.gate.state())
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}

impl RoutingEngine {
    pub fn builder(options: RoutingOptions) -> EngineBuilder {
        EngineBuilder {
            options,
            flow: Box::new(PassThroughRouter::new()),
            quality: Box::new(MixingQuality::new()),
            rules: Box::new(NoRules),
        }
    }

    pub fn options(&self) -> &RoutingOptions {
        &self.options
    }

    /// Routing clock at the end of the last executed step.
    pub fn clock(&self) -> Ticks {
        self.new_time
    }

    pub fn link_order(&self) -> &[LinkId] {
        &self.order
    }

    pub fn event_gate(&self) -> &EventGate {
        &self.gate
    }

    pub fn rule_timer(&self) -> &RuleTimer {
        &self.rule_timer
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn halt(&mut self, e: RoutingError) -> RoutingError {
        warn!(error = %e, "routing halted");
        self.halted = true;
        e
    }

    fn ensure_running(&self) -> RoutingResult<()> {
        if self.halted {
            Err(RoutingError::Halted)
        } else {
            Ok(())
        }
    }

    /// Length of the next step in seconds, at most `requested`.
    ///
    /// Between routing events the step stretches to the next forcing or
    /// report instant but never carries the clock past the next event's
    /// start. A pending rule evaluation inside the step shortens it.
    pub fn step_size(&mut self, ctx: &SimContext, requested: Real) -> RoutingResult<Real> {
        self.ensure_running()?;
        if ctx.network.links().is_empty() {
            return Ok(requested);
        }

        let step = self.size_step(ctx, requested);
        if !advances_clock(step) {
            return Err(self.halt(RoutingError::InvalidStep { step }));
        }
        Ok(step)
    }

    fn size_step(&self, ctx: &SimContext, requested: Real) -> Real {
        let now = self.new_time;
        let mut candidate = None;

        if self.gate.between_events() {
            let start = self.gate.pending_start();
            let next_forcing = ctx.new_runoff_time.min(ctx.report_time);
            if next_forcing > now && next_forcing < start {
                candidate = Some(now.secs_until(next_forcing));
            } else if now.advance(requested) < start {
                return requested;
            }
        }

        let mut step = match candidate {
            Some(step) => step,
            None => self.flow.step_size(&ctx.network, requested),
        };

        if self.gate.between_events() {
            let start = self.gate.pending_start();
            if start > now && now.advance(step) > start {
                step = now.secs_until(start);
            }
        }

        self.rule_timer.clip_step(now, step)
    }

    /// Route one step of `step` seconds.
    pub fn execute(
        &mut self,
        ctx: &mut SimContext,
        ledger: &mut dyn MassBalance,
        stats: &mut dyn FlowStatistics,
        step: Real,
    ) -> RoutingResult<StepReport> {
        self.ensure_running()?;
        if !advances_clock(step) {
            return Err(self.halt(RoutingError::InvalidStep { step }));
        }
        match self.run_step(ctx, ledger, stats, step) {
            Ok(report) => Ok(report),
            Err(e) => Err(self.halt(e)),
        }
    }

    fn run_step(
        &mut self,
        ctx: &mut SimContext,
        ledger: &mut dyn MassBalance,
        stats: &mut dyn FlowStatistics,
        step: Real,
    ) -> RoutingResult<StepReport> {
        let half = 0.5 * step;
        let start_date = ctx.clock.date_at(self.new_time);

        ledger.accumulate_half_step(half);

        ctx.network.resolve_target_settings();
        if self.rule_timer.due(self.new_time) {
            self.rules.evaluate(
                &mut ctx.network,
                start_date,
                ctx.clock.elapsed_days(self.new_time),
                step / SECONDS_PER_DAY,
            );
        }

        let mut actions = 0;
        for link in ctx.network.links_mut() {
            if link.target_setting != link.setting {
                if link.target_crosses_zero() {
                    link.time_last_set = Some(start_date);
                }
                link.apply_setting();
                actions += 1;
            }
        }

        self.old_time = self.new_time;
        self.new_time = self.new_time.advance(step);
        self.rule_timer.advance_if_reached(self.new_time);

        let step_flow_error = ledger.step_flow_error();
        ledger.begin_step_totals();

        let network = &mut ctx.network;
        if network.pollutant_count() > 0 {
            network.nodes_mut().iter_mut().for_each(|n| n.set_old_qual_state());
            network.links_mut().iter_mut().for_each(|l| l.set_old_qual_state());
        }
        network.seepage_factor = network.default_seepage_factor;
        network.nodes_mut().iter_mut().for_each(|n| n.roll_lateral_inflow());

        self.gate.update(self.old_time, self.new_time);
        let between_events = self.gate.between_events();

        let mut steady_state = true;
        let mut iterations = 0;
        if !between_events {
            let (evap_rate, seep_factor) = (network.evap_rate, network.seepage_factor);
            for node in network.nodes_mut() {
                node.compute_losses(evap_rate, seep_factor, step);
            }

            let mut at = InflowInstant::new(start_date, ctx.runoff_fraction(self.old_time));
            if !self.route_quality {
                at = at.without_quality();
            }
            aggregate_inflows(&mut ctx.network, &mut ctx.forcing, &at, ledger);
            let network = &mut ctx.network;

            steady_state = self.options.skip_steady_state
                && self.solver_ran
                && actions == 0
                && step_flow_error.abs() <= self.options.sys_flow_tol
                && !inflow_has_changed(network, self.options.lat_flow_tol);

            if !steady_state {
                network.links_mut().iter_mut().for_each(|l| l.set_old_hyd_state());
                for node in network.nodes_mut() {
                    node.set_old_hyd_state();
                    node.init_inflow(step);
                }
                iterations = self
                    .flow
                    .route(network, &self.order, step)
                    .map_err(|e| solver_error(self.flow.name(), e))?;
                self.solver_ran = true;
            }

            if self.route_quality {
                self.quality
                    .route(network, &self.order, step)
                    .map_err(|e| solver_error(self.quality.name(), e))?;
            }

            reconcile(network, step, self.route_quality, ledger);
        }

        ledger.accumulate_half_step(half);

        if self.options.flow_stats && !ctx.network.links().is_empty() {
            stats.record_flow_stats(step, ctx.clock.date_at(self.new_time), iterations, steady_state);
        }

        debug!(
            step,
            clock = self.new_time.0,
            steady_state,
            between_events,
            actions,
            iterations,
            "routing step"
        );

        Ok(StepReport {
            step,
            iterations,
            steady_state,
            between_events,
            actions,
            clock: self.new_time,
        })
    }

    /// Shut the flow solver down. Safe to call on a halted engine.
    pub fn close(&mut self, ctx: &mut SimContext) {
        self.flow.shutdown(&mut ctx.network);
        info!(clock = self.new_time.0, halted = self.halted, "routing engine closed");
    }
}
