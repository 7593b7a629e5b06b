//! Run loop: runoff clock, report clock and routing steps up to the end date.

use serde::Serialize;
use sf_balance::{ContinuityLedger, ContinuityReport, RoutingStats, StatsReport};
use sf_core::{Real, Ticks};
use sf_project::CompiledScenario;
use sf_routing::{RoutingEngine, SimContext};
use tracing::{debug, info};

use crate::error::CliResult;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub routing_steps: usize,
    pub continuity: ContinuityReport,
    pub stats: StatsReport,
}

/// Route `compiled` from its start to its end date.
///
/// `routing_step_s` overrides the scenario's routing step when given.
pub fn run(compiled: CompiledScenario, routing_step_s: Option<Real>) -> CliResult<RunSummary> {
    let CompiledScenario {
        name,
        start,
        end,
        timing,
        options,
        network,
        forcing,
        rules,
        runoff,
    } = compiled;
    let routing_step = routing_step_s.unwrap_or(timing.routing_step_s);

    let mut ctx = SimContext::new(network, start);
    ctx.forcing = forcing;
    let end = ctx.clock.ticks_at(end);

    let mut ledger = ContinuityLedger::new(ctx.network.pollutant_count())
        .with_initial_storage(ctx.network.stored_volume());
    let mut stats = RoutingStats::new();

    let mut engine = RoutingEngine::builder(options)
        .control_rules(rules)
        .open(&mut ctx)?;

    // runoff values at the start fill the "new" slot; the first runoff
    // update shifts them into "old"
    runoff.update(&mut ctx.network, start, 0.0);
    ctx.report_time = Ticks::ZERO.advance(timing.report_step_s);

    info!(scenario = %name, %start, routing_step, "routing started");

    let mut steps = 0;
    let result = loop {
        let now = engine.clock();
        if now.0.saturating_add(1) >= end.0 {
            break Ok(());
        }

        while ctx.new_runoff_time <= now {
            let t = ctx.new_runoff_time.advance(timing.runoff_step_s);
            ctx.advance_runoff_time(t);
            runoff.update(&mut ctx.network, ctx.clock.date_at(t), timing.runoff_step_s);
        }

        let step = match engine.step_size(&ctx, routing_step) {
            Ok(step) => step.min(now.secs_until(end)),
            Err(e) => break Err(e),
        };
        let report = match engine.execute(&mut ctx, &mut ledger, &mut stats, step) {
            Ok(report) => report,
            Err(e) => break Err(e),
        };
        steps += 1;
        debug!(
            step = report.step,
            steady = report.steady_state,
            between_events = report.between_events,
            "step done"
        );

        while report.clock.0.saturating_add(1) >= ctx.report_time.0 {
            let outflow: Real = ctx
                .network
                .nodes()
                .iter()
                .filter(|n| n.is_outfall())
                .map(|n| n.inflow)
                .sum();
            info!(
                date = %ctx.clock.date_at(ctx.report_time),
                outfall_flow = outflow,
                stored = ctx.network.stored_volume(),
                "report"
            );
            ctx.report_time = ctx.report_time.advance(timing.report_step_s);
        }
    };
    engine.close(&mut ctx);
    result?;

    let continuity = ledger.report(ctx.network.stored_volume());
    info!(
        steps,
        flow_error_pct = continuity.flow_error_pct,
        "routing finished"
    );
    Ok(RunSummary {
        scenario: name,
        routing_steps: steps,
        continuity,
        stats: stats.report(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn demo() -> CompiledScenario {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/01_storm_sewer.yaml");
        let scenario = sf_project::load_yaml(&path).unwrap();
        sf_project::compile(&scenario).unwrap()
    }

    #[test]
    fn demo_runs_to_end_date() {
        let summary = run(demo(), None).unwrap();
        assert_eq!(summary.stats.steps, summary.routing_steps);
        assert!(summary.routing_steps > 0);
        // 6 hours; steps never exceed 30 s
        assert!(summary.stats.max_step <= 30.0 + 1e-9);
        assert!((summary.stats.mean_step * summary.routing_steps as Real - 21_600.0).abs() < 1e-6);
        assert!(summary.continuity.flow.wet_weather > 0.0);
        assert!(summary.continuity.flow.dry_weather > 0.0);
        assert!(summary.continuity.flow.rdii > 0.0);
        // steady steps reuse the last flow field while inflows drift within tolerance
        assert!(summary.continuity.flow_error_pct.abs() < 5.0);
    }

    #[test]
    fn full_routing_balances_closely() {
        let mut compiled = demo();
        compiled.options.skip_steady_state = false;
        let summary = run(compiled, None).unwrap();
        assert_eq!(summary.stats.steady_steps, 0);
        assert!(summary.continuity.flow_error_pct.abs() < 0.1);
        assert!(summary.continuity.flow.flooding > 0.0);
        assert!(summary.continuity.final_storage < 200.0);
    }

    #[test]
    fn step_override_is_respected() {
        let summary = run(demo(), Some(60.0)).unwrap();
        assert!(summary.stats.max_step <= 60.0 + 1e-9);
    }
}
