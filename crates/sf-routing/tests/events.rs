//! Routing-event gating as seen through the engine.

mod common;

use chrono::Duration;
use common::{Ledger, Stats, start};
use proptest::prelude::*;
use sf_core::Ticks;
use sf_network::{Conduit, ExternalInflow, LinkKind, NetworkBuilder, NodeKind, Outfall};
use sf_routing::{GateState, RoutingEngine, RoutingEvent, RoutingOptions, SimContext};

const MINUTE: i64 = 60_000;

fn context() -> SimContext {
    let mut b = NetworkBuilder::new();
    let j = b.add_junction("J1");
    let o = b.add_node("O1", NodeKind::Outfall(Outfall::default()));
    b.add_link("C1", j, o, LinkKind::Conduit(Conduit::default()));
    b.add_external_inflow(j, ExternalInflow::constant_flow(1.0));
    SimContext::new(b.build().unwrap(), start())
}

fn options(events: &[(i64, i64)]) -> RoutingOptions {
    RoutingOptions {
        events: events
            .iter()
            .map(|&(s, e)| RoutingEvent {
                start: start() + Duration::minutes(s),
                end: start() + Duration::minutes(e),
            })
            .collect(),
        ..RoutingOptions::default()
    }
}

#[test]
fn between_events_steps_follow_forcing_and_stop_at_start() {
    let mut ctx = context();
    ctx.new_runoff_time = Ticks(4 * MINUTE);
    ctx.report_time = Ticks(30 * MINUTE);
    let mut engine = RoutingEngine::builder(options(&[(10, 20)]))
        .open(&mut ctx)
        .unwrap();
    assert_eq!(engine.event_gate().state(), GateState::BetweenEvents);

    let mut ledger = Ledger::default();
    let mut stats = Stats::default();
    let mut steps = Vec::new();
    let mut reports = Vec::new();
    while engine.clock() < Ticks(10 * MINUTE) {
        let step = engine.step_size(&ctx, 600.0).unwrap();
        reports.push(engine.execute(&mut ctx, &mut ledger, &mut stats, step).unwrap());
        steps.push(step);
        if engine.clock() >= ctx.new_runoff_time {
            let next = ctx.new_runoff_time + Ticks(4 * MINUTE);
            ctx.advance_runoff_time(next);
        }
    }

    assert_eq!(steps, vec![240.0, 240.0, 120.0]);
    assert!(reports[0].between_events && reports[0].steady_state);
    assert!(reports[1].between_events);
    assert!(!reports[2].between_events);
    assert_eq!(engine.event_gate().state(), GateState::InEvent);
    assert_eq!(ctx.network.links()[0].new_flow, 1.0);
    assert_eq!(stats.steps[0], (240.0, 0, true));
}

#[test]
fn far_event_takes_requested_step() {
    let mut ctx = context();
    let mut engine = RoutingEngine::builder(options(&[(60, 120)]))
        .open(&mut ctx)
        .unwrap();
    assert_eq!(engine.step_size(&ctx, 300.0), Ok(300.0));
}

#[test]
fn gate_closes_after_last_event() {
    let mut ctx = context();
    let mut engine = RoutingEngine::builder(options(&[(0, 2)]))
        .open(&mut ctx)
        .unwrap();
    let mut ledger = Ledger::default();
    let mut stats = Stats::default();

    let r1 = engine.execute(&mut ctx, &mut ledger, &mut stats, 60.0).unwrap();
    assert!(!r1.between_events);
    let r2 = engine.execute(&mut ctx, &mut ledger, &mut stats, 60.0).unwrap();
    assert!(!r2.between_events);
    let r3 = engine.execute(&mut ctx, &mut ledger, &mut stats, 60.0).unwrap();
    assert!(r3.between_events);
    assert_eq!(engine.event_gate().pending_start(), Ticks::NEVER);

    // no event ahead: the requested step is returned as is
    assert_eq!(engine.step_size(&ctx, 900.0), Ok(900.0));
}

#[test]
fn back_to_back_events_route_continuously() {
    let mut ctx = context();
    let mut engine = RoutingEngine::builder(options(&[(0, 1), (1, 3)]))
        .open(&mut ctx)
        .unwrap();
    let mut ledger = Ledger::default();
    let mut stats = Stats::default();
    for _ in 0..3 {
        let r = engine.execute(&mut ctx, &mut ledger, &mut stats, 60.0).unwrap();
        assert!(!r.between_events);
    }
    assert_eq!(engine.event_gate().next_index(), 1);
}

proptest! {
    #[test]
    fn steps_never_cross_pending_event_start(
        event_start in 1i64..240,
        requested in 1.0f64..3_600.0,
        runoff_every in 1i64..30,
    ) {
        let mut ctx = context();
        ctx.new_runoff_time = Ticks(runoff_every * MINUTE);
        let mut engine = RoutingEngine::builder(options(&[(event_start, event_start + 30)]))
            .open(&mut ctx)
            .unwrap();
        let mut ledger = Ledger::default();
        let mut stats = Stats::default();
        let event = Ticks(event_start * MINUTE);

        for _ in 0..500 {
            if engine.clock() >= event {
                break;
            }
            let before = engine.clock();
            let step = engine.step_size(&ctx, requested).unwrap();
            prop_assert!(step > 0.0);
            prop_assert!(before.advance(step) <= event);
            engine.execute(&mut ctx, &mut ledger, &mut stats, step).unwrap();
            if engine.clock() >= ctx.new_runoff_time {
                let next = ctx.new_runoff_time + Ticks(runoff_every * MINUTE);
                ctx.advance_runoff_time(next);
            }
        }
        prop_assert!(engine.clock() >= event);
    }
}
