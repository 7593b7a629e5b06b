//! Lateral inflow aggregation.
//!
//! Each inflow mechanism produces per-node contributions for an instant;
//! the aggregator applies every contribution to its node and books the
//! same quantities in the mass-balance ledger, so the two never diverge.

use chrono::NaiveDateTime;
use sf_core::{NodeId, Real, zero_if_below_tol};
use sf_network::{CalendarKey, DwfTarget, ExternalTarget, LoadBasis, Network};
use tracing::{trace, warn};

use crate::context::Forcing;
use crate::traits::{InflowCategory, InterfaceInflow, MassBalance};

/// The instant inflows are evaluated at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflowInstant {
    pub date: NaiveDateTime,
    pub calendar: CalendarKey,
    /// Position between the last two runoff instants, in [0, 1].
    pub runoff_fraction: Real,
    /// Whether pollutant loads are applied and booked.
    pub quality: bool,
}

impl InflowInstant {
    pub fn new(date: NaiveDateTime, runoff_fraction: Real) -> Self {
        Self {
            date,
            calendar: CalendarKey::from_date(date),
            runoff_fraction: runoff_fraction.clamp(0.0, 1.0),
            quality: true,
        }
    }

    /// Apply flows only; pollutant loads are dropped.
    pub fn without_quality(mut self) -> Self {
        self.quality = false;
        self
    }
}

/// Flow and per-pollutant mass rate entering one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub node: NodeId,
    pub flow: Real,
    /// Mass rate per pollutant; always sized to the pollutant count.
    pub loads: Vec<Real>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InflowMechanism {
    External,
    DryWeather,
    WetWeather,
    Groundwater,
    LidDrain,
    Rdii,
    Interface,
}

impl InflowMechanism {
    /// Application order within a step.
    pub const ALL: [InflowMechanism; 7] = [
        InflowMechanism::External,
        InflowMechanism::DryWeather,
        InflowMechanism::WetWeather,
        InflowMechanism::Groundwater,
        InflowMechanism::LidDrain,
        InflowMechanism::Rdii,
        InflowMechanism::Interface,
    ];

    pub fn category(self) -> InflowCategory {
        match self {
            InflowMechanism::External | InflowMechanism::Interface => InflowCategory::External,
            InflowMechanism::DryWeather => InflowCategory::DryWeather,
            InflowMechanism::WetWeather | InflowMechanism::LidDrain => InflowCategory::WetWeather,
            InflowMechanism::Groundwater => InflowCategory::Groundwater,
            InflowMechanism::Rdii => InflowCategory::Rdii,
        }
    }

    /// Append this mechanism's contributions at `at` to `out`.
    pub fn contribute(
        self,
        network: &Network,
        forcing: &mut Forcing,
        at: &InflowInstant,
        out: &mut Vec<Contribution>,
    ) {
        match self {
            InflowMechanism::External => external(network, at, out),
            InflowMechanism::DryWeather => dry_weather(network, at, out),
            InflowMechanism::WetWeather => wet_weather(network, at, out),
            InflowMechanism::Groundwater => groundwater(network, at, out),
            InflowMechanism::LidDrain => lid_drain(network, at, out),
            InflowMechanism::Rdii => rdii(network, forcing, at, out),
            InflowMechanism::Interface => interface(network, forcing, at, out),
        }
    }
}

fn external(network: &Network, at: &InflowInstant, out: &mut Vec<Contribution>) {
    let n_pollut = network.pollutant_count();
    for node in network.nodes() {
        // back-flow through an outfall re-enters as direct inflow
        let reverse = if node.is_outfall() && node.old_net_inflow < 0.0 {
            -node.old_net_inflow
        } else {
            0.0
        };
        if node.ext_inflows.is_empty() && reverse == 0.0 {
            continue;
        }

        let q = zero_if_below_tol(node.ext_flow_inflow().map_or(0.0, |i| i.value_at(at.date)));
        let q = q + reverse;

        let mut loads = vec![0.0; n_pollut];
        for inflow in &node.ext_inflows {
            if let ExternalTarget::Pollutant { index, basis } = inflow.target {
                let mut w = inflow.value_at(at.date);
                if basis == LoadBasis::Concentration {
                    w *= q;
                }
                loads[index] += w;
            }
        }
        out.push(Contribution {
            node: node.id,
            flow: q,
            loads,
        });
    }
}

fn dry_weather(network: &Network, at: &InflowInstant, out: &mut Vec<Contribution>) {
    let pollutants = network.pollutants();
    for node in network.nodes() {
        if node.dwf_inflows.is_empty() {
            continue;
        }
        let q = zero_if_below_tol(
            node.dwf_flow_inflow()
                .map_or(0.0, |i| i.value_at(at.calendar)),
        );

        let mut loads = vec![0.0; pollutants.len()];
        if q > 0.0 {
            for (load, pollut) in loads.iter_mut().zip(pollutants) {
                if pollut.dwf_concen > 0.0 {
                    *load += q * pollut.dwf_concen;
                }
            }
            // node-specific concentrations replace the default
            for inflow in &node.dwf_inflows {
                if let DwfTarget::Pollutant(p) = inflow.target {
                    loads[p] += q * inflow.value_at(at.calendar);
                    let default = pollutants[p].dwf_concen;
                    if default > 0.0 {
                        loads[p] -= q * default;
                    }
                }
            }
        }
        out.push(Contribution {
            node: node.id,
            flow: q,
            loads,
        });
    }
}

fn wet_weather(network: &Network, at: &InflowInstant, out: &mut Vec<Contribution>) {
    let f = at.runoff_fraction;
    let n_pollut = network.pollutant_count();
    for sc in network.subcatchments() {
        let Some(node) = sc.outlet else {
            continue;
        };
        out.push(Contribution {
            node,
            flow: zero_if_below_tol(sc.weighted_outflow(f)),
            loads: (0..n_pollut).map(|p| sc.weighted_washoff(p, f)).collect(),
        });
    }
}

fn groundwater(network: &Network, at: &InflowInstant, out: &mut Vec<Contribution>) {
    let f = at.runoff_fraction;
    let pollutants = network.pollutants();
    for sc in network.subcatchments() {
        let Some(gw) = &sc.groundwater else {
            continue;
        };
        let q = zero_if_below_tol(gw.weighted_flow(f, sc.area));
        out.push(Contribution {
            node: gw.node,
            flow: q,
            loads: pollutants
                .iter()
                .map(|p| if q > 0.0 { q * p.gw_concen } else { 0.0 })
                .collect(),
        });
    }
}

fn lid_drain(network: &Network, at: &InflowInstant, out: &mut Vec<Contribution>) {
    let n_pollut = network.pollutant_count();
    for sc in network.subcatchments() {
        let Some(lid) = &sc.lid else {
            continue;
        };
        let q = zero_if_below_tol(lid.weighted_drain(at.runoff_fraction));
        if q == 0.0 {
            continue;
        }
        out.push(Contribution {
            node: lid.node,
            flow: q,
            loads: vec![0.0; n_pollut],
        });
    }
}

fn rdii(network: &Network, forcing: &mut Forcing, at: &InflowInstant, out: &mut Vec<Contribution>) {
    let Some(source) = forcing.rdii.as_mut() else {
        return;
    };
    let mut flows = Vec::new();
    source.rdii_flows(at.date, &mut flows);

    let pollutants = network.pollutants();
    for (node, q) in flows {
        let q = zero_if_below_tol(q);
        if q == 0.0 {
            continue;
        }
        out.push(Contribution {
            node,
            flow: q,
            loads: pollutants
                .iter()
                .map(|p| {
                    if q > 0.0 && p.rdii_concen > 0.0 {
                        q * p.rdii_concen
                    } else {
                        0.0
                    }
                })
                .collect(),
        });
    }
}

fn interface(
    network: &Network,
    forcing: &mut Forcing,
    at: &InflowInstant,
    out: &mut Vec<Contribution>,
) {
    let Some(source) = forcing.interface.as_mut() else {
        return;
    };
    let mut inflows: Vec<InterfaceInflow> = Vec::new();
    source.interface_inflows(at.date, &mut inflows);

    let n_pollut = network.pollutant_count();
    for inflow in inflows {
        let q = zero_if_below_tol(inflow.flow);
        if q == 0.0 {
            continue;
        }
        out.push(Contribution {
            node: inflow.node,
            flow: q,
            loads: (0..n_pollut)
                .map(|p| {
                    let c = inflow.concen.get(p).copied().unwrap_or(0.0);
                    if q > 0.0 { q * c } else { 0.0 }
                })
                .collect(),
        });
    }
}

/// Evaluate every mechanism at `at`, add the results to node lateral
/// inflows and mass accumulators, and book them in the ledger.
///
/// Returns the total lateral flow applied.
pub fn aggregate_inflows(
    network: &mut Network,
    forcing: &mut Forcing,
    at: &InflowInstant,
    ledger: &mut dyn MassBalance,
) -> Real {
    let mut total = 0.0;
    let mut buf = Vec::new();
    for mechanism in InflowMechanism::ALL {
        buf.clear();
        mechanism.contribute(network, forcing, at, &mut buf);
        let category = mechanism.category();
        let mut applied = 0.0;
        for c in &buf {
            let Some(node) = network.node_mut(c.node) else {
                warn!(?mechanism, node = %c.node, "inflow for unknown node dropped");
                continue;
            };
            node.new_lat_flow += c.flow;
            ledger.add_inflow(category, c.flow);
            let loads: &[Real] = if at.quality { &c.loads } else { &[] };
            for (p, &w) in loads.iter().enumerate() {
                if w != 0.0 {
                    if let Some(q) = node.new_qual.get_mut(p) {
                        *q += w;
                        ledger.add_inflow_quality(category, p, w);
                    }
                }
            }
            applied += c.flow;
        }
        if !buf.is_empty() {
            trace!(?mechanism, nodes = buf.len(), flow = applied, "lateral inflow");
        }
        total += applied;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::{InterfaceTable, RdiiTable};
    use chrono::NaiveDate;
    use sf_core::PollutantIdx;
    use sf_network::{
        DryWeatherInflow, ExternalInflow, Groundwater, LidDrain, NetworkBuilder, NodeKind, Outfall,
        Pollutant, TimeSeries,
    };
    use std::collections::HashMap;

    #[derive(Default)]
    struct Ledger {
        flow: HashMap<InflowCategory, Real>,
        mass: HashMap<(InflowCategory, PollutantIdx), Real>,
    }

    impl MassBalance for Ledger {
        fn accumulate_half_step(&mut self, _: Real) {}
        fn begin_step_totals(&mut self) {}
        fn add_inflow(&mut self, category: InflowCategory, flow: Real) {
            *self.flow.entry(category).or_default() += flow;
        }
        fn add_inflow_quality(&mut self, category: InflowCategory, p: PollutantIdx, mass: Real) {
            *self.mass.entry((category, p)).or_default() += mass;
        }
        fn add_outflow(&mut self, _: Real, _: bool) {}
        fn add_outflow_quality(&mut self, _: PollutantIdx, _: Real, _: bool) {}
        fn add_node_losses(&mut self, _: Real, _: Real) {}
        fn add_link_losses(&mut self, _: Real, _: Real) {}
        fn step_flow_error(&self) -> Real {
            0.0
        }
    }

    fn date(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn default_dwf_concentration_applies_without_record() {
        let mut b = NetworkBuilder::new();
        let mut tss = Pollutant::new("TSS");
        tss.dwf_concen = 5.0;
        b.add_pollutant(tss);
        let j = b.add_junction("J1");
        b.add_dry_weather_inflow(j, DryWeatherInflow::flow(2.0));
        let mut net = b.build().unwrap();

        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(0), 1.0);
        let total = aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut ledger);

        assert_eq!(total, 2.0);
        assert_eq!(net.nodes()[0].new_lat_flow, 2.0);
        assert_eq!(net.nodes()[0].new_qual[0], 10.0);
        assert_eq!(ledger.mass[&(InflowCategory::DryWeather, 0)], 10.0);
    }

    #[test]
    fn node_dwf_concentration_replaces_default() {
        let mut b = NetworkBuilder::new();
        let mut tss = Pollutant::new("TSS");
        tss.dwf_concen = 5.0;
        let p = b.add_pollutant(tss);
        let j = b.add_junction("J1");
        b.add_dry_weather_inflow(j, DryWeatherInflow::flow(2.0));
        b.add_dry_weather_inflow(j, DryWeatherInflow::pollutant(p, 20.0));
        let mut net = b.build().unwrap();

        let at = InflowInstant::new(date(0), 1.0);
        aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut Ledger::default());
        assert_eq!(net.nodes()[0].new_qual[0], 40.0);
    }

    #[test]
    fn loads_dropped_without_quality() {
        let mut b = NetworkBuilder::new();
        let mut tss = Pollutant::new("TSS");
        tss.dwf_concen = 5.0;
        b.add_pollutant(tss);
        let j = b.add_junction("J1");
        b.add_dry_weather_inflow(j, DryWeatherInflow::flow(2.0));
        let mut net = b.build().unwrap();

        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(0), 1.0).without_quality();
        aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut ledger);

        assert_eq!(net.nodes()[0].new_lat_flow, 2.0);
        assert_eq!(net.nodes()[0].new_qual[0], 0.0);
        assert!(ledger.mass.is_empty());
    }

    #[test]
    fn tiny_external_flow_is_zeroed() {
        let mut b = NetworkBuilder::new();
        let j = b.add_junction("J1");
        b.add_external_inflow(j, ExternalInflow::constant_flow(1e-7));
        let mut net = b.build().unwrap();

        let at = InflowInstant::new(date(0), 1.0);
        let total = aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut Ledger::default());
        assert_eq!(total, 0.0);
    }

    #[test]
    fn reverse_outfall_flow_becomes_external_inflow() {
        let mut b = NetworkBuilder::new();
        let o = b.add_node("O1", NodeKind::Outfall(Outfall::default()));
        let mut net = b.build().unwrap();
        net.node_mut(o).unwrap().old_net_inflow = -3.0;

        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(0), 1.0);
        aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut ledger);

        assert_eq!(net.nodes()[0].new_lat_flow, 3.0);
        assert_eq!(ledger.flow[&InflowCategory::External], 3.0);
    }

    #[test]
    fn concentration_record_uses_reverse_corrected_flow() {
        let mut b = NetworkBuilder::new();
        let p = b.add_pollutant(Pollutant::new("TSS"));
        let o = b.add_node("O1", NodeKind::Outfall(Outfall::default()));
        b.add_external_inflow(o, ExternalInflow::constant_flow(1.0));
        b.add_external_inflow(
            o,
            ExternalInflow::constant_pollutant(p, LoadBasis::Concentration, 4.0),
        );
        let mut net = b.build().unwrap();
        net.node_mut(o).unwrap().old_net_inflow = -2.0;

        let at = InflowInstant::new(date(0), 1.0);
        aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut Ledger::default());
        assert_eq!(net.nodes()[0].new_lat_flow, 3.0);
        assert_eq!(net.nodes()[0].new_qual[0], 12.0);
    }

    #[test]
    fn wet_weather_and_groundwater_interpolate() {
        let mut b = NetworkBuilder::new();
        let mut tss = Pollutant::new("TSS");
        tss.gw_concen = 2.0;
        b.add_pollutant(tss);
        let j = b.add_junction("J1");
        let s = b.add_subcatchment("S1", Some(j), 10.0);
        let net_sc = b.subcatchment_mut(s).unwrap();
        net_sc.push_runoff(1.0, &[4.0]);
        net_sc.push_runoff(3.0, &[8.0]);
        net_sc.groundwater = Some(Groundwater {
            node: j,
            old_flow: 0.0,
            new_flow: 0.1,
        });
        let mut net = b.build().unwrap();

        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(0), 0.5);
        let total = aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut ledger);

        // runoff 2.0, groundwater 0.05 * 10
        assert!((total - 2.5).abs() < 1e-12);
        assert_eq!(ledger.flow[&InflowCategory::WetWeather], 2.0);
        assert!((ledger.flow[&InflowCategory::Groundwater] - 0.5).abs() < 1e-12);
        assert!((net.nodes()[0].new_qual[0] - (6.0 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn rdii_carries_default_concentration_only_when_positive() {
        let mut b = NetworkBuilder::new();
        let mut tss = Pollutant::new("TSS");
        tss.rdii_concen = 3.0;
        b.add_pollutant(tss);
        let j = b.add_junction("J1");
        let mut net = b.build().unwrap();

        let ts = TimeSeries::new("R", vec![(date(0), 2.0), (date(2), 2.0)]).unwrap();
        let mut table = RdiiTable::new();
        table.insert(j, ts);
        let mut forcing = Forcing {
            rdii: Some(Box::new(table)),
            interface: None,
        };
        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(1), 1.0);
        aggregate_inflows(&mut net, &mut forcing, &at, &mut ledger);

        assert_eq!(net.nodes()[0].new_lat_flow, 2.0);
        assert_eq!(ledger.mass[&(InflowCategory::Rdii, 0)], 6.0);
    }

    #[test]
    fn lid_drain_interpolates_as_wet_weather() {
        let mut b = NetworkBuilder::new();
        b.add_pollutant(Pollutant::new("TSS"));
        let j = b.add_junction("J1");
        let s = b.add_subcatchment("S1", None, 4.0);
        b.subcatchment_mut(s).unwrap().lid = Some(LidDrain {
            node: j,
            old_drain: 0.2,
            new_drain: 0.6,
        });
        let mut net = b.build().unwrap();

        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(0), 0.25);
        let total = aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut ledger);

        // drain rates are totals; area does not scale them
        assert!((total - 0.3).abs() < 1e-12);
        assert!((ledger.flow[&InflowCategory::WetWeather] - 0.3).abs() < 1e-12);
        assert_eq!(net.nodes()[0].new_qual[0], 0.0);
        assert!(ledger.mass.is_empty());
    }

    #[test]
    fn interface_mass_uses_file_concentration_for_inflow_only() {
        let mut b = NetworkBuilder::new();
        b.add_pollutant(Pollutant::new("TSS"));
        b.add_pollutant(Pollutant::new("BOD"));
        let j1 = b.add_junction("J1");
        let j2 = b.add_junction("J2");
        let mut net = b.build().unwrap();

        let series = |v: Real| TimeSeries::new("if", vec![(date(0), v), (date(2), v)]).unwrap();
        let mut table = InterfaceTable::new();
        // no BOD entry in the file for J1
        table.insert(j1, series(2.0), vec![series(3.0)]);
        table.insert(j2, series(-1.0), vec![series(4.0), series(4.0)]);
        let mut forcing = Forcing {
            rdii: None,
            interface: Some(Box::new(table)),
        };

        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(1), 1.0);
        let total = aggregate_inflows(&mut net, &mut forcing, &at, &mut ledger);

        assert_eq!(total, 1.0);
        assert_eq!(ledger.flow[&InflowCategory::External], 1.0);
        assert_eq!(net.nodes()[0].new_lat_flow, 2.0);
        assert_eq!(net.nodes()[0].new_qual, vec![6.0, 0.0]);
        // a withdrawal carries no mass in
        assert_eq!(net.nodes()[1].new_lat_flow, -1.0);
        assert_eq!(net.nodes()[1].new_qual, vec![0.0, 0.0]);
        assert_eq!(ledger.mass.len(), 1);
        assert_eq!(ledger.mass[&(InflowCategory::External, 0)], 6.0);
    }

    #[test]
    fn node_and_ledger_totals_agree() {
        let mut b = NetworkBuilder::new();
        b.add_pollutant(Pollutant::new("TSS"));
        let j1 = b.add_junction("J1");
        let j2 = b.add_junction("J2");
        b.add_external_inflow(j1, ExternalInflow::constant_flow(1.5));
        b.add_dry_weather_inflow(j2, DryWeatherInflow::flow(0.75));
        let s = b.add_subcatchment("S1", Some(j2), 1.0);
        b.subcatchment_mut(s).unwrap().push_runoff(0.25, &[1.0]);
        let mut net = b.build().unwrap();

        let mut ledger = Ledger::default();
        let at = InflowInstant::new(date(0), 1.0);
        let total = aggregate_inflows(&mut net, &mut Forcing::default(), &at, &mut ledger);

        let node_sum: Real = net.nodes().iter().map(|n| n.new_lat_flow).sum();
        let ledger_sum: Real = ledger.flow.values().sum();
        assert_eq!(node_sum, total);
        assert_eq!(ledger_sum, total);
        assert_eq!(total, 2.5);
    }
}
