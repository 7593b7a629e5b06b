//! Table-backed RDII and interface-file providers.

use chrono::NaiveDateTime;
use sf_core::{NodeId, Real};
use sf_network::TimeSeries;

use crate::traits::{InterfaceInflow, InterfaceSource, RdiiSource};

/// RDII flow per node from precomputed time series.
#[derive(Debug, Clone, Default)]
pub struct RdiiTable {
    entries: Vec<(NodeId, TimeSeries)>,
}

impl RdiiTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, series: TimeSeries) {
        self.entries.push((node, series));
    }
}

impl RdiiSource for RdiiTable {
    fn rdii_flows(&mut self, date: NaiveDateTime, out: &mut Vec<(NodeId, Real)>) {
        out.extend(
            self.entries
                .iter()
                .map(|(node, ts)| (*node, ts.value_at(date))),
        );
    }
}

#[derive(Debug, Clone)]
struct InterfaceEntry {
    node: NodeId,
    flow: TimeSeries,
    concen: Vec<TimeSeries>,
}

/// Interface-file inflows: a flow series and one concentration series per pollutant.
#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    entries: Vec<InterfaceEntry>,
}

impl InterfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, flow: TimeSeries, concen: Vec<TimeSeries>) {
        self.entries.push(InterfaceEntry { node, flow, concen });
    }
}

impl InterfaceSource for InterfaceTable {
    fn interface_inflows(&mut self, date: NaiveDateTime, out: &mut Vec<InterfaceInflow>) {
        out.extend(self.entries.iter().map(|e| InterfaceInflow {
            node: e.node,
            flow: e.flow.value_at(date),
            concen: e.concen.iter().map(|c| c.value_at(date)).collect(),
        }));
    }
}
