//! Network nodes and the per-node state transitions the router drives.

use sf_core::{NodeId, Real, SubcatchId};

use crate::inflow::{DryWeatherInflow, ExternalInflow};

/// Outfall extension record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outfall {
    /// Subcatchment that receives this outfall's discharge, if any.
    pub route_to: Option<SubcatchId>,
    /// Volume routed onto `route_to` since the last runoff step.
    pub v_routed: Real,
    /// Per-pollutant mass routed onto `route_to`.
    pub w_routed: Vec<Real>,
}

/// Storage unit extension record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Storage {
    /// Constant surface area.
    pub area: Real,
    /// Fraction of potential evaporation realized over the surface.
    pub evap_frac: Real,
    /// Seepage (exfiltration) rate per unit area before adjustment.
    pub seep_rate: Real,
    /// Evaporation loss volume over the current step.
    pub evap_loss: Real,
    /// Seepage loss volume over the current step.
    pub seep_loss: Real,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Junction,
    Outfall(Outfall),
    Storage(Storage),
    Divider,
}

impl NodeKind {
    pub fn is_outfall(&self) -> bool {
        matches!(self, NodeKind::Outfall(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, NodeKind::Storage(_))
    }
}

/// A node of the conveyance network.
///
/// `new_lat_flow` and `new_qual` are per-step accumulators: they are cleared
/// once at the start of a step and only read after inflow aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,

    pub full_volume: Real,
    /// Number of links connected to this node.
    pub degree: usize,

    pub old_depth: Real,
    pub new_depth: Real,
    pub old_volume: Real,
    pub new_volume: Real,

    pub old_lat_flow: Real,
    pub new_lat_flow: Real,
    pub inflow: Real,
    /// Total inflow the last solved step started from.
    pub old_flow_inflow: Real,
    pub outflow: Real,
    pub overflow: Real,
    pub old_net_inflow: Real,
    /// Evaporation + seepage loss rate for the current step.
    pub losses: Real,

    pub old_qual: Vec<Real>,
    pub new_qual: Vec<Real>,

    pub ext_inflows: Vec<ExternalInflow>,
    pub dwf_inflows: Vec<DryWeatherInflow>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            full_volume: Real::INFINITY,
            degree: 0,
            old_depth: 0.0,
            new_depth: 0.0,
            old_volume: 0.0,
            new_volume: 0.0,
            old_lat_flow: 0.0,
            new_lat_flow: 0.0,
            inflow: 0.0,
            old_flow_inflow: 0.0,
            outflow: 0.0,
            overflow: 0.0,
            old_net_inflow: 0.0,
            losses: 0.0,
            old_qual: Vec::new(),
            new_qual: Vec::new(),
            ext_inflows: Vec::new(),
            dwf_inflows: Vec::new(),
        }
    }

    pub fn is_outfall(&self) -> bool {
        self.kind.is_outfall()
    }

    /// The single flow-carrying external inflow record, if any.
    pub fn ext_flow_inflow(&self) -> Option<&ExternalInflow> {
        self.ext_inflows.iter().find(|i| i.is_flow())
    }

    /// The single flow-carrying dry-weather record, if any.
    pub fn dwf_flow_inflow(&self) -> Option<&DryWeatherInflow> {
        self.dwf_inflows.iter().find(|i| i.is_flow())
    }

    /// Roll this step's lateral inflow into the previous slot and clear it.
    pub fn roll_lateral_inflow(&mut self) {
        self.old_lat_flow = self.new_lat_flow;
        self.new_lat_flow = 0.0;
    }

    pub fn set_old_hyd_state(&mut self) {
        self.old_depth = self.new_depth;
        self.old_volume = self.new_volume;
        self.old_flow_inflow = self.inflow;
    }

    /// Keep the finished step's quality and clear the accumulator.
    pub fn set_old_qual_state(&mut self) {
        self.old_qual.clone_from(&self.new_qual);
        self.new_qual.iter_mut().for_each(|c| *c = 0.0);
    }

    /// Seed this step's inflow with the lateral inflow and its outflow with losses.
    pub fn init_inflow(&mut self, step: Real) {
        self.old_net_inflow = self.inflow - self.outflow;
        self.inflow = self.new_lat_flow;
        self.outflow = self.losses;
        self.overflow = if self.new_volume > self.full_volume && step > 0.0 {
            (self.new_volume - self.full_volume) / step
        } else {
            0.0
        };
    }

    /// Evaporation and seepage loss rate over `step`, recorded on the node.
    ///
    /// Only storage units lose water; the combined loss never drains more
    /// than the stored volume within the step.
    pub fn compute_losses(&mut self, evap_rate: Real, seep_factor: Real, step: Real) -> Real {
        let volume = self.new_volume;
        let NodeKind::Storage(storage) = &mut self.kind else {
            self.losses = 0.0;
            return 0.0;
        };
        let mut evap = (evap_rate * storage.area * storage.evap_frac).max(0.0);
        let mut seep = (storage.seep_rate * storage.area * seep_factor).max(0.0);
        let total = evap + seep;
        if step > 0.0 && total > 0.0 {
            let max_rate = volume.max(0.0) / step;
            if total > max_rate {
                let r = max_rate / total;
                evap *= r;
                seep *= r;
            }
        }
        storage.evap_loss = evap * step;
        storage.seep_loss = seep * step;
        self.losses = evap + seep;
        self.losses
    }

    /// Flow leaving the system at this node, and whether it is flooding.
    ///
    /// Outfalls discharge their total inflow, which is negative under
    /// reverse flow. Other nodes only lose water by overflowing.
    pub fn system_outflow(&self) -> (Real, bool) {
        if self.is_outfall() {
            return (self.inflow, false);
        }
        if self.overflow > 0.0 {
            (self.overflow, true)
        } else {
            (0.0, false)
        }
    }
}
