//! Subcatchment-side forcing the router draws wet-weather inflow from.
//!
//! Runoff generation lives elsewhere; it leaves the values at the last two
//! runoff instants here and the router interpolates between them.

use sf_core::{NodeId, Real, SubcatchId};

#[inline]
fn lerp(old: Real, new: Real, f: Real) -> Real {
    (1.0 - f) * old + f * new
}

/// Groundwater outflow per unit subcatchment area, delivered to `node`.
#[derive(Debug, Clone, PartialEq)]
pub struct Groundwater {
    pub node: NodeId,
    pub old_flow: Real,
    pub new_flow: Real,
}

impl Groundwater {
    pub fn weighted_flow(&self, f: Real, area: Real) -> Real {
        lerp(self.old_flow, self.new_flow, f) * area
    }
}

/// Underdrain outflow of the subcatchment's LID units, delivered to `node`.
#[derive(Debug, Clone, PartialEq)]
pub struct LidDrain {
    pub node: NodeId,
    pub old_drain: Real,
    pub new_drain: Real,
}

impl LidDrain {
    pub fn weighted_drain(&self, f: Real) -> Real {
        lerp(self.old_drain, self.new_drain, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subcatchment {
    pub id: SubcatchId,
    pub name: String,
    /// Node receiving surface runoff; `None` when runoff goes elsewhere.
    pub outlet: Option<NodeId>,
    pub area: Real,
    pub old_runoff: Real,
    pub new_runoff: Real,
    pub old_washoff: Vec<Real>,
    pub new_washoff: Vec<Real>,
    pub groundwater: Option<Groundwater>,
    pub lid: Option<LidDrain>,
}

impl Subcatchment {
    pub fn new(id: SubcatchId, name: impl Into<String>, outlet: Option<NodeId>, area: Real) -> Self {
        Self {
            id,
            name: name.into(),
            outlet,
            area,
            old_runoff: 0.0,
            new_runoff: 0.0,
            old_washoff: Vec::new(),
            new_washoff: Vec::new(),
            groundwater: None,
            lid: None,
        }
    }

    pub fn weighted_outflow(&self, f: Real) -> Real {
        lerp(self.old_runoff, self.new_runoff, f)
    }

    pub fn weighted_washoff(&self, pollutant: usize, f: Real) -> Real {
        let old = self.old_washoff.get(pollutant).copied().unwrap_or(0.0);
        let new = self.new_washoff.get(pollutant).copied().unwrap_or(0.0);
        lerp(old, new, f)
    }

    /// Shift the newest runoff values into the old slot and store fresh ones.
    pub fn push_runoff(&mut self, runoff: Real, washoff: &[Real]) {
        self.old_runoff = self.new_runoff;
        self.new_runoff = runoff;
        std::mem::swap(&mut self.old_washoff, &mut self.new_washoff);
        self.new_washoff.clear();
        self.new_washoff.extend_from_slice(washoff);
        self.old_washoff.resize(washoff.len(), 0.0);
    }
}
