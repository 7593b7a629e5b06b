//! Network links and their control settings.

use chrono::NaiveDateTime;
use sf_core::{LinkId, NodeId, Real};

/// Conduit extension record.
#[derive(Debug, Clone, PartialEq)]
pub struct Conduit {
    pub length: Real,
    pub barrels: u32,
    /// Seepage rate per unit length of one barrel.
    pub seep_rate: Real,
    /// Evaporation loss rate of one barrel over the current step.
    pub evap_loss_rate: Real,
    /// Seepage loss rate of one barrel over the current step.
    pub seep_loss_rate: Real,
}

impl Default for Conduit {
    fn default() -> Self {
        Self {
            length: 0.0,
            barrels: 1,
            seep_rate: 0.0,
            evap_loss_rate: 0.0,
            seep_loss_rate: 0.0,
        }
    }
}

/// Pump with optional depth-triggered on/off control.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pump {
    /// Upstream depth at which an idle pump starts.
    pub startup_depth: Option<Real>,
    /// Upstream depth at which a running pump stops.
    pub shutoff_depth: Option<Real>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkKind {
    Conduit(Conduit),
    Pump(Pump),
    Orifice,
    Weir,
    Outlet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: LinkKind,

    /// Fraction open; 0 is fully closed.
    pub setting: Real,
    pub target_setting: Real,
    pub old_setting: Real,
    /// Last time the setting switched between closed and open.
    pub time_last_set: Option<NaiveDateTime>,

    pub old_flow: Real,
    pub new_flow: Real,

    pub old_qual: Vec<Real>,
    pub new_qual: Vec<Real>,
}

impl Link {
    pub fn new(
        id: LinkId,
        name: impl Into<String>,
        from: NodeId,
        to: NodeId,
        kind: LinkKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from,
            to,
            kind,
            setting: 1.0,
            target_setting: 1.0,
            old_setting: 1.0,
            time_last_set: None,
            old_flow: 0.0,
            new_flow: 0.0,
            old_qual: Vec::new(),
            new_qual: Vec::new(),
        }
    }

    pub fn conduit(&self) -> Option<&Conduit> {
        match &self.kind {
            LinkKind::Conduit(c) => Some(c),
            _ => None,
        }
    }

    /// Resolve the target setting that does not come from control rules.
    ///
    /// Pumps with start-up/shut-off depths switch on the depth at their
    /// upstream node; every other link keeps its current target.
    pub fn resolve_target_setting(&mut self, upstream_depth: Real) {
        let LinkKind::Pump(pump) = &self.kind else {
            return;
        };
        if self.setting == 0.0 {
            if let Some(on) = pump.startup_depth {
                if upstream_depth >= on {
                    self.target_setting = 1.0;
                }
            }
        } else if let Some(off) = pump.shutoff_depth {
            if upstream_depth <= off {
                self.target_setting = 0.0;
            }
        }
    }

    /// True when moving to the target setting would open a closed link or close an open one.
    pub fn target_crosses_zero(&self) -> bool {
        self.target_setting * self.setting == 0.0 && self.target_setting != self.setting
    }

    /// Make the target setting the actual one.
    pub fn apply_setting(&mut self) {
        self.setting = self.target_setting.clamp(0.0, 1.0);
        self.target_setting = self.setting;
    }

    pub fn set_old_hyd_state(&mut self) {
        self.old_flow = self.new_flow;
        self.old_setting = self.setting;
    }

    pub fn set_old_qual_state(&mut self) {
        self.old_qual.clone_from(&self.new_qual);
    }
}
