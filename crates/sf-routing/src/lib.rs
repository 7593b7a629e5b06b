//! sf-routing: conveyance routing core of sewerflow.
//!
//! The [`RoutingEngine`] advances a drainage network through time. Each step
//! it applies control settings, gathers lateral inflows from every inflow
//! mechanism, decides whether the hydraulic state must be re-solved, drives
//! the flow and quality routers, and reconciles losses and outflows with a
//! mass-balance ledger.
//!
//! Solvers, the ledger, control rules and statistics are collaborators
//! behind the traits in [`traits`]; reference implementations of the
//! routers live in [`routers`].

pub mod context;
pub mod error;
pub mod events;
pub mod forcing;
pub mod inflows;
pub mod losses;
pub mod options;
pub mod routers;
pub mod rules;
pub mod scheduler;
pub mod steady_state;
pub mod traits;

pub use context::{Forcing, SimContext};
pub use error::{RoutingError, RoutingResult};
pub use events::{EventGate, EventWindow, GateState, sort_events};
pub use forcing::{InterfaceTable, RdiiTable};
pub use inflows::{Contribution, InflowInstant, InflowMechanism, aggregate_inflows};
pub use options::{RoutingEvent, RoutingModel, RoutingOptions};
pub use routers::{MixingQuality, PassThroughRouter};
pub use rules::{RuleTimer, ScheduledSettings, SettingRule};
pub use scheduler::{EngineBuilder, RoutingEngine, StepReport};
pub use steady_state::inflow_has_changed;
pub use traits::{
    ControlRules, FlowRouter, FlowStatistics, InflowCategory, InterfaceInflow, InterfaceSource,
    MassBalance, NoQuality, NoRules, NoStats, QualityRouter, RdiiSource,
};
