//! sf-balance: continuity accounting and routing statistics.
//!
//! [`ContinuityLedger`] is the mass-balance ledger the routing engine books
//! every inflow, outflow and loss with; [`RoutingStats`] collects per-step
//! flow-routing statistics.

pub mod ledger;
pub mod stats;

pub use ledger::{ContinuityLedger, ContinuityReport, FlowTotals, QualityTotals};
pub use stats::{RoutingStats, StatsReport, StepHistogram};
