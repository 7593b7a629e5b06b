//! sf-network: the node/link subsystem of sewerflow.
//!
//! Provides:
//! - Network data model (nodes, links, subcatchments, pollutants)
//! - Node-owned inflow records (external and dry-weather) with their patterns and time series
//! - Incremental network builder with validation
//! - Link visitation order for flow routing
//! - The per-node/per-link state transitions a router drives each step
//!
//! # Example
//!
//! ```
//! use sf_network::{Conduit, LinkKind, NetworkBuilder, NodeKind, Outfall};
//!
//! let mut builder = NetworkBuilder::new();
//! let j1 = builder.add_junction("J1");
//! let o1 = builder.add_node("O1", NodeKind::Outfall(Outfall::default()));
//! builder.add_link("C1", j1, o1, LinkKind::Conduit(Conduit::default()));
//! let network = builder.build().unwrap();
//!
//! assert_eq!(network.nodes().len(), 2);
//! assert_eq!(network.links().len(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod inflow;
pub mod link;
pub mod network;
pub mod node;
pub mod pattern;
pub mod pollutant;
pub mod subcatch;
pub mod timeseries;
pub mod topology;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::NetworkBuilder;
pub use error::{NetworkError, NetworkResult};
pub use inflow::{DryWeatherInflow, DwfTarget, ExternalInflow, ExternalTarget, LoadBasis};
pub use link::{Conduit, Link, LinkKind, Pump};
pub use network::Network;
pub use node::{Node, NodeKind, Outfall, Storage};
pub use pattern::{CalendarKey, DwfPatterns, Pattern, PatternKind};
pub use pollutant::Pollutant;
pub use subcatch::{Groundwater, LidDrain, Subcatchment};
pub use timeseries::TimeSeries;
pub use topology::{LinkOrder, sort_links};
