//! Network-specific error types.

use sf_core::{LinkId, NodeId, SfError, SubcatchId};
use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Network construction and validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A link refers to a node that doesn't exist.
    #[error("Link {link} refers to non-existent node {node}")]
    InvalidNodeRef { link: LinkId, node: NodeId },

    /// A link connects a node to itself.
    #[error("Link {link} starts and ends at node {node}")]
    SelfLoop { link: LinkId, node: NodeId },

    /// A subcatchment (or its groundwater/LID record) refers to a missing node.
    #[error("Subcatchment {subcatch} refers to non-existent node {node}")]
    InvalidOutletRef { subcatch: SubcatchId, node: NodeId },

    /// An outfall routes onto a subcatchment that doesn't exist.
    #[error("Outfall {node} routes to non-existent subcatchment {subcatch}")]
    InvalidSubcatchRef { node: NodeId, subcatch: SubcatchId },

    /// A record references a pollutant index outside the pollutant table.
    #[error("{what} references pollutant {index} but only {count} are defined")]
    InvalidPollutant {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// More than one flow-carrying inflow record on a node.
    #[error("Node {node} has more than one {what} flow record")]
    DuplicateFlowRecord { node: NodeId, what: &'static str },

    /// A pattern has the wrong number of factors for its kind.
    #[error("{kind} pattern needs {expected} factors, got {got}")]
    PatternLength {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    /// Time series dates are not strictly increasing.
    #[error("Time series '{name}' is not in ascending date order")]
    UnsortedSeries { name: String },

    /// Working storage for a topology pass could not be reserved.
    #[error("Could not allocate {what} for {count} entries")]
    Allocation { what: &'static str, count: usize },
}

impl From<NetworkError> for SfError {
    fn from(err: NetworkError) -> Self {
        SfError::Invariant {
            what: err.to_string(),
        }
    }
}
