//! Error types for routing operations.

use thiserror::Error;

/// Errors encountered while opening or stepping the routing engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Topology error: {message}")]
    Topology { message: String },

    #[error("{solver} failed to initialize: {message}")]
    SolverInit {
        solver: &'static str,
        message: String,
    },

    #[error("Invalid routing step {step} s")]
    InvalidStep { step: f64 },

    #[error("{solver} failed: {message}")]
    Solver {
        solver: &'static str,
        message: String,
    },

    #[error("Routing halted by an earlier fatal error")]
    Halted,

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type RoutingResult<T> = Result<T, RoutingError>;

impl From<sf_network::NetworkError> for RoutingError {
    fn from(e: sf_network::NetworkError) -> Self {
        RoutingError::Topology {
            message: e.to_string(),
        }
    }
}

impl From<sf_core::SfError> for RoutingError {
    fn from(e: sf_core::SfError) -> Self {
        RoutingError::Backend {
            message: e.to_string(),
        }
    }
}
