//! Detects whether boundary and lateral inflows changed enough to re-solve.

use sf_core::{Real, relative_change};
use sf_network::Network;

/// True as soon as any node's lateral inflow, or the total inflow of an
/// outfall or isolated node, changed by more than `tol` (relative).
///
/// Runs after this step's lateral inflows are aggregated and before node
/// inflows are re-initialized, so `inflow` still holds last step's total.
pub fn inflow_has_changed(network: &Network, tol: Real) -> bool {
    network.nodes().iter().any(|node| {
        if relative_change(node.old_lat_flow, node.new_lat_flow).abs() > tol {
            return true;
        }
        let boundary = if node.degree == 0 {
            // nothing but lateral inflow can reach it
            relative_change(node.inflow, node.new_lat_flow)
        } else if node.is_outfall() {
            // flow still arriving through links shows up across the last solve
            relative_change(node.old_flow_inflow, node.inflow)
        } else {
            0.0
        };
        boundary.abs() > tol
    })
}
