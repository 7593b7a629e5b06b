//! End-of-step reconciliation of losses and system outflows with the ledger.

use sf_core::Real;
use sf_network::{LinkKind, Network, NodeKind};

use crate::traits::{InflowCategory, MassBalance};

/// Storage evaporation and seepage, reported as rates over `step`.
///
/// Returns `(evap_rate, seep_rate)`.
pub fn remove_storage_losses(network: &Network, step: Real, ledger: &mut dyn MassBalance) -> (Real, Real) {
    let (mut evap, mut seep) = (0.0, 0.0);
    for node in network.nodes() {
        if let NodeKind::Storage(storage) = &node.kind {
            evap += storage.evap_loss;
            seep += storage.seep_loss;
        }
    }
    if step > 0.0 {
        evap /= step;
        seep /= step;
    } else {
        evap = 0.0;
        seep = 0.0;
    }
    ledger.add_node_losses(evap, seep);
    (evap, seep)
}

/// Conduit evaporation and seepage rates, summed over all barrels.
pub fn remove_conduit_losses(network: &Network, ledger: &mut dyn MassBalance) -> (Real, Real) {
    let (mut evap, mut seep) = (0.0, 0.0);
    for link in network.links() {
        if let LinkKind::Conduit(conduit) = &link.kind {
            let barrels = conduit.barrels as Real;
            evap += conduit.evap_loss_rate * barrels;
            seep += conduit.seep_loss_rate * barrels;
        }
    }
    ledger.add_link_losses(evap, seep);
    (evap, seep)
}

/// Book every node's system outflow and route outfall discharge onward.
///
/// Without `quality`, node concentrations are stale and no mass is booked.
pub fn remove_outflows(
    network: &mut Network,
    step: Real,
    quality: bool,
    ledger: &mut dyn MassBalance,
) {
    for node in network.nodes_mut() {
        let inflow = node.inflow;
        let concen: &[Real] = if quality { &node.new_qual } else { &[] };
        if let NodeKind::Outfall(outfall) = &mut node.kind {
            if inflow > 0.0 && outfall.route_to.is_some() {
                outfall.v_routed += inflow * step;
                for (w, c) in outfall.w_routed.iter_mut().zip(concen) {
                    *w += inflow * c * step;
                }
            }
        }

        let (q, flooded) = node.system_outflow();
        if q != 0.0 {
            if q > 0.0 {
                ledger.add_outflow(q, flooded);
            } else {
                ledger.add_inflow(InflowCategory::External, -q);
            }
            for (p, c) in concen.iter().enumerate() {
                let w = q * c;
                if w >= 0.0 {
                    ledger.add_outflow_quality(p, w, flooded);
                } else {
                    ledger.add_inflow_quality(InflowCategory::External, p, -w);
                }
            }
        }

        // withdrawals: the flow was booked during aggregation, the mass was not
        if node.new_lat_flow < 0.0 {
            for (p, c) in concen.iter().enumerate() {
                ledger.add_outflow_quality(p, -node.new_lat_flow * c, false);
            }
        }
    }
}

/// Run all three reconciliation passes for a finished step.
pub fn reconcile(network: &mut Network, step: Real, quality: bool, ledger: &mut dyn MassBalance) {
    remove_storage_losses(network, step, ledger);
    remove_conduit_losses(network, ledger);
    remove_outflows(network, step, quality, ledger);
}
