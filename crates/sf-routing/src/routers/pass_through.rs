use sf_core::{LinkId, Real, ensure_finite};
use sf_network::{LinkKind, Network, NodeKind};

use crate::error::RoutingResult;
use crate::traits::FlowRouter;

/// Steady-flow routing: every node passes its inflow straight on.
///
/// Visiting links in upstream-first order, a node's inflow net of losses is
/// split evenly over its outgoing links and throttled by each link's
/// setting. Throttled flow, and inflow at a dead-end junction, overflows.
/// Outfalls discharge their whole inflow. Storage units pass inflow through
/// and lose their evaporation and seepage from stored volume.
#[derive(Debug, Default, Clone)]
pub struct PassThroughRouter {
    split: Vec<bool>,
}

impl PassThroughRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distribute one node's available inflow over its outgoing links.
    fn split_node(network: &mut Network, node_ix: usize, step: Real) {
        let node = &network.nodes()[node_ix];
        let id = node.id;
        let is_outfall = node.is_outfall();
        // storage losses come out of stored volume, not the throughflow
        let available = if node.kind.is_storage() {
            node.inflow.max(0.0)
        } else {
            (node.inflow - node.losses).max(0.0)
        };
        let out: Vec<LinkId> = network.out_links(id).to_vec();
        let seepage_factor = network.seepage_factor;

        let mut released = 0.0;
        let mut overflow = 0.0;
        if out.is_empty() {
            if !is_outfall {
                overflow = available;
            }
        } else {
            let share = available / out.len() as Real;
            for link_id in out {
                let Some(link) = network.link_mut(link_id) else {
                    continue;
                };
                let mut q = share * link.setting;
                overflow += share - q;
                if let LinkKind::Conduit(conduit) = &mut link.kind {
                    let barrels = Real::from(conduit.barrels.max(1));
                    let per_barrel = q / barrels;
                    let seep = (conduit.seep_rate * conduit.length * seepage_factor)
                        .max(0.0)
                        .min(per_barrel);
                    conduit.seep_loss_rate = seep;
                    conduit.evap_loss_rate = 0.0;
                    released += seep * barrels;
                    q -= seep * barrels;
                }
                link.new_flow = q;
                released += q;
                let to = link.to;
                if let Some(down) = network.node_mut(to) {
                    down.inflow += q;
                }
            }
        }

        let node = &mut network.nodes_mut()[node_ix];
        node.outflow += released;
        if overflow > 0.0 {
            node.overflow += overflow;
            node.outflow += overflow;
        }
        if let NodeKind::Storage(storage) = &node.kind {
            node.new_volume = (node.old_volume - node.losses * step).max(0.0);
            if storage.area > 0.0 {
                node.new_depth = node.new_volume / storage.area;
            }
        }
    }
}

impl FlowRouter for PassThroughRouter {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn initialize(&mut self, network: &mut Network) -> RoutingResult<()> {
        self.split = vec![false; network.nodes().len()];
        for link in network.links_mut() {
            link.new_flow = 0.0;
        }
        Ok(())
    }

    fn step_size(&self, _network: &Network, requested: Real) -> Real {
        requested
    }

    fn route(&mut self, network: &mut Network, order: &[LinkId], step: Real) -> RoutingResult<usize> {
        self.split.clear();
        self.split.resize(network.nodes().len(), false);

        for &link_id in order {
            let Some(from) = network.link(link_id).map(|l| l.from.idx()) else {
                continue;
            };
            if !self.split[from] {
                self.split[from] = true;
                Self::split_node(network, from, step);
            }
        }
        for ix in 0..self.split.len() {
            if !self.split[ix] {
                Self::split_node(network, ix, step);
            }
        }
        for node in network.nodes() {
            ensure_finite(node.outflow, "node outflow")?;
        }
        Ok(1)
    }
}
