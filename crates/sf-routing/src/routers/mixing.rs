use sf_core::{FLOW_TOL, LinkId, Real};
use sf_network::Network;

use crate::error::RoutingResult;
use crate::traits::QualityRouter;

/// Complete-mix quality routing without storage memory.
///
/// A node's concentration is its lateral mass inflow plus the mass carried
/// in by upstream links, divided by its total inflow. Links carry their
/// upstream node's concentration.
#[derive(Debug, Default, Clone)]
pub struct MixingQuality {
    mixed: Vec<bool>,
}

impl MixingQuality {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the mass accumulated at a node into a concentration.
    fn mix_node(network: &mut Network, ix: usize) {
        let node = &mut network.nodes_mut()[ix];
        let q = node.inflow;
        for c in node.new_qual.iter_mut() {
            *c = if q > FLOW_TOL { (*c / q).max(0.0) } else { 0.0 };
        }
    }
}

impl QualityRouter for MixingQuality {
    fn name(&self) -> &'static str {
        "complete-mix"
    }

    fn initialize(&mut self, network: &mut Network) -> RoutingResult<()> {
        self.mixed = vec![false; network.nodes().len()];
        Ok(())
    }

    fn route(&mut self, network: &mut Network, order: &[LinkId], _step: Real) -> RoutingResult<()> {
        self.mixed.clear();
        self.mixed.resize(network.nodes().len(), false);

        let mut carried: Vec<Real> = Vec::with_capacity(network.pollutant_count());
        for &link_id in order {
            let Some((from, to, flow)) = network
                .link(link_id)
                .map(|l| (l.from.idx(), l.to.idx(), l.new_flow))
            else {
                continue;
            };
            if !self.mixed[from] {
                self.mixed[from] = true;
                Self::mix_node(network, from);
            }

            carried.clear();
            carried.extend_from_slice(&network.nodes()[from].new_qual);
            if let Some(link) = network.link_mut(link_id) {
                link.new_qual.clone_from(&carried);
            }
            // mass reaching a node that was already mixed (a loop) is dropped
            if !self.mixed[to] && flow > 0.0 {
                let down = &mut network.nodes_mut()[to];
                for (w, c) in down.new_qual.iter_mut().zip(&carried) {
                    *w += flow * c;
                }
            }
        }
        for ix in 0..self.mixed.len() {
            if !self.mixed[ix] {
                Self::mix_node(network, ix);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routers::PassThroughRouter;
    use crate::traits::FlowRouter;
    use sf_network::{LinkKind, NetworkBuilder, NodeKind, Outfall, Pollutant, sort_links};

    #[test]
    fn confluence_mixes_by_flow() {
        let mut b = NetworkBuilder::new();
        b.add_pollutant(Pollutant::new("TSS"));
        let a = b.add_junction("A");
        let c = b.add_junction("B");
        let o = b.add_node("O1", NodeKind::Outfall(Outfall::default()));
        b.add_link("W1", a, o, LinkKind::Weir);
        b.add_link("W2", c, o, LinkKind::Weir);
        let mut net = b.build().unwrap();

        // A: 1.0 at 10, B: 3.0 at 2
        let na = net.node_mut(a).unwrap();
        na.new_lat_flow = 1.0;
        na.new_qual[0] = 10.0;
        let nb = net.node_mut(c).unwrap();
        nb.new_lat_flow = 3.0;
        nb.new_qual[0] = 6.0;
        for node in net.nodes_mut() {
            node.init_inflow(1.0);
        }

        let order = sort_links(&net).unwrap();
        PassThroughRouter::new()
            .route(&mut net, &order.links, 1.0)
            .unwrap();
        let mut quality = MixingQuality::new();
        quality.initialize(&mut net).unwrap();
        quality.route(&mut net, &order.links, 1.0).unwrap();

        assert_eq!(net.node(a).unwrap().new_qual[0], 10.0);
        assert_eq!(net.links()[1].new_qual[0], 2.0);
        assert_eq!(net.node(o).unwrap().new_qual[0], 4.0);
    }

    #[test]
    fn dry_node_has_zero_concentration() {
        let mut b = NetworkBuilder::new();
        b.add_pollutant(Pollutant::new("TSS"));
        let j = b.add_junction("J1");
        let mut net = b.build().unwrap();
        net.node_mut(j).unwrap().new_qual[0] = 5.0;

        MixingQuality::new().route(&mut net, &[], 1.0).unwrap();
        assert_eq!(net.node(j).unwrap().new_qual[0], 0.0);
    }
}
