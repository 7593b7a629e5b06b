//! Incremental network builder.

use sf_core::{LinkId, NodeId, PollutantIdx, Real, SubcatchId};

use crate::error::NetworkResult;
use crate::inflow::{DryWeatherInflow, ExternalInflow};
use crate::link::{Link, LinkKind};
use crate::network::Network;
use crate::node::{Node, NodeKind};
use crate::pollutant::Pollutant;
use crate::subcatch::Subcatchment;
use crate::validate;

/// Builder for constructing a network incrementally.
///
/// Use `add_node`, `add_link` and friends to build up the network,
/// then call `build()` to validate it and size per-pollutant state.
#[derive(Debug)]
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    subcatchments: Vec<Subcatchment>,
    pollutants: Vec<Pollutant>,
    seepage_factor: Real,
    evap_rate: Real,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            subcatchments: Vec::new(),
            pollutants: Vec::new(),
            seepage_factor: 1.0,
            evap_rate: 0.0,
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, name, kind));
        id
    }

    pub fn add_junction(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name, NodeKind::Junction)
    }

    pub fn add_link(
        &mut self,
        name: impl Into<String>,
        from: NodeId,
        to: NodeId,
        kind: LinkKind,
    ) -> LinkId {
        let id = LinkId::from_index(self.links.len() as u32);
        self.links.push(Link::new(id, name, from, to, kind));
        id
    }

    pub fn add_subcatchment(
        &mut self,
        name: impl Into<String>,
        outlet: Option<NodeId>,
        area: Real,
    ) -> SubcatchId {
        let id = SubcatchId::from_index(self.subcatchments.len() as u32);
        self.subcatchments
            .push(Subcatchment::new(id, name, outlet, area));
        id
    }

    pub fn add_pollutant(&mut self, pollutant: Pollutant) -> PollutantIdx {
        self.pollutants.push(pollutant);
        self.pollutants.len() - 1
    }

    /// Append an external inflow record; records keep insertion order.
    pub fn add_external_inflow(&mut self, node: NodeId, inflow: ExternalInflow) {
        if let Some(n) = self.nodes.get_mut(node.idx()) {
            n.ext_inflows.push(inflow);
        }
    }

    pub fn add_dry_weather_inflow(&mut self, node: NodeId, inflow: DryWeatherInflow) {
        if let Some(n) = self.nodes.get_mut(node.idx()) {
            n.dwf_inflows.push(inflow);
        }
    }

    /// Mutable access for post-construction adjustments (initial depth, full volume...).
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.idx())
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.idx())
    }

    pub fn subcatchment_mut(&mut self, id: SubcatchId) -> Option<&mut Subcatchment> {
        self.subcatchments.get_mut(id.idx())
    }

    pub fn seepage_factor(&mut self, factor: Real) -> &mut Self {
        self.seepage_factor = factor;
        self
    }

    pub fn evap_rate(&mut self, rate: Real) -> &mut Self {
        self.evap_rate = rate;
        self
    }

    /// Validate and freeze the network.
    pub fn build(mut self) -> NetworkResult<Network> {
        validate::validate_structure(
            &self.nodes,
            &self.links,
            &self.subcatchments,
            self.pollutants.len(),
        )?;

        let n_pollut = self.pollutants.len();
        for node in &mut self.nodes {
            node.degree = 0;
            node.old_volume = node.new_volume;
            node.old_depth = node.new_depth;
            node.old_qual = vec![0.0; n_pollut];
            node.new_qual = vec![0.0; n_pollut];
            if let NodeKind::Outfall(outfall) = &mut node.kind {
                outfall.w_routed = vec![0.0; n_pollut];
            }
        }
        for link in &mut self.links {
            link.old_qual = vec![0.0; n_pollut];
            link.new_qual = vec![0.0; n_pollut];
            link.old_setting = link.setting;
            link.target_setting = link.setting;
        }
        for link in &self.links {
            self.nodes[link.from.idx()].degree += 1;
            self.nodes[link.to.idx()].degree += 1;
        }

        let (out_link_offsets, out_links) = Self::build_adjacency(&self.nodes, &self.links);

        Ok(Network {
            nodes: self.nodes,
            links: self.links,
            subcatchments: self.subcatchments,
            pollutants: self.pollutants,
            out_link_offsets,
            out_links,
            default_seepage_factor: self.seepage_factor,
            seepage_factor: self.seepage_factor,
            evap_rate: self.evap_rate,
        })
    }

    /// Build compact adjacency lists: for each node, its outgoing links in ID order.
    fn build_adjacency(nodes: &[Node], links: &[Link]) -> (Vec<usize>, Vec<LinkId>) {
        let mut counts = vec![0usize; nodes.len()];
        for link in links {
            counts[link.from.idx()] += 1;
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        offsets.push(0);
        for c in &counts {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + c);
        }

        let mut flat = vec![LinkId::from_index(0); links.len()];
        let mut cursor = offsets.clone();
        // links are already in ID order
        for link in links {
            let slot = &mut cursor[link.from.idx()];
            flat[*slot] = link.id;
            *slot += 1;
        }
        (offsets, flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Conduit;
    use crate::node::Outfall;

    #[test]
    fn builder_basic() {
        let mut builder = NetworkBuilder::new();
        let n1 = builder.add_junction("J1");
        let n2 = builder.add_node("O1", NodeKind::Outfall(Outfall::default()));
        let c1 = builder.add_link("C1", n1, n2, LinkKind::Conduit(Conduit::default()));

        assert_eq!(n1.index(), 0);
        assert_eq!(n2.index(), 1);
        assert_eq!(c1.index(), 0);
        assert_eq!(builder.nodes.len(), 2);
        assert_eq!(builder.links.len(), 1);
    }

    #[test]
    fn build_computes_degree_and_adjacency() {
        let mut builder = NetworkBuilder::new();
        let a = builder.add_junction("A");
        let b = builder.add_junction("B");
        let c = builder.add_junction("C");
        let lone = builder.add_junction("Lone");
        let l1 = builder.add_link("L1", a, b, LinkKind::Conduit(Conduit::default()));
        let l2 = builder.add_link("L2", a, c, LinkKind::Conduit(Conduit::default()));
        let l3 = builder.add_link("L3", b, c, LinkKind::Conduit(Conduit::default()));
        builder.add_pollutant(Pollutant::new("TSS"));

        let net = builder.build().unwrap();
        assert_eq!(net.node(a).unwrap().degree, 2);
        assert_eq!(net.node(c).unwrap().degree, 2);
        assert_eq!(net.node(lone).unwrap().degree, 0);
        assert_eq!(net.out_links(a), &[l1, l2]);
        assert_eq!(net.out_links(b), &[l3]);
        assert!(net.out_links(c).is_empty());
        assert_eq!(net.node(b).unwrap().new_qual.len(), 1);
        assert_eq!(net.link(l3).unwrap().old_qual.len(), 1);
    }
}
