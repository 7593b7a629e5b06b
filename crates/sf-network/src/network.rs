//! The drainage network: owned node/link/subcatchment tables.

use sf_core::{LinkId, NodeId, Real, SubcatchId};

use crate::link::Link;
use crate::node::Node;
use crate::pollutant::Pollutant;
use crate::subcatch::Subcatchment;

/// The network owns every object for the whole simulation; routing
/// components only borrow it for the duration of a step.
///
/// All tables are indexed by their IDs.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) subcatchments: Vec<Subcatchment>,
    pub(crate) pollutants: Vec<Pollutant>,

    /// Offsets for node->outgoing link adjacency: node i's links are in
    /// out_links[out_link_offsets[i]..out_link_offsets[i+1]].
    pub(crate) out_link_offsets: Vec<usize>,
    pub(crate) out_links: Vec<LinkId>,

    /// Network-wide seepage adjustment restored at the start of every step.
    pub default_seepage_factor: Real,
    /// Seepage adjustment in effect for the current step.
    pub seepage_factor: Real,
    /// Current potential evaporation rate (length per time).
    pub evap_rate: Real,
}

impl Network {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    pub fn subcatchments(&self) -> &[Subcatchment] {
        &self.subcatchments
    }

    pub fn subcatchments_mut(&mut self) -> &mut [Subcatchment] {
        &mut self.subcatchments
    }

    pub fn pollutants(&self) -> &[Pollutant] {
        &self.pollutants
    }

    pub fn pollutant_count(&self) -> usize {
        self.pollutants.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.idx())
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.idx())
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.idx())
    }

    pub fn subcatchment(&self, id: SubcatchId) -> Option<&Subcatchment> {
        self.subcatchments.get(id.idx())
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn link_by_name(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Links leaving a node, in ID order.
    pub fn out_links(&self, node: NodeId) -> &[LinkId] {
        let idx = node.idx();
        if idx >= self.nodes.len() {
            return &[];
        }
        &self.out_links[self.out_link_offsets[idx]..self.out_link_offsets[idx + 1]]
    }

    /// Resolve every link's non-rule target setting from its upstream node depth.
    pub fn resolve_target_settings(&mut self) {
        let Self { nodes, links, .. } = self;
        for link in links.iter_mut() {
            let depth = nodes.get(link.from.idx()).map_or(0.0, |n| n.new_depth);
            link.resolve_target_setting(depth);
        }
    }

    /// Volume currently held in nodes.
    pub fn stored_volume(&self) -> Real {
        self.nodes.iter().map(|n| n.new_volume).sum()
    }
}
