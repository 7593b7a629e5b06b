//! Link visitation order for flow routing.
//!
//! Links are visited so that every link's upstream node has received all of
//! its inflow first. Networks with loops have no such order; they get their
//! links in ID order and the solver must iterate.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use sf_core::LinkId;

use crate::error::{NetworkError, NetworkResult};
use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOrder {
    pub links: Vec<LinkId>,
    /// False when the network contains a loop and `links` is in ID order.
    pub acyclic: bool,
}

pub fn sort_links(network: &Network) -> NetworkResult<LinkOrder> {
    let n_links = network.links().len();
    let mut links: Vec<LinkId> = Vec::new();
    links
        .try_reserve_exact(n_links)
        .map_err(|_| NetworkError::Allocation {
            what: "sorted link list",
            count: n_links,
        })?;

    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(network.nodes().len(), n_links);
    let indices: Vec<NodeIndex> = network.nodes().iter().map(|_| graph.add_node(())).collect();
    for link in network.links() {
        graph.add_edge(indices[link.from.idx()], indices[link.to.idx()], ());
    }

    match toposort(&graph, None) {
        Ok(order) => {
            for ix in order {
                let node = network.nodes()[ix.index()].id;
                links.extend_from_slice(network.out_links(node));
            }
            Ok(LinkOrder {
                links,
                acyclic: true,
            })
        }
        Err(_) => {
            links.extend(network.links().iter().map(|l| l.id));
            Ok(LinkOrder {
                links,
                acyclic: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::link::LinkKind;

    #[test]
    fn upstream_links_come_first() {
        let mut b = NetworkBuilder::new();
        let out = b.add_junction("Out");
        let mid = b.add_junction("Mid");
        let top = b.add_junction("Top");
        // declared downstream-first on purpose
        let l_down = b.add_link("Down", mid, out, LinkKind::Weir);
        let l_up = b.add_link("Up", top, mid, LinkKind::Weir);
        let net = b.build().unwrap();

        let order = sort_links(&net).unwrap();
        assert!(order.acyclic);
        assert_eq!(order.links, vec![l_up, l_down]);
    }

    #[test]
    fn loops_fall_back_to_id_order() {
        let mut b = NetworkBuilder::new();
        let a = b.add_junction("A");
        let c = b.add_junction("C");
        let l1 = b.add_link("L1", a, c, LinkKind::Weir);
        let l2 = b.add_link("L2", c, a, LinkKind::Weir);
        let net = b.build().unwrap();

        let order = sort_links(&net).unwrap();
        assert!(!order.acyclic);
        assert_eq!(order.links, vec![l1, l2]);
    }
}
