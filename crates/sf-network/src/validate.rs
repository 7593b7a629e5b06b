//! Network validation logic.

use sf_core::SubcatchId;

use crate::error::{NetworkError, NetworkResult};
use crate::inflow::{DwfTarget, ExternalTarget};
use crate::link::Link;
use crate::node::{Node, NodeKind};
use crate::subcatch::Subcatchment;

/// Validate the network structure: all references exist, inflow records are consistent.
pub(crate) fn validate_structure(
    nodes: &[Node],
    links: &[Link],
    subcatchments: &[Subcatchment],
    n_pollut: usize,
) -> NetworkResult<()> {
    // Check that each link references valid, distinct end nodes
    for link in links {
        for node in [link.from, link.to] {
            if node.idx() >= nodes.len() {
                return Err(NetworkError::InvalidNodeRef {
                    link: link.id,
                    node,
                });
            }
        }
        if link.from == link.to {
            return Err(NetworkError::SelfLoop {
                link: link.id,
                node: link.from,
            });
        }
    }

    // Check subcatchment outlets and their groundwater / LID receiving nodes
    for sc in subcatchments {
        let targets = [
            sc.outlet,
            sc.groundwater.as_ref().map(|gw| gw.node),
            sc.lid.as_ref().map(|lid| lid.node),
        ];
        for node in targets.into_iter().flatten() {
            if node.idx() >= nodes.len() {
                return Err(NetworkError::InvalidOutletRef {
                    subcatch: sc.id,
                    node,
                });
            }
        }
    }

    for node in nodes {
        if let NodeKind::Outfall(outfall) = &node.kind {
            if let Some(sc) = outfall.route_to {
                check_subcatch(node, sc, subcatchments.len())?;
            }
        }
        validate_inflows(node, n_pollut)?;
    }

    Ok(())
}

fn check_subcatch(node: &Node, sc: SubcatchId, count: usize) -> NetworkResult<()> {
    if sc.idx() >= count {
        return Err(NetworkError::InvalidSubcatchRef {
            node: node.id,
            subcatch: sc,
        });
    }
    Ok(())
}

/// At most one flow record per node and list; pollutant records must be in range.
fn validate_inflows(node: &Node, n_pollut: usize) -> NetworkResult<()> {
    if node.ext_inflows.iter().filter(|i| i.is_flow()).count() > 1 {
        return Err(NetworkError::DuplicateFlowRecord {
            node: node.id,
            what: "external",
        });
    }
    if node.dwf_inflows.iter().filter(|i| i.is_flow()).count() > 1 {
        return Err(NetworkError::DuplicateFlowRecord {
            node: node.id,
            what: "dry-weather",
        });
    }

    for inflow in &node.ext_inflows {
        if let ExternalTarget::Pollutant { index, .. } = inflow.target {
            if index >= n_pollut {
                return Err(NetworkError::InvalidPollutant {
                    what: "External inflow",
                    index,
                    count: n_pollut,
                });
            }
        }
    }
    for inflow in &node.dwf_inflows {
        if let DwfTarget::Pollutant(index) = inflow.target {
            if index >= n_pollut {
                return Err(NetworkError::InvalidPollutant {
                    what: "Dry-weather inflow",
                    index,
                    count: n_pollut,
                });
            }
        }
    }
    Ok(())
}
