//! Series-driven runoff forcing.
//!
//! Stands in for a runoff model: at every runoff instant each subcatchment's
//! runoff, washoff, groundwater and LID drain values are sampled from time
//! series and shifted into the subcatchment's old/new slots. Flow routed onto
//! a subcatchment by an outfall since the previous instant is added to that
//! subcatchment's runoff, then cleared.

use chrono::NaiveDateTime;
use sf_core::{Real, SubcatchId};
use sf_network::{Network, NodeKind, TimeSeries};
use tracing::trace;

/// Series that drive one subcatchment.
#[derive(Debug, Clone, Default)]
pub struct SubcatchForcing {
    pub runoff: Option<TimeSeries>,
    /// Washoff mass-rate series by pollutant index.
    pub washoff: Vec<Option<TimeSeries>>,
    /// Groundwater outflow per unit area.
    pub groundwater: Option<TimeSeries>,
    pub lid_drain: Option<TimeSeries>,
}

#[derive(Debug, Clone, Default)]
pub struct RunoffForcing {
    subcatchments: Vec<(SubcatchId, SubcatchForcing)>,
}

fn sample(series: Option<&TimeSeries>, date: NaiveDateTime) -> Real {
    series.map_or(0.0, |ts| ts.value_at(date))
}

impl RunoffForcing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subcatch: SubcatchId, forcing: SubcatchForcing) {
        self.subcatchments.push((subcatch, forcing));
    }

    pub fn len(&self) -> usize {
        self.subcatchments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subcatchments.is_empty()
    }

    /// Sample every series at `date` and push the values into the network.
    ///
    /// `interval_s` is the time since the previous runoff instant; outfall
    /// volumes routed over it become a run-on rate.
    pub fn update(&self, network: &mut Network, date: NaiveDateTime, interval_s: Real) {
        let n_pollut = network.pollutant_count();
        let mut runon = vec![0.0; network.subcatchments().len()];
        let mut runon_mass = vec![vec![0.0; n_pollut]; network.subcatchments().len()];
        for node in network.nodes_mut() {
            if let NodeKind::Outfall(outfall) = &mut node.kind {
                if let Some(sc) = outfall.route_to {
                    if interval_s > 0.0 {
                        runon[sc.idx()] += outfall.v_routed / interval_s;
                        for (m, w) in runon_mass[sc.idx()].iter_mut().zip(&outfall.w_routed) {
                            *m += w / interval_s;
                        }
                    }
                }
                outfall.v_routed = 0.0;
                outfall.w_routed.iter_mut().for_each(|w| *w = 0.0);
            }
        }

        for (id, forcing) in &self.subcatchments {
            let Some(sc) = network.subcatchments_mut().get_mut(id.idx()) else {
                continue;
            };
            let runoff = sample(forcing.runoff.as_ref(), date) + runon[id.idx()];
            let washoff: Vec<Real> = (0..n_pollut)
                .map(|p| {
                    let series = forcing.washoff.get(p).and_then(Option::as_ref);
                    sample(series, date) + runon_mass[id.idx()][p]
                })
                .collect();
            trace!(subcatch = %sc.name, runoff, %date, "runoff update");
            sc.push_runoff(runoff, &washoff);

            if let Some(gw) = &mut sc.groundwater {
                gw.old_flow = gw.new_flow;
                gw.new_flow = sample(forcing.groundwater.as_ref(), date);
            }
            if let Some(lid) = &mut sc.lid {
                lid.old_drain = lid.new_drain;
                lid.new_drain = sample(forcing.lid_drain.as_ref(), date);
            }
        }

        // subcatchments without series still receive run-on
        for (idx, flow) in runon.iter().enumerate() {
            if *flow == 0.0 || self.subcatchments.iter().any(|(id, _)| id.idx() == idx) {
                continue;
            }
            if let Some(sc) = network.subcatchments_mut().get_mut(idx) {
                sc.push_runoff(*flow, &runon_mass[idx]);
            }
        }
    }
}
