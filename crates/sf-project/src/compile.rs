//! Scenario compilation: ids resolved, records attached, forcing tables built.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use sf_core::{LinkId, NodeId, PollutantIdx, SubcatchId};
use sf_network::{
    Conduit, DryWeatherInflow, DwfPatterns, ExternalInflow, ExternalTarget, Groundwater, LidDrain,
    LinkKind, LoadBasis, Network, NetworkBuilder, NodeKind, Outfall, Pattern, PatternKind,
    Pollutant, Pump, Storage, TimeSeries,
};
use sf_routing::{Forcing, InterfaceTable, RdiiTable, RoutingOptions, ScheduledSettings, SettingRule};
use tracing::debug;

use crate::runoff::{RunoffForcing, SubcatchForcing};
use crate::schema::{InflowTargetDef, LinkKindDef, NodeKindDef, Scenario, TimingDef};
use crate::validate::{ValidationError, validate_scenario};
use crate::ProjectResult;

/// Runtime pieces of a scenario.
#[derive(Debug)]
pub struct CompiledScenario {
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timing: TimingDef,
    pub options: RoutingOptions,
    pub network: Network,
    pub forcing: Forcing,
    pub rules: ScheduledSettings,
    pub runoff: RunoffForcing,
}

struct Lookup<'a> {
    scenario: &'a Scenario,
    nodes: HashMap<&'a str, NodeId>,
    links: HashMap<&'a str, LinkId>,
    subcatchments: HashMap<&'a str, SubcatchId>,
    pollutants: HashMap<&'a str, PollutantIdx>,
}

fn missing(id: &str, context: &str) -> ValidationError {
    ValidationError::MissingReference {
        id: id.to_string(),
        context: context.to_string(),
    }
}

fn positions<'a, T>(ids: impl Iterator<Item = &'a str>, make: fn(u32) -> T) -> HashMap<&'a str, T> {
    ids.enumerate().map(|(i, id)| (id, make(i as u32))).collect()
}

impl<'a> Lookup<'a> {
    fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            nodes: positions(scenario.nodes.iter().map(|n| n.id.as_str()), NodeId::from_index),
            links: positions(scenario.links.iter().map(|l| l.id.as_str()), LinkId::from_index),
            subcatchments: positions(
                scenario.subcatchments.iter().map(|s| s.id.as_str()),
                SubcatchId::from_index,
            ),
            pollutants: positions(scenario.pollutants.iter().map(|p| p.id.as_str()), |i| {
                i as PollutantIdx
            }),
        }
    }

    fn node(&self, id: &str, context: &str) -> Result<NodeId, ValidationError> {
        self.nodes.get(id).copied().ok_or_else(|| missing(id, context))
    }

    fn link(&self, id: &str, context: &str) -> Result<LinkId, ValidationError> {
        self.links.get(id).copied().ok_or_else(|| missing(id, context))
    }

    fn subcatchment(&self, id: &str, context: &str) -> Result<SubcatchId, ValidationError> {
        self.subcatchments
            .get(id)
            .copied()
            .ok_or_else(|| missing(id, context))
    }

    fn pollutant(&self, id: &str, context: &str) -> Result<PollutantIdx, ValidationError> {
        self.pollutants
            .get(id)
            .copied()
            .ok_or_else(|| missing(id, context))
    }

    fn series(&self, id: &str, context: &str) -> ProjectResult<TimeSeries> {
        let def = self
            .scenario
            .timeseries
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| missing(id, context))?;
        Ok(TimeSeries::new(def.id.clone(), def.points.clone())?)
    }

    fn pattern(&self, id: &str, context: &str) -> ProjectResult<Pattern> {
        let def = self
            .scenario
            .patterns
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| missing(id, context))?;
        Ok(Pattern::new(def.kind, def.factors.clone())?)
    }

    fn dwf_patterns(&self, ids: &[String]) -> ProjectResult<DwfPatterns> {
        let mut patterns = DwfPatterns::default();
        for id in ids {
            let pattern = self.pattern(id, "dry_weather patterns")?;
            let slot = match pattern.kind() {
                PatternKind::Monthly => &mut patterns.monthly,
                PatternKind::Daily => &mut patterns.daily,
                PatternKind::Hourly => &mut patterns.hourly,
                PatternKind::Weekend => &mut patterns.weekend,
            };
            *slot = Some(pattern);
        }
        Ok(patterns)
    }
}

fn node_kind(kind: &NodeKindDef, lookup: &Lookup<'_>) -> Result<NodeKind, ValidationError> {
    Ok(match kind {
        NodeKindDef::Junction => NodeKind::Junction,
        NodeKindDef::Divider => NodeKind::Divider,
        NodeKindDef::Outfall { route_to } => NodeKind::Outfall(Outfall {
            route_to: route_to
                .as_deref()
                .map(|sc| lookup.subcatchment(sc, "outfall route_to"))
                .transpose()?,
            ..Default::default()
        }),
        NodeKindDef::Storage {
            area,
            evap_frac,
            seep_rate,
        } => NodeKind::Storage(Storage {
            area: *area,
            evap_frac: *evap_frac,
            seep_rate: *seep_rate,
            ..Default::default()
        }),
    })
}

fn link_kind(kind: &LinkKindDef) -> LinkKind {
    match kind {
        LinkKindDef::Conduit {
            length,
            barrels,
            seep_rate,
        } => LinkKind::Conduit(Conduit {
            length: *length,
            barrels: *barrels,
            seep_rate: *seep_rate,
            ..Default::default()
        }),
        LinkKindDef::Pump {
            startup_depth,
            shutoff_depth,
        } => LinkKind::Pump(Pump {
            startup_depth: *startup_depth,
            shutoff_depth: *shutoff_depth,
        }),
        LinkKindDef::Orifice => LinkKind::Orifice,
        LinkKindDef::Weir => LinkKind::Weir,
        LinkKindDef::Outlet => LinkKind::Outlet,
    }
}

/// Validate `scenario` and build everything a run needs.
pub fn compile(scenario: &Scenario) -> ProjectResult<CompiledScenario> {
    validate_scenario(scenario)?;
    let lookup = Lookup::new(scenario);
    let mut builder = NetworkBuilder::new();
    builder
        .evap_rate(scenario.climate.evap_rate)
        .seepage_factor(scenario.climate.seepage_factor);

    for def in &scenario.pollutants {
        let mut pollutant = Pollutant::new(def.id.clone());
        pollutant.dwf_concen = def.dwf_concen;
        pollutant.gw_concen = def.gw_concen;
        pollutant.rdii_concen = def.rdii_concen;
        builder.add_pollutant(pollutant);
    }

    for def in &scenario.nodes {
        let kind = node_kind(&def.kind, &lookup)?;
        let id = builder.add_node(def.id.clone(), kind);
        if let Some(node) = builder.node_mut(id) {
            if let Some(full) = def.full_volume {
                node.full_volume = full;
            }
            node.new_volume = def.initial_volume;
            if let NodeKind::Storage(st) = &node.kind {
                if st.area > 0.0 {
                    node.new_depth = def.initial_volume / st.area;
                }
            }
        }
    }

    for def in &scenario.links {
        let from = lookup.node(&def.from, "link from")?;
        let to = lookup.node(&def.to, "link to")?;
        let id = builder.add_link(def.id.clone(), from, to, link_kind(&def.kind));
        if let Some(link) = builder.link_mut(id) {
            link.setting = def.setting;
        }
    }

    let mut runoff = RunoffForcing::new();
    for def in &scenario.subcatchments {
        let outlet = def
            .outlet
            .as_deref()
            .map(|n| lookup.node(n, "subcatchment outlet"))
            .transpose()?;
        let id = builder.add_subcatchment(def.id.clone(), outlet, def.area);

        let mut forcing = SubcatchForcing {
            washoff: vec![None; scenario.pollutants.len()],
            ..Default::default()
        };
        if let Some(ts) = &def.runoff {
            forcing.runoff = Some(lookup.series(ts, "subcatchment runoff")?);
        }
        for w in &def.washoff {
            let p = lookup.pollutant(&w.pollutant, "subcatchment washoff")?;
            forcing.washoff[p] = Some(lookup.series(&w.timeseries, "subcatchment washoff")?);
        }
        if let Some(gw) = &def.groundwater {
            let node = lookup.node(&gw.node, "groundwater node")?;
            forcing.groundwater = Some(lookup.series(&gw.timeseries, "groundwater")?);
            if let Some(sc) = builder.subcatchment_mut(id) {
                sc.groundwater = Some(Groundwater {
                    node,
                    old_flow: 0.0,
                    new_flow: 0.0,
                });
            }
        }
        if let Some(lid) = &def.lid_drain {
            let node = lookup.node(&lid.node, "lid drain node")?;
            forcing.lid_drain = Some(lookup.series(&lid.timeseries, "lid drain")?);
            if let Some(sc) = builder.subcatchment_mut(id) {
                sc.lid = Some(LidDrain {
                    node,
                    old_drain: 0.0,
                    new_drain: 0.0,
                });
            }
        }
        runoff.insert(id, forcing);
    }

    for def in &scenario.inflows {
        let node = lookup.node(&def.node, "inflow node")?;
        let target = match &def.target {
            InflowTargetDef::Flow => ExternalTarget::Flow,
            InflowTargetDef::Concentration { pollutant } => ExternalTarget::Pollutant {
                index: lookup.pollutant(pollutant, "inflow pollutant")?,
                basis: LoadBasis::Concentration,
            },
            InflowTargetDef::Mass { pollutant } => ExternalTarget::Pollutant {
                index: lookup.pollutant(pollutant, "inflow pollutant")?,
                basis: LoadBasis::Mass,
            },
        };
        let inflow = ExternalInflow {
            target,
            series: def
                .timeseries
                .as_deref()
                .map(|ts| lookup.series(ts, "inflow timeseries"))
                .transpose()?,
            scale: def.scale,
            baseline: def.baseline,
            baseline_pattern: def
                .baseline_pattern
                .as_deref()
                .map(|p| lookup.pattern(p, "inflow baseline_pattern"))
                .transpose()?,
            conversion: def.conversion,
        };
        builder.add_external_inflow(node, inflow);
    }

    for def in &scenario.dry_weather {
        let node = lookup.node(&def.node, "dry_weather node")?;
        let patterns = lookup.dwf_patterns(&def.patterns)?;
        let inflow = match &def.pollutant {
            None => DryWeatherInflow::flow(def.average),
            Some(p) => {
                DryWeatherInflow::pollutant(lookup.pollutant(p, "dry_weather pollutant")?, def.average)
            }
        };
        builder.add_dry_weather_inflow(node, inflow.with_patterns(patterns));
    }

    let network = builder.build()?;

    let mut forcing = Forcing::default();
    if !scenario.rdii.is_empty() {
        let mut table = RdiiTable::new();
        for def in &scenario.rdii {
            table.insert(
                lookup.node(&def.node, "rdii node")?,
                lookup.series(&def.timeseries, "rdii timeseries")?,
            );
        }
        forcing.rdii = Some(Box::new(table));
    }
    if !scenario.interface.is_empty() {
        let mut table = InterfaceTable::new();
        for def in &scenario.interface {
            let mut concen: Vec<TimeSeries> = scenario
                .pollutants
                .iter()
                .map(|p| TimeSeries::new(p.id.clone(), Vec::new()))
                .collect::<Result<_, _>>()?;
            for c in &def.concen {
                let p = lookup.pollutant(&c.pollutant, "interface pollutant")?;
                concen[p] = lookup.series(&c.timeseries, "interface concentration")?;
            }
            table.insert(
                lookup.node(&def.node, "interface node")?,
                lookup.series(&def.flow, "interface flow")?,
                concen,
            );
        }
        forcing.interface = Some(Box::new(table));
    }

    let rules = scenario
        .controls
        .iter()
        .map(|c| -> Result<SettingRule, ValidationError> {
            Ok(SettingRule::new(lookup.link(&c.link, "control link")?, c.at, c.setting))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        scenario = %scenario.name,
        nodes = network.nodes().len(),
        links = network.links().len(),
        subcatchments = network.subcatchments().len(),
        rules = rules.len(),
        "scenario compiled"
    );

    Ok(CompiledScenario {
        name: scenario.name.clone(),
        start: scenario.start,
        end: scenario.end,
        timing: scenario.timing,
        options: scenario.options.clone(),
        network,
        forcing,
        rules: ScheduledSettings::new(rules),
        runoff,
    })
}
