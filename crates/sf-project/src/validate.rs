//! Scenario validation.

use std::collections::HashSet;

use crate::schema::{InflowTargetDef, LinkKindDef, NodeKindDef, Scenario};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn unique_ids<'a>(
    ids: impl IntoIterator<Item = &'a String>,
    context: &str,
) -> Result<HashSet<&'a String>, ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                id: id.clone(),
                context: context.to_string(),
            });
        }
    }
    Ok(seen)
}

fn require(ids: &HashSet<&String>, id: &String, context: &str) -> Result<(), ValidationError> {
    if ids.contains(id) {
        Ok(())
    } else {
        Err(ValidationError::MissingReference {
            id: id.clone(),
            context: context.to_string(),
        })
    }
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version == 0 || scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }
    if scenario.end <= scenario.start {
        return Err(invalid("end", scenario.end, "must be after start"));
    }

    let timing = &scenario.timing;
    for (field, value) in [
        ("timing.routing_step_s", timing.routing_step_s),
        ("timing.runoff_step_s", timing.runoff_step_s),
        ("timing.report_step_s", timing.report_step_s),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(invalid(field, value, "must be positive"));
        }
    }

    let options = &scenario.options;
    for (field, value) in [
        ("options.lat_flow_tol", options.lat_flow_tol),
        ("options.sys_flow_tol", options.sys_flow_tol),
        ("options.rule_step_s", options.rule_step_s),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(field, value, "must be non-negative"));
        }
    }
    for event in &options.events {
        if event.end <= event.start {
            return Err(invalid("options.events.end", event.end, "must be after start"));
        }
    }

    let pollutants = unique_ids(scenario.pollutants.iter().map(|p| &p.id), "pollutants")?;
    let patterns = unique_ids(scenario.patterns.iter().map(|p| &p.id), "patterns")?;
    let series = unique_ids(scenario.timeseries.iter().map(|t| &t.id), "timeseries")?;
    let nodes = unique_ids(scenario.nodes.iter().map(|n| &n.id), "nodes")?;
    let links = unique_ids(scenario.links.iter().map(|l| &l.id), "links")?;
    let subcatchments = unique_ids(scenario.subcatchments.iter().map(|s| &s.id), "subcatchments")?;

    for pattern in &scenario.patterns {
        if pattern.factors.len() != pattern.kind.len() {
            return Err(invalid(
                format!("patterns.{}.factors", pattern.id),
                pattern.factors.len(),
                "wrong number of factors for pattern kind",
            ));
        }
    }

    for ts in &scenario.timeseries {
        if ts.points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(invalid(
                format!("timeseries.{}", ts.id),
                ts.points.len(),
                "dates must be strictly increasing",
            ));
        }
    }

    for node in &scenario.nodes {
        match &node.kind {
            NodeKindDef::Outfall {
                route_to: Some(sc),
            } => require(&subcatchments, sc, "outfall route_to")?,
            NodeKindDef::Storage { area, .. } if !(*area >= 0.0) => {
                return Err(invalid(format!("nodes.{}.area", node.id), area, "must be non-negative"));
            }
            _ => {}
        }
        if node.initial_volume < 0.0 {
            return Err(invalid(
                format!("nodes.{}.initial_volume", node.id),
                node.initial_volume,
                "must be non-negative",
            ));
        }
    }

    for link in &scenario.links {
        require(&nodes, &link.from, "link from")?;
        require(&nodes, &link.to, "link to")?;
        if link.from == link.to {
            return Err(invalid(format!("links.{}.to", link.id), &link.to, "link cannot loop onto its own node"));
        }
        if !(0.0..=1.0).contains(&link.setting) {
            return Err(invalid(format!("links.{}.setting", link.id), link.setting, "must be within [0, 1]"));
        }
        if let LinkKindDef::Conduit { barrels: 0, .. } = link.kind {
            return Err(invalid(format!("links.{}.barrels", link.id), 0, "must be at least 1"));
        }
    }

    let mut flow_records = HashSet::new();
    for inflow in &scenario.inflows {
        require(&nodes, &inflow.node, "inflow node")?;
        match &inflow.target {
            InflowTargetDef::Flow => {
                if !flow_records.insert(&inflow.node) {
                    return Err(ValidationError::DuplicateId {
                        id: inflow.node.clone(),
                        context: "flow inflows".to_string(),
                    });
                }
            }
            InflowTargetDef::Concentration { pollutant } | InflowTargetDef::Mass { pollutant } => {
                require(&pollutants, pollutant, "inflow pollutant")?;
            }
        }
        if let Some(ts) = &inflow.timeseries {
            require(&series, ts, "inflow timeseries")?;
        }
        if let Some(p) = &inflow.baseline_pattern {
            require(&patterns, p, "inflow baseline_pattern")?;
        }
    }

    let mut dwf_records = HashSet::new();
    for dwf in &scenario.dry_weather {
        require(&nodes, &dwf.node, "dry_weather node")?;
        if !dwf_records.insert((&dwf.node, &dwf.pollutant)) {
            return Err(ValidationError::DuplicateId {
                id: dwf.node.clone(),
                context: "dry_weather".to_string(),
            });
        }
        if let Some(p) = &dwf.pollutant {
            require(&pollutants, p, "dry_weather pollutant")?;
        }
        let mut kinds = HashSet::new();
        for id in &dwf.patterns {
            require(&patterns, id, "dry_weather patterns")?;
            if let Some(pattern) = scenario.patterns.iter().find(|p| &p.id == id) {
                if !kinds.insert(pattern.kind) {
                    return Err(invalid(
                        format!("dry_weather.{}.patterns", dwf.node),
                        id,
                        "more than one pattern of the same kind",
                    ));
                }
            }
        }
    }

    for sc in &scenario.subcatchments {
        if let Some(outlet) = &sc.outlet {
            require(&nodes, outlet, "subcatchment outlet")?;
        }
        if !(sc.area >= 0.0) {
            return Err(invalid(format!("subcatchments.{}.area", sc.id), sc.area, "must be non-negative"));
        }
        if let Some(ts) = &sc.runoff {
            require(&series, ts, "subcatchment runoff")?;
        }
        for w in &sc.washoff {
            require(&pollutants, &w.pollutant, "subcatchment washoff")?;
            require(&series, &w.timeseries, "subcatchment washoff")?;
        }
        for source in sc.groundwater.iter().chain(&sc.lid_drain) {
            require(&nodes, &source.node, "subcatchment source node")?;
            require(&series, &source.timeseries, "subcatchment source")?;
        }
    }

    for rdii in &scenario.rdii {
        require(&nodes, &rdii.node, "rdii node")?;
        require(&series, &rdii.timeseries, "rdii timeseries")?;
    }

    for entry in &scenario.interface {
        require(&nodes, &entry.node, "interface node")?;
        require(&series, &entry.flow, "interface flow")?;
        for c in &entry.concen {
            require(&pollutants, &c.pollutant, "interface pollutant")?;
            require(&series, &c.timeseries, "interface concentration")?;
        }
    }

    for control in &scenario.controls {
        require(&links, &control.link, "control link")?;
        if !(0.0..=1.0).contains(&control.setting) {
            return Err(invalid(
                format!("controls.{}.setting", control.link),
                control.setting,
                "must be within [0, 1]",
            ));
        }
    }

    Ok(())
}
