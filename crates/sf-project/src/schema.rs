//! Scenario file schema.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sf_network::PatternKind;
use sf_routing::RoutingOptions;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub timing: TimingDef,
    #[serde(default)]
    pub options: RoutingOptions,
    #[serde(default)]
    pub climate: ClimateDef,
    #[serde(default)]
    pub pollutants: Vec<PollutantDef>,
    #[serde(default)]
    pub patterns: Vec<PatternDef>,
    #[serde(default)]
    pub timeseries: Vec<TimeSeriesDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub links: Vec<LinkDef>,
    #[serde(default)]
    pub inflows: Vec<ExternalInflowDef>,
    #[serde(default)]
    pub dry_weather: Vec<DryWeatherDef>,
    #[serde(default)]
    pub subcatchments: Vec<SubcatchmentDef>,
    #[serde(default)]
    pub rdii: Vec<RdiiDef>,
    #[serde(default)]
    pub interface: Vec<InterfaceDef>,
    #[serde(default)]
    pub controls: Vec<ControlDef>,
}

/// Driver clocks, all in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingDef {
    pub routing_step_s: f64,
    /// Interval between runoff (subcatchment forcing) updates.
    pub runoff_step_s: f64,
    pub report_step_s: f64,
}

impl Default for TimingDef {
    fn default() -> Self {
        Self {
            routing_step_s: 60.0,
            runoff_step_s: 300.0,
            report_step_s: 900.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClimateDef {
    /// Potential evaporation rate (length per second).
    pub evap_rate: f64,
    /// Network-wide seepage adjustment.
    pub seepage_factor: f64,
}

impl Default for ClimateDef {
    fn default() -> Self {
        Self {
            evap_rate: 0.0,
            seepage_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollutantDef {
    pub id: String,
    #[serde(default)]
    pub dwf_concen: f64,
    #[serde(default)]
    pub gw_concen: f64,
    #[serde(default)]
    pub rdii_concen: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternDef {
    pub id: String,
    pub kind: PatternKind,
    pub factors: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesDef {
    pub id: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    pub kind: NodeKindDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_volume: Option<f64>,
    #[serde(default)]
    pub initial_volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKindDef {
    Junction,
    Outfall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        route_to: Option<String>,
    },
    Storage {
        area: f64,
        #[serde(default)]
        evap_frac: f64,
        #[serde(default)]
        seep_rate: f64,
    },
    Divider,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkDef {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: LinkKindDef,
    #[serde(default = "default_setting")]
    pub setting: f64,
}

fn default_setting() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkKindDef {
    Conduit {
        #[serde(default)]
        length: f64,
        #[serde(default = "default_barrels")]
        barrels: u32,
        #[serde(default)]
        seep_rate: f64,
    },
    Pump {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        startup_depth: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shutoff_depth: Option<f64>,
    },
    Orifice,
    Weir,
    Outlet,
}

fn default_barrels() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InflowTargetDef {
    Flow,
    Concentration { pollutant: String },
    Mass { pollutant: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalInflowDef {
    pub node: String,
    pub target: InflowTargetDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeseries: Option<String>,
    #[serde(default = "default_factor")]
    pub scale: f64,
    #[serde(default)]
    pub baseline: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_pattern: Option<String>,
    #[serde(default = "default_factor")]
    pub conversion: f64,
}

fn default_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DryWeatherDef {
    pub node: String,
    /// Pollutant the record's concentration applies to; absent for the flow record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollutant: Option<String>,
    pub average: f64,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubcatchmentDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet: Option<String>,
    pub area: f64,
    /// Runoff flow series sampled at every runoff update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runoff: Option<String>,
    #[serde(default)]
    pub washoff: Vec<PollutantSeriesDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groundwater: Option<SourceDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid_drain: Option<SourceDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollutantSeriesDef {
    pub pollutant: String,
    pub timeseries: String,
}

/// A time series delivered to a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDef {
    pub node: String,
    pub timeseries: String,
}

pub type RdiiDef = SourceDef;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterfaceDef {
    pub node: String,
    pub flow: String,
    /// Concentration series by pollutant id; pollutants not listed carry none.
    #[serde(default)]
    pub concen: Vec<PollutantSeriesDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlDef {
    pub link: String,
    pub at: NaiveDateTime,
    pub setting: f64,
}
