use chrono::{NaiveDate, NaiveDateTime};
use sf_project::schema::*;
use sf_project::{load_json, load_yaml, save_json, save_yaml, validate_scenario};
use sf_routing::RoutingOptions;

fn date(h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn empty_scenario() -> Scenario {
    Scenario {
        version: 1,
        name: "Empty".to_string(),
        start: date(0),
        end: date(1),
        timing: TimingDef::default(),
        options: RoutingOptions::default(),
        climate: ClimateDef::default(),
        pollutants: vec![],
        patterns: vec![],
        timeseries: vec![],
        nodes: vec![],
        links: vec![],
        inflows: vec![],
        dry_weather: vec![],
        subcatchments: vec![],
        rdii: vec![],
        interface: vec![],
        controls: vec![],
    }
}

fn pipe_scenario() -> Scenario {
    Scenario {
        name: "Pipe".to_string(),
        pollutants: vec![PollutantDef {
            id: "TSS".to_string(),
            dwf_concen: 10.0,
            gw_concen: 0.0,
            rdii_concen: 0.0,
        }],
        timeseries: vec![TimeSeriesDef {
            id: "q".to_string(),
            points: vec![(date(0), 1.0), (date(1), 2.0)],
        }],
        nodes: vec![
            NodeDef {
                id: "J1".to_string(),
                kind: NodeKindDef::Junction,
                full_volume: None,
                initial_volume: 0.0,
            },
            NodeDef {
                id: "O1".to_string(),
                kind: NodeKindDef::Outfall { route_to: None },
                full_volume: None,
                initial_volume: 0.0,
            },
        ],
        links: vec![LinkDef {
            id: "C1".to_string(),
            from: "J1".to_string(),
            to: "O1".to_string(),
            kind: LinkKindDef::Conduit {
                length: 100.0,
                barrels: 2,
                seep_rate: 0.0,
            },
            setting: 1.0,
        }],
        inflows: vec![ExternalInflowDef {
            node: "J1".to_string(),
            target: InflowTargetDef::Flow,
            timeseries: Some("q".to_string()),
            scale: 1.0,
            baseline: 0.0,
            baseline_pattern: None,
            conversion: 1.0,
        }],
        ..empty_scenario()
    }
}

#[test]
fn roundtrip_yaml_empty_scenario() {
    let scenario = empty_scenario();
    validate_scenario(&scenario).unwrap();

    let path = std::env::temp_dir().join("sf_project_roundtrip_empty.yaml");
    save_yaml(&path, &scenario).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(scenario, loaded);
}

#[test]
fn roundtrip_yaml_pipe() {
    let scenario = pipe_scenario();
    let path = std::env::temp_dir().join("sf_project_roundtrip_pipe.yaml");
    save_yaml(&path, &scenario).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(scenario, loaded);
}

#[test]
fn roundtrip_json_pipe() {
    let scenario = pipe_scenario();
    let path = std::env::temp_dir().join("sf_project_roundtrip_pipe.json");
    save_json(&path, &scenario).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(scenario, loaded);
}

#[test]
fn save_rejects_invalid_scenario() {
    let mut scenario = pipe_scenario();
    scenario.links[0].to = "nowhere".to_string();
    let path = std::env::temp_dir().join("sf_project_invalid.yaml");
    assert!(save_yaml(&path, &scenario).is_err());
}

#[test]
fn defaults_fill_missing_sections() {
    let yaml = r#"
version: 1
name: Minimal
start: 2024-05-01T00:00:00
end: 2024-05-01T01:00:00
nodes:
  - id: J1
    kind: { type: junction }
"#;
    let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(scenario.timing, TimingDef::default());
    assert_eq!(scenario.options, RoutingOptions::default());
    assert_eq!(scenario.climate.seepage_factor, 1.0);
    assert_eq!(scenario.nodes[0].initial_volume, 0.0);
    validate_scenario(&scenario).unwrap();
}
