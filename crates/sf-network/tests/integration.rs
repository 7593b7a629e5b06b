//! Integration tests for sf-network.

use sf_network::{
    Conduit, DryWeatherInflow, ExternalInflow, LinkKind, NetworkBuilder, NodeKind, Outfall,
    Pollutant, Pump, Storage, sort_links,
};

#[test]
fn build_branching_network() {
    // Build: J1 -> [C1] -> J2 -> [C2] -> O1
    //                      SU1 -> [P1] -> J2
    let mut builder = NetworkBuilder::new();
    let j1 = builder.add_junction("J1");
    let j2 = builder.add_junction("J2");
    let su1 = builder.add_node(
        "SU1",
        NodeKind::Storage(Storage {
            area: 100.0,
            ..Default::default()
        }),
    );
    let o1 = builder.add_node("O1", NodeKind::Outfall(Outfall::default()));
    let c1 = builder.add_link("C1", j1, j2, LinkKind::Conduit(Conduit::default()));
    let c2 = builder.add_link("C2", j2, o1, LinkKind::Conduit(Conduit::default()));
    let p1 = builder.add_link("P1", su1, j2, LinkKind::Pump(Pump::default()));
    builder.add_pollutant(Pollutant::new("BOD"));
    builder.add_external_inflow(j1, ExternalInflow::constant_flow(2.0));
    builder.add_dry_weather_inflow(j1, DryWeatherInflow::flow(0.5));

    let network = builder.build().unwrap();

    assert_eq!(network.nodes().len(), 4);
    assert_eq!(network.links().len(), 3);
    assert_eq!(network.node(j2).unwrap().degree, 3);
    assert_eq!(network.node(o1).unwrap().degree, 1);
    assert!(network.node(o1).unwrap().is_outfall());
    assert_eq!(network.node_by_name("SU1").unwrap().id, su1);
    assert_eq!(network.link_by_name("P1").unwrap().id, p1);

    let j1_node = network.node(j1).unwrap();
    assert_eq!(j1_node.ext_flow_inflow().unwrap().baseline, 2.0);
    assert_eq!(j1_node.dwf_flow_inflow().unwrap().average, 0.5);

    let order = sort_links(&network).unwrap();
    assert!(order.acyclic);
    let pos = |id| order.links.iter().position(|&l| l == id).unwrap();
    assert!(pos(c1) < pos(c2));
    assert!(pos(p1) < pos(c2));
}

#[test]
fn pump_targets_resolved_from_upstream_depth() {
    let mut builder = NetworkBuilder::new();
    let wet = builder.add_node("Wet", NodeKind::Storage(Storage::default()));
    let out = builder.add_node("Out", NodeKind::Outfall(Outfall::default()));
    let p1 = builder.add_link(
        "P1",
        wet,
        out,
        LinkKind::Pump(Pump {
            startup_depth: Some(2.0),
            shutoff_depth: Some(0.5),
        }),
    );
    builder.link_mut(p1).unwrap().setting = 0.0;
    builder.node_mut(wet).unwrap().new_depth = 2.5;

    let mut network = builder.build().unwrap();
    assert_eq!(network.link(p1).unwrap().target_setting, 0.0);

    network.resolve_target_settings();
    assert_eq!(network.link(p1).unwrap().target_setting, 1.0);
}
