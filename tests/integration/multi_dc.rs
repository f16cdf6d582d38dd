//! Integration test: several datacenters in one dump.

use ringscope_cli::parser::parse_ring_dump;
use ringscope_engine::{AnalysisConfig, analyze_cluster};
use ringscope_integration_tests::{DumpBuilder, evenly_spaced};

fn two_healthy_dcs() -> String {
    let t = evenly_spaced(4);
    DumpBuilder::new()
        .datacenter("dc1")
        .bare(t[3])
        .node("10.0.0.1", "10 GiB", t[0])
        .node("10.0.0.2", "10 GiB", t[1])
        .node("10.0.0.1", "10 GiB", t[2])
        .node("10.0.0.2", "10 GiB", t[3])
        .blank()
        .datacenter("dc2")
        .bare(t[2])
        .node("10.1.0.1", "5 GiB", t[0])
        .node("10.1.0.2", "5 GiB", t[1])
        .node("10.1.0.3", "5 GiB", t[2])
        .build()
}

#[test]
fn test_each_datacenter_analysed_separately() {
    let input = parse_ring_dump(&two_healthy_dcs()).unwrap();
    assert_eq!(input.len(), 2);
    assert_eq!(input["dc1"].len(), 4);
    assert_eq!(input["dc2"].len(), 3);

    let analysis = analyze_cluster(&input, &AnalysisConfig::default()).unwrap();
    assert_eq!(analysis.summary.datacenters, 2);
    assert_eq!(analysis.summary.analyzed, 2);
    assert_eq!(analysis.summary.failed, 0);

    let names: Vec<_> = analysis.analyzed().map(|dc| dc.datacenter.as_str()).collect();
    assert_eq!(names, vec!["dc1", "dc2"]);

    let dc1 = analysis.datacenters["dc1"].analysis().unwrap();
    assert_eq!(dc1.report.total_nodes, 2);
    assert_eq!(dc1.report.node("10.0.0.1").unwrap().token_count, 2);

    let dc2 = analysis.datacenters["dc2"].analysis().unwrap();
    assert_eq!(dc2.report.total_nodes, 3);
    assert!(dc2.report.node("10.0.0.1").is_none());
}

#[test]
fn test_bad_datacenter_does_not_abort_others() {
    let mut text = two_healthy_dcs();
    text.push('\n');
    text.push_str(
        &DumpBuilder::new()
            .datacenter("dc3")
            .node("10.2.0.1", "1 GiB", 0)
            .raw("10.2.0.2 rack1 Up 12x")
            .build(),
    );

    let input = parse_ring_dump(&text).unwrap();
    let analysis = analyze_cluster(&input, &AnalysisConfig::default()).unwrap();
    assert_eq!(analysis.summary.analyzed, 2);
    assert_eq!(analysis.summary.failed, 1);

    let failures: Vec<_> = analysis.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].datacenter, "dc3");
    assert_eq!(failures[0].kind, "malformed_token");
    assert!(failures[0].message.contains("12x"), "{}", failures[0].message);

    // Healthy siblings are unaffected.
    let alone = analyze_cluster(
        &parse_ring_dump(&two_healthy_dcs()).unwrap(),
        &AnalysisConfig::default(),
    )
    .unwrap();
    assert_eq!(
        analysis.datacenters["dc1"],
        alone.datacenters["dc1"],
        "dc1 must not depend on dc3"
    );
}

#[test]
fn test_duplicate_token_fails_only_its_datacenter() {
    let text = DumpBuilder::new()
        .datacenter("dc1")
        .node("a", "1 GiB", 10)
        .node("b", "1 GiB", 10)
        .blank()
        .datacenter("dc2")
        .node("a", "1 GiB", 10)
        .node("b", "1 GiB", 20)
        .build();
    let input = parse_ring_dump(&text).unwrap();
    let analysis = analyze_cluster(&input, &AnalysisConfig::default()).unwrap();

    let failure = analysis.datacenters["dc1"].failure().unwrap();
    assert_eq!(failure.kind, "malformed_token");
    assert!(analysis.datacenters["dc2"].analysis().is_some());
}

#[test]
fn test_shared_nodes_across_datacenters() {
    let text = DumpBuilder::new()
        .datacenter("east")
        .node("10.0.0.1", "1 GiB", -1000)
        .node("10.0.0.2", "1 GiB", 0)
        .node("10.0.0.1", "1 GiB", 1000)
        .blank()
        .datacenter("west")
        .node("10.0.0.1", "1 GiB", -500)
        .node("10.0.0.3", "1 GiB", 500)
        .build();
    let input = parse_ring_dump(&text).unwrap();
    let analysis = analyze_cluster(&input, &AnalysisConfig::default()).unwrap();

    let shared: Vec<_> = analysis.summary.shared_nodes().collect();
    assert_eq!(shared.len(), 1);
    let (address, node) = shared[0];
    assert_eq!(address, "10.0.0.1");
    assert_eq!(node.total_tokens, 3);
    assert_eq!(node.datacenters, vec!["east", "west"]);

    assert_eq!(analysis.summary.nodes.len(), 3);
    assert_eq!(analysis.summary.nodes["10.0.0.3"].datacenters, vec!["west"]);
}

#[test]
fn test_dump_without_datacenter_header_uses_default() {
    let text = "\
Address   Rack   Status State   Load   Owns  Token
10.0.0.1  rack1  Up     Normal  1 GiB  ?     -100
10.0.0.2  rack1  Up     Normal  1 GiB  ?     100
";
    let input = parse_ring_dump(text).unwrap();
    let analysis = analyze_cluster(&input, &AnalysisConfig::default()).unwrap();
    let names: Vec<_> = analysis.datacenters.keys().map(String::as_str).collect();
    assert_eq!(names, vec![ringscope_cli::parser::DEFAULT_DATACENTER]);
    assert_eq!(analysis.summary.analyzed, 1);
}

#[test]
fn test_datacenter_without_column_header_is_not_dropped() {
    let text = "\
Datacenter: east
==========
Address   Rack   Status State   Load    Owns    Token
10.0.0.1  rack1  Up     Normal  1 GiB   50.00%  -100
10.0.0.2  rack1  Up     Normal  1 GiB   50.00%  100

Datacenter: west
==========
10.1.0.1  rack1  Up     Normal  1 GiB   50.00%  -50
10.1.0.2  rack1  Up     Normal  1 GiB   50.00%  50

Datacenter: north
==========
";
    let input = parse_ring_dump(text).unwrap();
    let analysis = analyze_cluster(&input, &AnalysisConfig::default()).unwrap();
    let names: Vec<_> = analysis.datacenters.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["east", "north", "west"]);

    let west = analysis.datacenters["west"].analysis().unwrap();
    assert_eq!(west.report.total_nodes, 2);

    let north = analysis.datacenters["north"].failure().unwrap();
    assert_eq!(north.kind, "empty_ring");
    assert_eq!(analysis.summary.failed, 1);
}
