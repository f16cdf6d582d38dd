//! Integration test: dump text through parsing, ranges, scoring, and advice.

use std::collections::BTreeMap;

use ringscope_advisor::{NodeBalance, OverallStatus};
use ringscope_cli::parser::parse_ring_dump;
use ringscope_engine::{AnalysisConfig, ClusterAnalysis, DatacenterAnalysis, analyze_cluster};
use ringscope_integration_tests::{DumpBuilder, evenly_spaced};
use ringscope_ring::covers_ring;
use ringscope_types::{RING_SIZE, RangeOptions};

fn analyze(text: &str, config: &AnalysisConfig) -> ClusterAnalysis {
    let input = parse_ring_dump(text).unwrap();
    analyze_cluster(&input, config).unwrap()
}

fn only_dc(analysis: &ClusterAnalysis) -> &DatacenterAnalysis {
    let mut analyzed: Vec<_> = analysis.analyzed().collect();
    assert_eq!(analyzed.len(), 1, "expected exactly one analysed datacenter");
    analyzed.remove(0)
}

#[test]
fn test_three_evenly_spaced_nodes() {
    let t = evenly_spaced(3);
    let text = DumpBuilder::new()
        .datacenter("dc1")
        .bare(t[2])
        .node("10.0.0.1", "1.2 TiB", t[0])
        .node("10.0.0.2", "1.2 TiB", t[1])
        .node("10.0.0.3", "1.2 TiB", t[2])
        .build();

    let analysis = analyze(&text, &AnalysisConfig::default());
    let dc = only_dc(&analysis);
    assert_eq!(dc.ranges.len(), 3, "echo line must not add a token");
    assert!(covers_ring(&dc.ranges));

    let report = &dc.report;
    assert_eq!(report.coverage_percentage, 100.0);
    assert_eq!(report.gap_count, 0);
    assert!((report.balance_score - 1.0).abs() < 1e-9, "score {}", report.balance_score);
    for stats in report.nodes.values() {
        assert_eq!(stats.load_bytes, (1.2 * 1024f64.powi(4)).round() as u64);
    }

    let plan = dc.advice.plan().unwrap();
    assert_eq!(plan.overall_status, OverallStatus::Excellent);
    assert!(plan.is_balanced);
    assert!(plan.moves.is_empty());
}

#[test]
fn test_wraparound_range() {
    let text = DumpBuilder::new()
        .datacenter("dc1")
        .bare(100)
        .node("a", "1 GiB", -100)
        .node("b", "1 GiB", 0)
        .node("c", "1 GiB", 100)
        .build();
    let analysis = analyze(&text, &AnalysisConfig::default());
    let dc = only_dc(&analysis);

    assert_eq!(dc.ranges.len(), 3);
    let wrap = dc.ranges.last().unwrap();
    assert_eq!((wrap.start, wrap.end), (100, -100));
    assert_eq!(wrap.size, RING_SIZE - 200);
    assert_eq!(wrap.owner.as_deref(), Some("a"));
    assert!(wrap.wraps());
    assert!(covers_ring(&dc.ranges));
}

#[test]
fn test_ninety_ten_ring_gets_moves() {
    let t = evenly_spaced(10);
    let mut builder = DumpBuilder::new()
        .datacenter("dc1")
        .bare(t[9])
        .node("10.0.0.2", "100 GiB", t[0]);
    for &token in &t[1..] {
        builder = builder.node("10.0.0.1", "900 GiB", token);
    }
    let analysis = analyze(&builder.build(), &AnalysisConfig::default());
    let dc = only_dc(&analysis);

    let a = dc.report.node("10.0.0.1").unwrap();
    assert_eq!(a.token_count, 9);
    assert!((a.percentage - 90.0).abs() < 1e-6);

    let plan = dc.advice.plan().unwrap();
    assert_eq!(plan.nodes["10.0.0.1"].status, NodeBalance::SeverelyImbalanced);
    assert!(!plan.moves.is_empty());
    assert!(plan.moves.iter().any(|m| m.impact_score > 0.0));
    assert!(plan.projected_balance_score > plan.balance_score);
    assert!(plan.cost.estimated_data_bytes > 0);
    assert!(plan.cost.approximate);
}

#[test]
fn test_orphan_token_is_gap() {
    let text = DumpBuilder::new()
        .datacenter("dc1")
        .bare(100)
        .node("a", "1 GiB", -100)
        .bare(0)
        .node("b", "1 GiB", 100)
        .build();
    let analysis = analyze(&text, &AnalysisConfig::default());
    let dc = only_dc(&analysis);

    assert_eq!(dc.report.gap_count, 1);
    assert_eq!(dc.report.gap_space, 100);
    let gap = dc.ranges.iter().find(|r| r.is_gap()).unwrap();
    assert_eq!((gap.start, gap.end), (-100, 0));
    assert!(covers_ring(&dc.ranges));
}

#[test]
fn test_down_nodes_as_gaps_option() {
    let t = evenly_spaced(4);
    let text = DumpBuilder::new()
        .datacenter("dc1")
        .node("a", "1 GiB", t[0])
        .node("b", "1 GiB", t[1])
        .entry("c", "Down", "1 GiB", t[2])
        .node("d", "1 GiB", t[3])
        .build();

    let default = analyze(&text, &AnalysisConfig::default());
    assert_eq!(only_dc(&default).report.gap_count, 0);

    let config = AnalysisConfig {
        ranges: RangeOptions {
            down_nodes_are_gaps: true,
            ..RangeOptions::default()
        },
        ..AnalysisConfig::default()
    };
    let strict = analyze(&text, &config);
    let dc = only_dc(&strict);
    assert_eq!(dc.report.gap_count, 1);
    assert!((dc.report.gap_percentage - 25.0).abs() < 1e-9);
    assert!(dc.report.node("c").is_none());
}

#[test]
fn test_unknown_fields_degrade_with_warnings() {
    let text = DumpBuilder::new()
        .datacenter("dc1")
        .entry("a", "Sideways", "?", -5)
        .node("b", "1 GiB", 5)
        .build();
    let analysis = analyze(&text, &AnalysisConfig::default());
    let dc = only_dc(&analysis);
    assert_eq!(dc.report.total_tokens, 2);
    assert!(
        dc.warnings.iter().any(|w| w.field == "status"),
        "warnings: {:?}",
        dc.warnings
    );
}

#[test]
fn test_analysis_is_deterministic() {
    let t = evenly_spaced(7);
    let mut builder = DumpBuilder::new().datacenter("dc1");
    for (i, &token) in t.iter().enumerate() {
        builder = builder.node(&format!("10.0.0.{}", i % 3), "10 GiB", token);
    }
    let text = builder.build();
    let first = analyze(&text, &AnalysisConfig::default());
    let second = analyze(&text, &AnalysisConfig::default());
    assert_eq!(first, second);
}

#[test]
fn test_report_json_shape() {
    let t = evenly_spaced(4);
    let text = DumpBuilder::new()
        .datacenter("dc1")
        .node("a", "1 GiB", t[0])
        .node("b", "1 GiB", t[1])
        .node("a", "1 GiB", t[2])
        .node("c", "1 GiB", t[3])
        .build();
    let analysis = analyze(&text, &AnalysisConfig::default());
    let dc = only_dc(&analysis);

    let value = serde_json::to_value(&dc.report).unwrap();
    for field in ["datacenter", "total_nodes", "total_tokens", "coverage_percentage", "gap_count"] {
        assert!(value.get(field).is_some(), "missing {field}");
    }
    let node = &value["nodes"]["a"];
    for field in ["address", "token_count", "percentage", "owned_space", "load_bytes", "share"] {
        assert!(node.get(field).is_some(), "missing node field {field}");
    }

    let plan = serde_json::to_value(dc.advice.plan().unwrap()).unwrap();
    let per_node: BTreeMap<String, serde_json::Value> =
        serde_json::from_value(plan["nodes"].clone()).unwrap();
    assert_eq!(per_node.len(), 3);
}
