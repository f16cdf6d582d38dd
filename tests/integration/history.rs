//! Integration test: comparing and trending parsed snapshots.

use ringscope_balance::BalanceReport;
use ringscope_cli::parser::parse_ring_dump;
use ringscope_engine::{AnalysisConfig, analyze_cluster};
use ringscope_history::{BalanceTrend, Direction, SnapshotDiffer, detect_trends};
use ringscope_integration_tests::{DumpBuilder, evenly_spaced};
use ringscope_types::SnapshotMeta;

/// Score the single datacenter in `text`.
fn report_of(text: &str) -> BalanceReport {
    let input = parse_ring_dump(text).unwrap();
    let analysis = analyze_cluster(&input, &AnalysisConfig::default()).unwrap();
    analysis.analyzed().next().unwrap().report.clone()
}

/// Ring of evenly spaced tokens owned by `owners` in order.
fn dump(owners: &[&str]) -> String {
    let t = evenly_spaced(owners.len());
    let mut builder = DumpBuilder::new().datacenter("dc1");
    for (owner, &token) in owners.iter().zip(&t) {
        builder = builder.node(owner, "10 GiB", token);
    }
    builder.build()
}

#[test]
fn test_diff_node_replaced() {
    let before = report_of(&dump(&["a", "b", "c", "a", "b", "c"]));
    let after = report_of(&dump(&["a", "b", "d", "a", "b", "b"]));
    let diff = SnapshotDiffer::compare(
        &SnapshotMeta::new("before", 1_000),
        &before,
        &SnapshotMeta::new("after", 4_600),
        &after,
    );

    assert_eq!(diff.time_span_secs, 3_600);
    assert_eq!(diff.nodes_added, vec!["d"]);
    assert_eq!(diff.nodes_removed, vec!["c"]);
    assert_eq!(diff.nodes_unchanged, vec!["a", "b"]);
    assert_eq!(diff.token_deltas["a"].change, 0);
    assert_eq!(diff.token_deltas["b"].change, 1);
    assert!(diff.membership_changed());

    let changed: Vec<_> = diff.changed_nodes().map(|(n, _)| n).collect();
    assert_eq!(changed, vec!["b"]);
    assert_eq!(diff.total_tokens_change, 0);
    assert!(diff.balance_change < 0.0, "b now owns half the ring");
}

#[test]
fn test_diff_is_antisymmetric() {
    let old = report_of(&dump(&["a", "b", "c"]));
    let new = report_of(&dump(&["a", "b", "a", "d"]));
    let m1 = SnapshotMeta::new("one", 10);
    let m2 = SnapshotMeta::new("two", 20);

    let forward = SnapshotDiffer::compare(&m1, &old, &m2, &new);
    let backward = SnapshotDiffer::compare(&m2, &new, &m1, &old);

    assert_eq!(forward.nodes_added, backward.nodes_removed);
    assert_eq!(forward.nodes_removed, backward.nodes_added);
    assert_eq!(forward.nodes_unchanged, backward.nodes_unchanged);
    assert_eq!(forward.total_tokens_change, -backward.total_tokens_change);
    assert_eq!(forward.gap_change, -backward.gap_change);
    assert_eq!(forward.balance_change, -backward.balance_change);
    assert_eq!(forward.time_span_secs, -backward.time_span_secs);
    for (node, delta) in &forward.token_deltas {
        assert_eq!(delta.change, -backward.token_deltas[node].change);
    }
}

#[test]
fn test_diff_identical_dumps() {
    let text = dump(&["a", "b", "c"]);
    let report = report_of(&text);
    let meta = SnapshotMeta::new("same", 0);
    let diff = SnapshotDiffer::compare(&meta, &report, &meta, &report_of(&text));
    assert!(!diff.membership_changed());
    assert_eq!(diff.changed_nodes().count(), 0);
    assert_eq!(diff.balance_change, 0.0);
    assert_eq!(diff.gap_percentage_change, 0.0);
}

#[test]
fn test_trends_over_three_snapshots() {
    let t = evenly_spaced(6);
    // A growing ring whose last snapshot has an orphaned token.
    let day1 = report_of(&dump(&["a", "b", "a", "b"]));
    let day2 = report_of(&dump(&["a", "b", "c", "a", "b", "c"]));
    let day3 = report_of(
        &DumpBuilder::new()
            .datacenter("dc1")
            .node("a", "10 GiB", t[0])
            .node("b", "10 GiB", t[1])
            .bare(t[2])
            .node("a", "10 GiB", t[3])
            .node("b", "10 GiB", t[4])
            .node("c", "10 GiB", t[5])
            .node("c", "10 GiB", t[5] + 1)
            .build(),
    );

    // Deliberately out of order.
    let snapshots = vec![
        (SnapshotMeta::new("day3", 300), day3),
        (SnapshotMeta::new("day1", 100), day1),
        (SnapshotMeta::new("day2", 200), day2),
    ];
    let trends = detect_trends(&snapshots).unwrap();

    let labels: Vec<_> = trends.samples.iter().map(|s| s.snapshot.label.as_str()).collect();
    assert_eq!(labels, vec!["day1", "day2", "day3"]);
    assert_eq!(trends.samples[0].node_count, 2);
    assert_eq!(trends.samples[2].gap_count, 1);
    assert_eq!(trends.token_trend, Direction::Increasing);
    assert_eq!(trends.gap_trend, Direction::Increasing);
    assert_eq!(trends.balance_trend, BalanceTrend::Degrading);
}

#[test]
fn test_trends_need_two_snapshots() {
    let report = report_of(&dump(&["a", "b"]));
    let err = detect_trends(&[(SnapshotMeta::new("only", 0), report)]).unwrap_err();
    assert_eq!(err.kind(), "insufficient_data");
}
