//! Integration test: partition and score properties on random rings.

use ringscope_balance::BalanceScorer;
use ringscope_integration_tests::{random_tokens, round_robin};
use ringscope_ring::{RangeCalculator, RingModel, TokenRange, covers_ring};
use ringscope_types::{RING_SIZE, RangeOptions, RawTokenEntry};

fn ranges_for(raw: &[RawTokenEntry], options: RangeOptions) -> (RingModel, Vec<TokenRange>) {
    let model = RingModel::build("dc1", raw).unwrap();
    let ranges = RangeCalculator::new(options).calculate(&model);
    (model, ranges)
}

#[test]
fn test_random_rings_partition_the_ring() {
    for seed in 0..20u64 {
        let count = 1 + (seed as usize * 7) % 64;
        let raw = round_robin(&random_tokens(count, seed), 5);
        let (_, ranges) = ranges_for(&raw, RangeOptions::default());

        assert_eq!(ranges.len(), count, "seed {seed}");
        assert!(covers_ring(&ranges), "seed {seed}");
        let total: u128 = ranges.iter().map(|r| r.size).sum();
        assert_eq!(total, RING_SIZE, "seed {seed}");
        assert!(ranges.iter().all(|r| r.size > 0));
        assert!(ranges.iter().all(|r| !r.is_gap()));
        // Only the last range may wrap.
        assert!(ranges[..ranges.len() - 1].iter().all(|r| !r.wraps()), "seed {seed}");
    }
}

#[test]
fn test_random_rings_score_in_unit_interval() {
    for seed in 100..120u64 {
        let nodes = 1 + seed as usize % 6;
        let raw = round_robin(&random_tokens(32, seed), nodes);
        let (model, ranges) = ranges_for(&raw, RangeOptions::default());
        let report = BalanceScorer::score(&model, &ranges).unwrap();

        assert!(
            (0.0..=1.0).contains(&report.balance_score),
            "seed {seed}: {}",
            report.balance_score
        );
        assert_eq!(report.total_nodes, nodes);
        assert_eq!(report.total_tokens, 32);
        let shares: f64 = report.nodes.values().map(|n| n.share).sum();
        assert!((shares - 1.0).abs() < 1e-9, "seed {seed}: shares sum {shares}");
    }
}

#[test]
fn test_excluded_nodes_keep_partition_intact() {
    for seed in 200..210u64 {
        let raw = round_robin(&random_tokens(40, seed), 4);
        let options = RangeOptions {
            excluded_nodes: ["10.0.0.2".to_string()].into_iter().collect(),
            ..RangeOptions::default()
        };
        let (model, ranges) = ranges_for(&raw, options);

        assert!(covers_ring(&ranges), "seed {seed}");
        assert_eq!(ranges.iter().filter(|r| r.is_gap()).count(), 10);

        let report = BalanceScorer::score(&model, &ranges).unwrap();
        assert_eq!(report.gap_count, 10);
        assert!(report.node("10.0.0.2").is_none());
        assert_eq!(
            report.gap_space + report.nodes.values().map(|n| n.owned_space).sum::<u128>(),
            RING_SIZE
        );
    }
}

#[test]
fn test_random_order_does_not_change_ranges() {
    let tokens = random_tokens(50, 7);
    let raw = round_robin(&tokens, 3);
    let mut reversed = raw.clone();
    reversed.reverse();

    let (_, forward) = ranges_for(&raw, RangeOptions::default());
    let (_, backward) = ranges_for(&reversed, RangeOptions::default());
    assert_eq!(forward, backward);
}
