//! Balance reports and the scorer that builds them.

use std::collections::BTreeMap;

use ringscope_ring::{RingModel, TokenRange};
use ringscope_types::{RING_SIZE, RING_SIZE_F64};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::BalanceError;
use crate::score::balance_score;

/// Aggregates for one owning node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Node address.
    pub address: String,
    /// Number of ranges (tokens) the node owns.
    pub token_count: usize,
    /// Total owned space, in tokens.
    pub owned_space: u128,
    /// Owned space as a percentage of the whole ring.
    pub percentage: f64,
    /// Owned space as a fraction of all owned (non-gap) space.
    pub share: f64,
    /// Load reported for the node, in bytes.
    pub load_bytes: u64,
}

/// Range-size statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeStats {
    /// Size of the largest gap range (0 when there are none).
    pub largest_gap: u128,
    /// Size of the smallest owned range.
    pub smallest_range: u128,
    /// Size of the largest owned range.
    pub largest_range: u128,
    /// Mean size of owned ranges.
    pub average_range: f64,
}

/// Datacenter-level balance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Datacenter name.
    pub datacenter: String,
    /// Number of distinct owning nodes.
    pub total_nodes: usize,
    /// Number of owned (non-gap) ranges.
    pub total_tokens: usize,
    /// Number of ranges including gaps.
    pub total_ranges: usize,
    /// Ideal space per token: `2^64 / total_tokens`.
    pub ideal_share: f64,
    /// Fraction of the ring that is owned, in `[0, 1]`.
    pub coverage: f64,
    /// `coverage` as a percentage.
    pub coverage_percentage: f64,
    /// Number of gap ranges.
    pub gap_count: usize,
    /// Total size of gap ranges.
    pub gap_space: u128,
    /// Gap space as a percentage of the ring.
    pub gap_percentage: f64,
    /// Balance score in `[0, 1]`; 1.0 is perfectly even ownership.
    pub balance_score: f64,
    /// Per-node aggregates keyed by address.
    pub nodes: BTreeMap<String, NodeStats>,
    /// Range-size statistics.
    pub range_stats: RangeStats,
}

impl BalanceReport {
    /// Aggregates for `address`, if it owns any range.
    pub fn node(&self, address: &str) -> Option<&NodeStats> {
        self.nodes.get(address)
    }

    /// Owned sizes in address order, as fed to [`balance_score`].
    pub fn owned_sizes(&self) -> Vec<u128> {
        self.nodes.values().map(|n| n.owned_space).collect()
    }

    /// Whether every arc of the ring has an owner.
    pub fn is_fully_covered(&self) -> bool {
        self.gap_count == 0
    }
}

/// Folds ranges into a [`BalanceReport`].
pub struct BalanceScorer;

impl BalanceScorer {
    /// Score `ranges` computed from `model`.
    ///
    /// Loads come from the model's entries. Fails with
    /// [`BalanceError::InsufficientData`] when no range has an owner.
    pub fn score(model: &RingModel, ranges: &[TokenRange]) -> Result<BalanceReport, BalanceError> {
        let datacenter = model.datacenter().to_string();

        let mut nodes: BTreeMap<String, NodeStats> = BTreeMap::new();
        let mut gap_count = 0usize;
        let mut gap_space = 0u128;
        let mut largest_gap = 0u128;
        let mut smallest_range = u128::MAX;
        let mut largest_range = 0u128;

        for range in ranges {
            match &range.owner {
                None => {
                    gap_count += 1;
                    gap_space += range.size;
                    largest_gap = largest_gap.max(range.size);
                }
                Some(owner) => {
                    smallest_range = smallest_range.min(range.size);
                    largest_range = largest_range.max(range.size);
                    let stats = nodes.entry(owner.clone()).or_insert_with(|| NodeStats {
                        address: owner.clone(),
                        token_count: 0,
                        owned_space: 0,
                        percentage: 0.0,
                        share: 0.0,
                        load_bytes: model.node_load(owner),
                    });
                    stats.token_count += 1;
                    stats.owned_space += range.size;
                }
            }
        }

        if nodes.is_empty() {
            return Err(BalanceError::InsufficientData {
                datacenter,
                reason: "no range has a resolvable owner".to_string(),
            });
        }

        let owned_space = RING_SIZE - gap_space;
        let total_tokens = ranges.len() - gap_count;
        for stats in nodes.values_mut() {
            stats.percentage = stats.owned_space as f64 / RING_SIZE_F64 * 100.0;
            stats.share = stats.owned_space as f64 / owned_space as f64;
        }

        let owned: Vec<u128> = nodes.values().map(|n| n.owned_space).collect();
        let coverage = owned_space as f64 / RING_SIZE_F64;
        let report = BalanceReport {
            datacenter,
            total_nodes: nodes.len(),
            total_tokens,
            total_ranges: ranges.len(),
            ideal_share: RING_SIZE_F64 / total_tokens as f64,
            coverage,
            coverage_percentage: coverage * 100.0,
            gap_count,
            gap_space,
            gap_percentage: gap_space as f64 / RING_SIZE_F64 * 100.0,
            balance_score: balance_score(&owned),
            range_stats: RangeStats {
                largest_gap,
                smallest_range,
                largest_range,
                average_range: owned_space as f64 / total_tokens as f64,
            },
            nodes,
        };

        debug!(
            datacenter = %report.datacenter,
            nodes = report.total_nodes,
            tokens = report.total_tokens,
            gaps = report.gap_count,
            score = report.balance_score,
            "scored ring balance"
        );
        Ok(report)
    }
}
