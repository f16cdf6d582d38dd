//! Two-snapshot comparison.

use std::collections::BTreeMap;

use ringscope_balance::BalanceReport;
use ringscope_types::SnapshotMeta;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token-count change of a node present in both snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDelta {
    /// Tokens owned in the earlier snapshot.
    pub before: usize,
    /// Tokens owned in the later snapshot.
    pub after: usize,
    /// `after - before`.
    pub change: i64,
}

/// Differences between two snapshots. All deltas are `after - before`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotComparison {
    /// Metadata of the earlier snapshot.
    pub before: SnapshotMeta,
    /// Metadata of the later snapshot.
    pub after: SnapshotMeta,
    /// `after.taken_at - before.taken_at`, in seconds. Widened so any pair
    /// of timestamps is exact.
    pub time_span_secs: i128,
    /// Nodes only in the later snapshot, sorted.
    pub nodes_added: Vec<String>,
    /// Nodes only in the earlier snapshot, sorted.
    pub nodes_removed: Vec<String>,
    /// Nodes in both snapshots, sorted.
    pub nodes_unchanged: Vec<String>,
    /// Token-count deltas for every node in `nodes_unchanged`.
    pub token_deltas: BTreeMap<String, TokenDelta>,
    /// Owned tokens in the earlier snapshot.
    pub total_tokens_before: usize,
    /// Owned tokens in the later snapshot.
    pub total_tokens_after: usize,
    /// Change in owned tokens.
    pub total_tokens_change: i64,
    /// Balance score of the earlier snapshot.
    pub balance_score_before: f64,
    /// Balance score of the later snapshot.
    pub balance_score_after: f64,
    /// Change in balance score.
    pub balance_change: f64,
    /// Gap ranges in the earlier snapshot.
    pub gaps_before: usize,
    /// Gap ranges in the later snapshot.
    pub gaps_after: usize,
    /// Change in gap ranges.
    pub gap_change: i64,
    /// Change in the share of the ring covered by gaps, in percentage points.
    pub gap_percentage_change: f64,
}

impl SnapshotComparison {
    /// Nodes whose token count differs between the snapshots.
    pub fn changed_nodes(&self) -> impl Iterator<Item = (&str, &TokenDelta)> {
        self.token_deltas
            .iter()
            .filter(|(_, d)| d.change != 0)
            .map(|(node, d)| (node.as_str(), d))
    }

    /// Whether any node joined or left.
    pub fn membership_changed(&self) -> bool {
        !self.nodes_added.is_empty() || !self.nodes_removed.is_empty()
    }
}

/// Compares scored snapshots.
pub struct SnapshotDiffer;

impl SnapshotDiffer {
    /// Compare `before` with `after`.
    ///
    /// Node membership is taken from each report's owning nodes. Swapping the
    /// arguments swaps `nodes_added` with `nodes_removed` and negates every
    /// delta.
    pub fn compare(
        before_meta: &SnapshotMeta,
        before: &BalanceReport,
        after_meta: &SnapshotMeta,
        after: &BalanceReport,
    ) -> SnapshotComparison {
        let nodes_added: Vec<String> = after
            .nodes
            .keys()
            .filter(|n| !before.nodes.contains_key(*n))
            .cloned()
            .collect();
        let nodes_removed: Vec<String> = before
            .nodes
            .keys()
            .filter(|n| !after.nodes.contains_key(*n))
            .cloned()
            .collect();

        let mut nodes_unchanged = Vec::new();
        let mut token_deltas = BTreeMap::new();
        for (node, old) in &before.nodes {
            if let Some(new) = after.nodes.get(node) {
                nodes_unchanged.push(node.clone());
                token_deltas.insert(
                    node.clone(),
                    TokenDelta {
                        before: old.token_count,
                        after: new.token_count,
                        change: signed_delta(old.token_count, new.token_count),
                    },
                );
            }
        }

        let comparison = SnapshotComparison {
            before: before_meta.clone(),
            after: after_meta.clone(),
            time_span_secs: i128::from(after_meta.taken_at) - i128::from(before_meta.taken_at),
            nodes_added,
            nodes_removed,
            nodes_unchanged,
            token_deltas,
            total_tokens_before: before.total_tokens,
            total_tokens_after: after.total_tokens,
            total_tokens_change: signed_delta(before.total_tokens, after.total_tokens),
            balance_score_before: before.balance_score,
            balance_score_after: after.balance_score,
            balance_change: after.balance_score - before.balance_score,
            gaps_before: before.gap_count,
            gaps_after: after.gap_count,
            gap_change: signed_delta(before.gap_count, after.gap_count),
            gap_percentage_change: after.gap_percentage - before.gap_percentage,
        };

        debug!(
            before = %comparison.before.label,
            after = %comparison.after.label,
            added = comparison.nodes_added.len(),
            removed = comparison.nodes_removed.len(),
            balance_change = comparison.balance_change,
            "compared snapshots"
        );
        comparison
    }
}

fn signed_delta(before: usize, after: usize) -> i64 {
    after as i64 - before as i64
}
