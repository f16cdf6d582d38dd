//! Rebalancing plan records.

use std::collections::BTreeMap;

use ringscope_types::Token;
use serde::{Deserialize, Serialize};

use crate::severity::{NodeBalance, OverallStatus, Priority};

/// Token-count analysis of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAnalysis {
    /// Tokens the node currently owns.
    pub current: usize,
    /// Ideal token count: `total_tokens / total_nodes`.
    pub ideal: f64,
    /// `current - ideal`.
    pub deviation: f64,
    /// `deviation / ideal * 100`.
    pub deviation_percent: f64,
    /// Severity of the deviation.
    pub status: NodeBalance,
}

/// A per-node token-count recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Node address.
    pub node: String,
    /// Tokens the node currently owns.
    pub current_tokens: usize,
    /// Ideal token count, rounded.
    pub recommended_tokens: usize,
    /// Signed change: `recommended_tokens - current_tokens`.
    pub change: i64,
    /// Urgency.
    pub priority: Priority,
    /// Human-readable explanation.
    pub reason: String,
}

/// A simulated reassignment of one range's ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMove {
    /// The token whose range changes hands.
    pub token: Token,
    /// Node that owns the range now.
    pub from_node: String,
    /// Node that would receive it.
    pub to_node: String,
    /// Balance-score delta of this move applied alone to the current ring.
    pub impact_score: f64,
    /// Size of the moved range.
    pub range_size: u128,
    /// Approximate bytes streamed by the move.
    pub estimated_bytes: u64,
}

/// Approximate cost of applying every suggested move.
///
/// Data volume assumes load is spread evenly over a node's owned space; time
/// assumes a constant streaming throughput. Neither is a guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Number of moves.
    pub movement_count: usize,
    /// Approximate total bytes streamed.
    pub estimated_data_bytes: u64,
    /// Approximate wall-clock minutes at the configured throughput.
    pub estimated_time_minutes: f64,
    /// Balance score before any move.
    pub current_balance: f64,
    /// Projected balance score after all moves.
    pub expected_balance: f64,
    /// `expected_balance - current_balance`.
    pub balance_improvement: f64,
    /// Always `true`: these figures are estimates.
    pub approximate: bool,
}

/// Full advice for one datacenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingPlan {
    /// Datacenter name.
    pub datacenter: String,
    /// Balance score of the analysed report.
    pub balance_score: f64,
    /// Overall status band of `balance_score`.
    pub overall_status: OverallStatus,
    /// Whether `balance_score` is at least 0.9.
    pub is_balanced: bool,
    /// Per-node token-count analysis keyed by address.
    pub nodes: BTreeMap<String, NodeAnalysis>,
    /// Recommendations ranked by priority, then size of change, then address.
    pub recommendations: Vec<Recommendation>,
    /// Simulated moves in the order they were chosen.
    pub moves: Vec<TokenMove>,
    /// Balance score after all simulated moves, from the same scoring model.
    pub projected_balance_score: f64,
    /// Approximate cost of the moves.
    pub cost: CostEstimate,
}

impl RebalancingPlan {
    /// Whether any recommendation was produced.
    pub fn needs_rebalancing(&self) -> bool {
        !self.recommendations.is_empty()
    }
}
