//! The rebalancing advisor.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use ringscope_balance::{BalanceReport, balance_score};
use ringscope_ring::TokenRange;
use ringscope_types::AdvisorConfig;
use tracing::debug;

use crate::error::AdvisorError;
use crate::plan::{CostEstimate, NodeAnalysis, RebalancingPlan, Recommendation, TokenMove};
use crate::severity::{BALANCED_SCORE, NodeBalance, OverallStatus};

/// Builds [`RebalancingPlan`]s from balance reports.
///
/// Node severity is judged on token counts against the ideal
/// `total_tokens / total_nodes`. Move impact and the projected score are
/// judged on owned space, with the same function the scorer uses.
#[derive(Debug, Clone)]
pub struct RebalancingAdvisor {
    config: AdvisorConfig,
}

impl RebalancingAdvisor {
    /// Create an advisor, validating the configuration.
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        if !config.thresholds.is_valid() {
            return Err(AdvisorError::InvalidConfig {
                reason: format!(
                    "severity thresholds must be finite, non-negative and ascending, got {} / {} / {}",
                    config.thresholds.balanced, config.thresholds.fair, config.thresholds.imbalanced
                ),
            });
        }
        if config.throughput_bytes_per_sec == 0 {
            return Err(AdvisorError::InvalidConfig {
                reason: "throughput must be greater than zero".to_string(),
            });
        }
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Analyse `report` and simulate moves over `ranges`.
    ///
    /// `ranges` must be the sequence the report was scored from. Ranges
    /// whose owner is not in the report (gaps included) are never moved.
    pub fn plan(
        &self,
        report: &BalanceReport,
        ranges: &[TokenRange],
    ) -> Result<RebalancingPlan, AdvisorError> {
        if report.nodes.len() < 2 {
            return Err(AdvisorError::InsufficientData {
                datacenter: report.datacenter.clone(),
                reason: format!(
                    "rebalancing needs at least two nodes, found {}",
                    report.nodes.len()
                ),
            });
        }

        let ideal = report.total_tokens as f64 / report.nodes.len() as f64;
        let nodes: BTreeMap<String, NodeAnalysis> = report
            .nodes
            .iter()
            .map(|(address, stats)| (address.clone(), self.analyse(stats.token_count, ideal)))
            .collect();

        let recommendations = recommend(&nodes, ideal);
        let (moves, projected_balance_score) = self.simulate_moves(report, ranges, ideal);
        let cost = self.estimate_cost(report.balance_score, projected_balance_score, &moves);

        let plan = RebalancingPlan {
            datacenter: report.datacenter.clone(),
            balance_score: report.balance_score,
            overall_status: OverallStatus::from_score(report.balance_score),
            is_balanced: report.balance_score >= BALANCED_SCORE,
            nodes,
            recommendations,
            moves,
            projected_balance_score,
            cost,
        };

        debug!(
            datacenter = %plan.datacenter,
            status = %plan.overall_status,
            recommendations = plan.recommendations.len(),
            moves = plan.moves.len(),
            projected = plan.projected_balance_score,
            "built rebalancing plan"
        );
        Ok(plan)
    }

    fn analyse(&self, current: usize, ideal: f64) -> NodeAnalysis {
        let deviation = current as f64 - ideal;
        let deviation_percent = deviation / ideal * 100.0;
        NodeAnalysis {
            current,
            ideal,
            deviation,
            deviation_percent,
            status: NodeBalance::classify(deviation_percent, &self.config.thresholds),
        }
    }

    /// Greedy move simulation over token counts.
    ///
    /// Returns the moves and the score of the ring with all of them applied.
    fn simulate_moves(
        &self,
        report: &BalanceReport,
        ranges: &[TokenRange],
        ideal: f64,
    ) -> (Vec<TokenMove>, f64) {
        let original: BTreeMap<&str, u128> = report
            .nodes
            .iter()
            .map(|(address, stats)| (address.as_str(), stats.owned_space))
            .collect();
        let original_score = balance_score(&original.values().copied().collect::<Vec<_>>());

        let mut counts: BTreeMap<&str, usize> = report
            .nodes
            .iter()
            .map(|(address, stats)| (address.as_str(), stats.token_count))
            .collect();
        let mut projected = original.clone();

        // Sorted ascending so `pop` yields the largest range, lowest token first.
        let mut movable: BTreeMap<&str, Vec<&TokenRange>> = BTreeMap::new();
        for range in ranges {
            let Some(owner) = range.owner.as_deref() else {
                continue;
            };
            if let Some((&address, _)) = original.get_key_value(owner) {
                movable.entry(address).or_default().push(range);
            }
        }
        for list in movable.values_mut() {
            list.sort_by_key(|r| (r.size, Reverse(r.end)));
        }

        let mut moves = Vec::new();
        while moves.len() < self.config.max_moves {
            let all_balanced = counts.values().all(|&c| {
                let percent = (c as f64 - ideal) / ideal * 100.0;
                NodeBalance::classify(percent, &self.config.thresholds) == NodeBalance::Balanced
            });
            if all_balanced {
                break;
            }

            let (Some(from), Some(to)) = (most_over(&counts), most_under(&counts)) else {
                break;
            };
            if counts[from] - counts[to] <= 1 {
                break;
            }
            let Some(range) = movable.get_mut(from).and_then(Vec::pop) else {
                break;
            };

            let mut isolated = original.clone();
            shift(&mut isolated, from, to, range.size);
            let impact_score =
                balance_score(&isolated.values().copied().collect::<Vec<_>>()) - original_score;

            shift(&mut projected, from, to, range.size);
            if let Some(c) = counts.get_mut(from) {
                *c -= 1;
            }
            if let Some(c) = counts.get_mut(to) {
                *c += 1;
            }

            let estimated_bytes = report
                .node(from)
                .map(|stats| proportional_bytes(stats.load_bytes, range.size, stats.owned_space))
                .unwrap_or(0);

            debug!(
                token = range.end,
                from,
                to,
                impact = impact_score,
                "simulated token move"
            );
            moves.push(TokenMove {
                token: range.end,
                from_node: from.to_string(),
                to_node: to.to_string(),
                impact_score,
                range_size: range.size,
                estimated_bytes,
            });
        }

        let projected_score = if moves.is_empty() {
            original_score
        } else {
            balance_score(&projected.values().copied().collect::<Vec<_>>())
        };
        (moves, projected_score)
    }

    fn estimate_cost(&self, current: f64, expected: f64, moves: &[TokenMove]) -> CostEstimate {
        let bytes = moves
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.estimated_bytes));
        let seconds = bytes as f64 / self.config.throughput_bytes_per_sec as f64;
        CostEstimate {
            movement_count: moves.len(),
            estimated_data_bytes: bytes,
            estimated_time_minutes: seconds / 60.0,
            current_balance: current,
            expected_balance: expected,
            balance_improvement: expected - current,
            approximate: true,
        }
    }
}

/// Recommendations for every non-balanced node, ranked.
fn recommend(nodes: &BTreeMap<String, NodeAnalysis>, ideal: f64) -> Vec<Recommendation> {
    let recommended_tokens = ideal.round() as usize;
    let mut recommendations: Vec<Recommendation> = nodes
        .iter()
        .filter_map(|(address, analysis)| {
            let priority = analysis.status.priority()?;
            let change = recommended_tokens as i64 - analysis.current as i64;
            let direction = if analysis.deviation > 0.0 { "above" } else { "below" };
            let action = match change {
                c if c < 0 => format!("remove {} token(s)", -c),
                c if c > 0 => format!("add {c} token(s)"),
                _ => "no whole-token change helps".to_string(),
            };
            Some(Recommendation {
                node: address.clone(),
                current_tokens: analysis.current,
                recommended_tokens,
                change,
                priority,
                reason: format!(
                    "{} with {} tokens, {:.1}% {} the ideal of {:.1}; {}",
                    analysis.status,
                    analysis.current,
                    analysis.deviation_percent.abs(),
                    direction,
                    ideal,
                    action
                ),
            })
        })
        .collect();

    recommendations.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(b.change.unsigned_abs().cmp(&a.change.unsigned_abs()))
            .then(a.node.cmp(&b.node))
    });
    recommendations
}

/// Node with the highest count; first address wins ties.
fn most_over<'a>(counts: &BTreeMap<&'a str, usize>) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for (&address, &count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((address, count));
        }
    }
    best.map(|(address, _)| address)
}

/// Node with the lowest count; first address wins ties.
fn most_under<'a>(counts: &BTreeMap<&'a str, usize>) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for (&address, &count) in counts {
        if best.is_none_or(|(_, c)| count < c) {
            best = Some((address, count));
        }
    }
    best.map(|(address, _)| address)
}

fn shift(owned: &mut BTreeMap<&str, u128>, from: &str, to: &str, size: u128) {
    if let Some(o) = owned.get_mut(from) {
        *o = o.saturating_sub(size);
    }
    if let Some(o) = owned.get_mut(to) {
        *o += size;
    }
}

/// `load * size / owned`, assuming load is spread evenly over owned space.
fn proportional_bytes(load: u64, size: u128, owned: u128) -> u64 {
    if owned == 0 {
        return 0;
    }
    // load < 2^64 and size <= 2^64, so the product fits in u128.
    let bytes = u128::from(load) * size / owned;
    u64::try_from(bytes).unwrap_or(u64::MAX)
}
