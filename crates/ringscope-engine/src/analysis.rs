//! Per-datacenter pipeline and cluster-wide aggregation.

use std::collections::BTreeMap;

use ringscope_advisor::{RebalancingAdvisor, RebalancingPlan};
use ringscope_balance::{BalanceReport, BalanceScorer};
use ringscope_ring::{RangeCalculator, RingModel, RingWarning, TokenRange};
use ringscope_types::{AdvisorConfig, RangeOptions, RawTokenEntry, SnapshotId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Range and advisor policy for a whole analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Which entries count as gaps.
    pub ranges: RangeOptions,
    /// Severity thresholds, move limit, and throughput.
    pub advisor: AdvisorConfig,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Rebalancing advice, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Advice {
    /// A plan was built.
    Ready(RebalancingPlan),
    /// The advisor declined, e.g. for a single-node ring.
    Unavailable {
        /// Error kind reported by the advisor.
        kind: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl Advice {
    /// The plan, if one was built.
    pub fn plan(&self) -> Option<&RebalancingPlan> {
        match self {
            Self::Ready(plan) => Some(plan),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Everything computed for one healthy datacenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatacenterAnalysis {
    /// Datacenter name.
    pub datacenter: String,
    /// Fingerprint of the validated ring.
    pub snapshot_id: SnapshotId,
    /// Optional-field problems found while building the model.
    pub warnings: Vec<RingWarning>,
    /// The ordered partition of the ring.
    pub ranges: Vec<TokenRange>,
    pub report: BalanceReport,
    pub advice: Advice,
}

/// A datacenter that could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterFailure {
    /// Datacenter name.
    pub datacenter: String,
    /// Machine-readable error kind, e.g. `malformed_token`.
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
}

/// Result of analysing one datacenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatacenterOutcome {
    Analyzed(Box<DatacenterAnalysis>),
    Failed(DatacenterFailure),
}

impl DatacenterOutcome {
    /// The analysis, if the datacenter was healthy.
    pub fn analysis(&self) -> Option<&DatacenterAnalysis> {
        match self {
            Self::Analyzed(analysis) => Some(analysis),
            Self::Failed(_) => None,
        }
    }

    /// The failure, if the datacenter was rejected.
    pub fn failure(&self) -> Option<&DatacenterFailure> {
        match self {
            Self::Analyzed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// A node as seen across every analysed datacenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Tokens owned across all datacenters.
    pub total_tokens: usize,
    /// Datacenters the node owns ranges in, sorted.
    pub datacenters: Vec<String>,
}

/// Cluster-wide aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Datacenters in the input.
    pub datacenters: usize,
    /// Datacenters analysed successfully.
    pub analyzed: usize,
    /// Datacenters that failed.
    pub failed: usize,
    /// Per-node aggregates over the analysed datacenters, keyed by address.
    pub nodes: BTreeMap<String, ClusterNode>,
}

impl ClusterSummary {
    /// Nodes that own ranges in more than one datacenter.
    pub fn shared_nodes(&self) -> impl Iterator<Item = (&str, &ClusterNode)> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.datacenters.len() > 1)
            .map(|(address, n)| (address.as_str(), n))
    }
}

/// Outcomes for every datacenter plus the cluster summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAnalysis {
    /// Outcome per datacenter, keyed by name.
    pub datacenters: BTreeMap<String, DatacenterOutcome>,
    pub summary: ClusterSummary,
}

impl ClusterAnalysis {
    /// Successfully analysed datacenters, in name order.
    pub fn analyzed(&self) -> impl Iterator<Item = &DatacenterAnalysis> {
        self.datacenters.values().filter_map(DatacenterOutcome::analysis)
    }

    /// Failed datacenters, in name order.
    pub fn failures(&self) -> impl Iterator<Item = &DatacenterFailure> {
        self.datacenters.values().filter_map(DatacenterOutcome::failure)
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Runs the analysis pipeline with a fixed configuration.
#[derive(Debug, Clone)]
pub struct ClusterAnalyzer {
    calculator: RangeCalculator,
    advisor: RebalancingAdvisor,
}

impl ClusterAnalyzer {
    /// Create an analyzer. Fails only on an invalid advisor configuration.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            calculator: RangeCalculator::new(config.ranges),
            advisor: RebalancingAdvisor::new(config.advisor)?,
        })
    }

    /// Analyse one datacenter.
    ///
    /// Validation and scoring errors abort; an advisor refusal does not and
    /// is recorded as [`Advice::Unavailable`].
    pub fn analyze_datacenter(
        &self,
        datacenter: &str,
        raw: &[RawTokenEntry],
    ) -> Result<DatacenterAnalysis, AnalysisError> {
        let model = RingModel::build(datacenter, raw)?;
        let ranges = self.calculator.calculate(&model);
        let report = BalanceScorer::score(&model, &ranges)?;

        let advice = match self.advisor.plan(&report, &ranges) {
            Ok(plan) => Advice::Ready(plan),
            Err(e) => {
                debug!(datacenter, kind = e.kind(), "no rebalancing advice");
                Advice::Unavailable {
                    kind: e.kind().to_string(),
                    reason: e.to_string(),
                }
            }
        };

        Ok(DatacenterAnalysis {
            datacenter: datacenter.to_string(),
            snapshot_id: model.snapshot_id(),
            warnings: model.warnings().to_vec(),
            ranges,
            report,
            advice,
        })
    }

    /// Analyse every datacenter in `input` independently.
    pub fn analyze(&self, input: &BTreeMap<String, Vec<RawTokenEntry>>) -> ClusterAnalysis {
        let mut datacenters = BTreeMap::new();
        for (name, raw) in input {
            let outcome = match self.analyze_datacenter(name, raw) {
                Ok(analysis) => DatacenterOutcome::Analyzed(Box::new(analysis)),
                Err(e) => {
                    warn!(datacenter = %name, kind = e.kind(), error = %e, "datacenter analysis failed");
                    DatacenterOutcome::Failed(DatacenterFailure {
                        datacenter: name.clone(),
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    })
                }
            };
            datacenters.insert(name.clone(), outcome);
        }

        let summary = summarize(&datacenters);
        debug!(
            datacenters = summary.datacenters,
            analyzed = summary.analyzed,
            failed = summary.failed,
            nodes = summary.nodes.len(),
            "analysed cluster"
        );
        ClusterAnalysis {
            datacenters,
            summary,
        }
    }
}

/// Analyse every datacenter in `input` with `config`.
///
/// Errors only when `config` is invalid; per-datacenter problems are
/// reported inside the returned [`ClusterAnalysis`].
pub fn analyze_cluster(
    input: &BTreeMap<String, Vec<RawTokenEntry>>,
    config: &AnalysisConfig,
) -> Result<ClusterAnalysis, AnalysisError> {
    Ok(ClusterAnalyzer::new(config.clone())?.analyze(input))
}

fn summarize(datacenters: &BTreeMap<String, DatacenterOutcome>) -> ClusterSummary {
    let mut nodes: BTreeMap<String, ClusterNode> = BTreeMap::new();
    let mut analyzed = 0;
    for (name, outcome) in datacenters {
        let Some(analysis) = outcome.analysis() else {
            continue;
        };
        analyzed += 1;
        for (address, stats) in &analysis.report.nodes {
            let node = nodes.entry(address.clone()).or_insert_with(|| ClusterNode {
                total_tokens: 0,
                datacenters: Vec::new(),
            });
            node.total_tokens += stats.token_count;
            node.datacenters.push(name.clone());
        }
    }
    ClusterSummary {
        datacenters: datacenters.len(),
        analyzed,
        failed: datacenters.len() - analyzed,
        nodes,
    }
}
