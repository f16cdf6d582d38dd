//! Trend detection over a series of snapshots.

use std::fmt;

use ringscope_balance::BalanceReport;
use ringscope_types::SnapshotMeta;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::HistoryError;

/// Direction of a count between the first and last snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The last value is higher than the first.
    Increasing,
    /// The last value is lower than the first.
    Decreasing,
    /// First and last values are equal.
    Stable,
}

impl Direction {
    fn between<T: PartialOrd>(first: T, last: T) -> Self {
        if last > first {
            Self::Increasing
        } else if last < first {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increasing => f.write_str("increasing"),
            Self::Decreasing => f.write_str("decreasing"),
            Self::Stable => f.write_str("stable"),
        }
    }
}

/// Direction of the balance score between the first and last snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceTrend {
    /// The last score is higher than the first.
    Improving,
    /// The last score is lower than the first.
    Degrading,
    /// First and last scores are equal.
    Stable,
}

impl fmt::Display for BalanceTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Improving => f.write_str("improving"),
            Self::Degrading => f.write_str("degrading"),
            Self::Stable => f.write_str("stable"),
        }
    }
}

/// One point of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    /// Which snapshot this point came from.
    pub snapshot: SnapshotMeta,
    /// Owned tokens.
    pub total_tokens: usize,
    /// Owning nodes.
    pub node_count: usize,
    /// Balance score in `[0, 1]`.
    pub balance_score: f64,
    /// Gap ranges.
    pub gap_count: usize,
    /// Share of the ring covered by gaps, in percent.
    pub gap_percentage: f64,
}

/// Series and direction labels for a set of snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Samples ordered by `taken_at`, ties kept in input order.
    pub samples: Vec<TrendSample>,
    /// Owned-token count, first vs last.
    pub token_trend: Direction,
    /// Balance score, first vs last.
    pub balance_trend: BalanceTrend,
    /// Gap count, first vs last.
    pub gap_trend: Direction,
}

/// Summarise how a ring evolved across `snapshots`.
///
/// Snapshots are ordered by timestamp first. Directions compare only the
/// first and last samples. Fewer than two snapshots is
/// [`HistoryError::InsufficientData`].
pub fn detect_trends(
    snapshots: &[(SnapshotMeta, BalanceReport)],
) -> Result<TrendReport, HistoryError> {
    if snapshots.len() < 2 {
        return Err(HistoryError::InsufficientData {
            needed: 2,
            got: snapshots.len(),
        });
    }

    let mut samples: Vec<TrendSample> = snapshots
        .iter()
        .map(|(meta, report)| TrendSample {
            snapshot: meta.clone(),
            total_tokens: report.total_tokens,
            node_count: report.total_nodes,
            balance_score: report.balance_score,
            gap_count: report.gap_count,
            gap_percentage: report.gap_percentage,
        })
        .collect();
    samples.sort_by_key(|s| s.snapshot.taken_at);

    let first = &samples[0];
    let last = &samples[samples.len() - 1];

    let balance_trend = if last.balance_score > first.balance_score {
        BalanceTrend::Improving
    } else if last.balance_score < first.balance_score {
        BalanceTrend::Degrading
    } else {
        BalanceTrend::Stable
    };
    let token_trend = Direction::between(first.total_tokens, last.total_tokens);
    let gap_trend = Direction::between(first.gap_count, last.gap_count);

    debug!(
        snapshots = samples.len(),
        tokens = %token_trend,
        balance = %balance_trend,
        gaps = %gap_trend,
        "detected trends"
    );
    Ok(TrendReport {
        samples,
        token_trend,
        balance_trend,
        gap_trend,
    })
}
