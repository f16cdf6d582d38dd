//! Node severity, recommendation priority, and overall ring status.
//!
//! | Overall status | Balance score |
//! |----------------|---------------|
//! | Excellent      | `>= 0.95`     |
//! | Good           | `>= 0.90`     |
//! | Fair           | `>= 0.80`     |
//! | Poor           | `>= 0.70`     |
//! | Critical       | `< 0.70`      |

use std::fmt;

use ringscope_types::SeverityThresholds;
use serde::{Deserialize, Serialize};

/// Score at or above which a ring counts as balanced overall.
pub const BALANCED_SCORE: f64 = 0.9;

/// How far a node's token count is from ideal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeBalance {
    /// Within the balanced threshold.
    Balanced,
    /// Within the fair threshold.
    Fair,
    /// Within the imbalanced threshold.
    Imbalanced,
    /// Beyond every threshold.
    SeverelyImbalanced,
}

impl NodeBalance {
    /// Classify an absolute percentage deviation.
    pub fn classify(deviation_percent: f64, thresholds: &SeverityThresholds) -> Self {
        let abs = deviation_percent.abs();
        if abs <= thresholds.balanced {
            Self::Balanced
        } else if abs <= thresholds.fair {
            Self::Fair
        } else if abs <= thresholds.imbalanced {
            Self::Imbalanced
        } else {
            Self::SeverelyImbalanced
        }
    }

    /// Recommendation priority for a node in this state, if it needs one.
    pub fn priority(self) -> Option<Priority> {
        match self {
            Self::Balanced => None,
            Self::Fair => Some(Priority::Low),
            Self::Imbalanced => Some(Priority::Medium),
            Self::SeverelyImbalanced => Some(Priority::High),
        }
    }
}

impl fmt::Display for NodeBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balanced => f.write_str("Balanced"),
            Self::Fair => f.write_str("Fair"),
            Self::Imbalanced => f.write_str("Imbalanced"),
            Self::SeverelyImbalanced => f.write_str("Severely Imbalanced"),
        }
    }
}

/// Urgency of a recommendation. Orders `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Beyond the severe threshold.
    High,
    /// Beyond the imbalanced threshold.
    Medium,
    /// Outside balanced but within imbalanced.
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
            Self::Low => f.write_str("low"),
        }
    }
}

/// Overall ring status derived from the balance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallStatus {
    /// Score at least 0.95.
    Excellent,
    /// Score at least 0.90.
    Good,
    /// Score at least 0.80.
    Fair,
    /// Score at least 0.70.
    Poor,
    /// Anything lower.
    Critical,
}

impl OverallStatus {
    /// Classify a balance score.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Self::Excellent
        } else if score >= BALANCED_SCORE {
            Self::Good
        } else if score >= 0.8 {
            Self::Fair
        } else if score >= 0.7 {
            Self::Poor
        } else {
            Self::Critical
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => f.write_str("excellent"),
            Self::Good => f.write_str("good"),
            Self::Fair => f.write_str("fair"),
            Self::Poor => f.write_str("poor"),
            Self::Critical => f.write_str("critical"),
        }
    }
}
