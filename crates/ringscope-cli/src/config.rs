//! TOML configuration for the `ringscope` CLI.
//!
//! Every section is optional; a missing file or section means defaults.
//!
//! ```toml
//! [ranges]
//! down_nodes_are_gaps = true
//! excluded_nodes = ["10.0.0.9"]
//!
//! [advisor]
//! balanced_threshold = 10.0
//! fair_threshold = 25.0
//! imbalanced_threshold = 50.0
//! max_moves = 10
//! throughput = "100MB/s"
//!
//! [log]
//! level = "info"
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use ringscope_engine::AnalysisConfig;
use ringscope_types::{AdvisorConfig, RangeOptions, SeverityThresholds};
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Gap policy.
    pub ranges: RangesSection,
    /// Rebalancing advisor tuning.
    pub advisor: AdvisorSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[ranges]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RangesSection {
    /// Treat ranges owned by `Down` nodes as gaps.
    pub down_nodes_are_gaps: bool,
    /// Addresses whose ranges are treated as gaps.
    pub excluded_nodes: Vec<String>,
}

/// `[advisor]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdvisorSection {
    /// Max absolute deviation (%) still counted as balanced.
    pub balanced_threshold: Option<f64>,
    /// Max absolute deviation (%) still counted as fair.
    pub fair_threshold: Option<f64>,
    /// Max absolute deviation (%) still counted as imbalanced.
    pub imbalanced_threshold: Option<f64>,
    /// Maximum number of suggested moves.
    pub max_moves: Option<usize>,
    /// Streaming throughput for time estimates (e.g. `"100MB/s"`).
    pub throughput: Option<String>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                let config: CliConfig = toml::from_str(&content)
                    .with_context(|| format!("failed to parse {}", p.display()))?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Range policy for the analysis run.
    pub fn range_options(&self) -> RangeOptions {
        RangeOptions {
            down_nodes_are_gaps: self.ranges.down_nodes_are_gaps,
            excluded_nodes: self.ranges.excluded_nodes.iter().cloned().collect(),
        }
    }

    /// Advisor policy, with unset values taken from [`AdvisorConfig::default`].
    pub fn advisor_config(&self) -> Result<AdvisorConfig> {
        let defaults = AdvisorConfig::default();
        let section = &self.advisor;
        let throughput_bytes_per_sec = match section.throughput.as_deref() {
            Some(s) => match parse_throughput(s) {
                Some(0) | None => bail!("invalid advisor throughput {s:?}"),
                Some(bytes) => bytes,
            },
            None => defaults.throughput_bytes_per_sec,
        };
        Ok(AdvisorConfig {
            thresholds: SeverityThresholds {
                balanced: section.balanced_threshold.unwrap_or(defaults.thresholds.balanced),
                fair: section.fair_threshold.unwrap_or(defaults.thresholds.fair),
                imbalanced: section
                    .imbalanced_threshold
                    .unwrap_or(defaults.thresholds.imbalanced),
            },
            max_moves: section.max_moves.unwrap_or(defaults.max_moves),
            throughput_bytes_per_sec,
        })
    }

    /// Full analysis configuration.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        Ok(AnalysisConfig {
            ranges: self.range_options(),
            advisor: self.advisor_config()?,
        })
    }
}

/// Parse a human-readable throughput string into bytes per second.
///
/// Supports: `"100MB/s"`, `"1GB/s"`, `"512KB/s"`, `"1048576"` (raw bytes).
/// Units are binary.
pub fn parse_throughput(s: &str) -> Option<u64> {
    let s = s.trim().trim_end_matches("/s").trim();
    let (num, multiplier) = if let Some(num) = s.strip_suffix("GB") {
        (num, 1_073_741_824)
    } else if let Some(num) = s.strip_suffix("MB") {
        (num, 1_048_576)
    } else if let Some(num) = s.strip_suffix("KB") {
        (num, 1_024)
    } else if let Some(num) = s.strip_suffix('B') {
        (num, 1)
    } else {
        (s, 1)
    };
    num.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}
