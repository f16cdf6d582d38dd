//! Error types for rebalancing advice.

/// Errors that can occur while building a rebalancing plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvisorError {
    /// The ring has too few nodes for "ideal" to mean anything.
    #[error("insufficient data for {datacenter:?}: {reason}")]
    InsufficientData {
        /// Datacenter name.
        datacenter: String,
        /// Why the data is insufficient.
        reason: String,
    },

    /// Severity thresholds are not finite, non-negative, and ascending.
    #[error("invalid advisor configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
}

impl AdvisorError {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "insufficient_data",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }
}
