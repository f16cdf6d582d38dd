//! Error types for balance scoring.

/// Errors produced while scoring a ring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    /// Not enough owned ranges to compute node statistics.
    #[error("insufficient data for {datacenter:?}: {reason}")]
    InsufficientData {
        /// Datacenter name.
        datacenter: String,
        /// Why the data is insufficient.
        reason: String,
    },
}

impl BalanceError {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "insufficient_data",
        }
    }
}
