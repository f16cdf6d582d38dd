//! Error types for snapshot history.

/// Errors produced while analysing snapshot history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// Too few snapshots to compare.
    #[error("insufficient data: need at least {needed} snapshots, got {got}")]
    InsufficientData {
        /// Snapshots required.
        needed: usize,
        /// Snapshots supplied.
        got: usize,
    },
}

impl HistoryError {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "insufficient_data",
        }
    }
}
