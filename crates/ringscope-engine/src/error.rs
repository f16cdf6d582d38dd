//! Error types for the analysis pipeline.

use ringscope_advisor::AdvisorError;
use ringscope_balance::BalanceError;
use ringscope_ring::RingError;

/// Errors that can occur while analysing a datacenter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// The token list failed validation.
    #[error("ring error: {0}")]
    Ring(#[from] RingError),

    /// The ring could not be scored.
    #[error("balance error: {0}")]
    Balance(#[from] BalanceError),

    /// The advisor could not be built or run.
    #[error("advisor error: {0}")]
    Advisor(#[from] AdvisorError),
}

impl AnalysisError {
    /// Short machine-readable name of the underlying error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ring(e) => e.kind(),
            Self::Balance(e) => e.kind(),
            Self::Advisor(e) => e.kind(),
        }
    }
}
