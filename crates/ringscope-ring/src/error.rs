//! Error types for ring construction.

/// Errors that abort building a datacenter's [`RingModel`](crate::RingModel).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A required field (address or token) is missing, unparseable, or the
    /// token duplicates another one in the same datacenter.
    #[error("malformed token on line {line}: {field} {value:?}: {reason}")]
    MalformedToken {
        /// Source line of the offending entry.
        line: usize,
        /// Which field failed validation.
        field: &'static str,
        /// The offending value as received.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The datacenter has no token entries at all.
    #[error("datacenter {datacenter:?} has no tokens")]
    EmptyRing {
        /// Datacenter name.
        datacenter: String,
    },
}

impl RingError {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToken { .. } => "malformed_token",
            Self::EmptyRing { .. } => "empty_ring",
        }
    }
}
