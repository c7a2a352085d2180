use std::fmt;

/// Outcomes of a negotiation step that did not go as planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// The impolite side dropped a colliding remote offer.
    CollisionDrop,
    /// A description, candidate or completion arrived that cannot be applied
    /// in the current state.
    StaleDescription { what: &'static str },
    OfferFailed(String),
    AnswerFailed(String),
    /// The peer connection rejected a description; state was rolled back.
    ApplyFailed(String),
}

impl NegotiationError {
    /// Whether the user should hear about it. Collisions and stale signals are
    /// part of normal operation and only logged.
    #[must_use]
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Self::OfferFailed(_) | Self::AnswerFailed(_) | Self::ApplyFailed(_)
        )
    }
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollisionDrop => f.write_str("colliding remote offer ignored"),
            Self::StaleDescription { what } => write!(f, "stale {what} dropped"),
            Self::OfferFailed(e) => write!(f, "creating offer failed: {e}"),
            Self::AnswerFailed(e) => write!(f, "creating answer failed: {e}"),
            Self::ApplyFailed(e) => write!(f, "applying description failed: {e}"),
        }
    }
}

impl std::error::Error for NegotiationError {}
