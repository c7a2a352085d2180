use crate::signaling::protocol::{IceCandidate, SessionDescription};

/// Inputs to the negotiation reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationEvent {
    /// Tracks changed; a new offer/answer round is wanted.
    NegotiationNeeded,
    OfferCreated {
        epoch: u64,
        description: SessionDescription,
    },
    AnswerCreated {
        epoch: u64,
        description: SessionDescription,
    },
    /// Offer or answer creation for `epoch` failed.
    DescriptionFailed { epoch: u64, reason: String },
    /// The peer connection rejected a local or remote description.
    ApplyFailed { reason: String },
    RemoteOffer(SessionDescription),
    RemoteAnswer(SessionDescription),
    RemoteCandidate(IceCandidate),
    /// Gathered by the local peer connection, to be relayed.
    LocalCandidate(IceCandidate),
    Hangup,
}

impl NegotiationEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NegotiationNeeded => "negotiation-needed",
            Self::OfferCreated { .. } => "offer-created",
            Self::AnswerCreated { .. } => "answer-created",
            Self::DescriptionFailed { .. } => "description-failed",
            Self::ApplyFailed { .. } => "apply-failed",
            Self::RemoteOffer(_) => "remote-offer",
            Self::RemoteAnswer(_) => "remote-answer",
            Self::RemoteCandidate(_) => "remote-candidate",
            Self::LocalCandidate(_) => "local-candidate",
            Self::Hangup => "hangup",
        }
    }
}
