use crate::log::LogLevel;
use crate::negotiation::negotiation_error::NegotiationError;
use crate::signaling::protocol::{IceCandidate, SessionDescription, SignalingMsg};

/// Side effects requested by the reducer, executed in order by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationAction {
    /// Completes with `OfferCreated` or `DescriptionFailed`.
    CreateOffer { epoch: u64 },
    /// Completes with `AnswerCreated` or `DescriptionFailed`.
    CreateAnswer { epoch: u64 },
    ApplyLocal(SessionDescription),
    ApplyRemote(SessionDescription),
    /// Return the peer connection to its last stable state.
    Rollback,
    AddCandidate(IceCandidate),
    Send(SignalingMsg),
    Report(NegotiationError),
    Log { level: LogLevel, text: String },
    Close,
}
