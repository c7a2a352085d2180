use crate::signaling::protocol::{
    MsgType,
    types::{IceCandidate, RoomId, SessionDescription},
};

/// One signaling event, in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingMsg {
    // Room membership
    Join {
        room: RoomId,
        token: Option<String>, // opaque bearer credential, never inspected
    },
    Leave,
    Joined {
        room: RoomId,
        member_count: usize,
    },
    UserJoined {
        member_count: usize,
    },
    UserLeft {
        member_count: usize,
    },
    PeerReady,

    // Negotiation, relayed verbatim to the other member
    Offer(SessionDescription),
    Answer(SessionDescription),
    IceCandidate(IceCandidate),

    Error {
        message: String,
    },

    // Keepalive
    Ping {
        nonce: u64,
    },
    Pong {
        nonce: u64,
    },
}

impl SignalingMsg {
    #[must_use]
    pub fn msg_type(&self) -> MsgType {
        match self {
            Self::Join { .. } => MsgType::Join,
            Self::Leave => MsgType::Leave,
            Self::Joined { .. } => MsgType::Joined,
            Self::UserJoined { .. } => MsgType::UserJoined,
            Self::UserLeft { .. } => MsgType::UserLeft,
            Self::PeerReady => MsgType::PeerReady,
            Self::Offer(_) => MsgType::Offer,
            Self::Answer(_) => MsgType::Answer,
            Self::IceCandidate(_) => MsgType::IceCandidate,
            Self::Error { .. } => MsgType::Error,
            Self::Ping { .. } => MsgType::Ping,
            Self::Pong { .. } => MsgType::Pong,
        }
    }

    /// Wire event name; what logs print instead of payloads.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.msg_type().wire_name()
    }

    /// Events only the relay may emit.
    #[must_use]
    pub fn is_server_only(&self) -> bool {
        matches!(
            self,
            Self::Joined { .. }
                | Self::UserJoined { .. }
                | Self::UserLeft { .. }
                | Self::PeerReady
                | Self::Error { .. }
                | Self::Pong { .. }
        )
    }

    /// Offer, answer and candidate: relayed to the other member untouched.
    #[must_use]
    pub fn is_relayed(&self) -> bool {
        matches!(self, Self::Offer(_) | Self::Answer(_) | Self::IceCandidate(_))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
