use crate::signaling::protocol::ProtoError;

/// Event type byte (second header byte).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum MsgType {
    Join = 0x12,
    Joined = 0x13,
    UserJoined = 0x15,
    UserLeft = 0x16,
    Leave = 0x17,
    PeerReady = 0x18,

    Offer = 0x20,
    Answer = 0x21,
    IceCandidate = 0x22,

    Error = 0x2F,

    Ping = 0x30,
    Pong = 0x31,
}

impl MsgType {
    pub fn from_u8(v: u8) -> Result<MsgType, ProtoError> {
        use MsgType::*;
        match v {
            0x12 => Ok(Join),
            0x13 => Ok(Joined),
            0x15 => Ok(UserJoined),
            0x16 => Ok(UserLeft),
            0x17 => Ok(Leave),
            0x18 => Ok(PeerReady),
            0x20 => Ok(Offer),
            0x21 => Ok(Answer),
            0x22 => Ok(IceCandidate),
            0x2F => Ok(Error),
            0x30 => Ok(Ping),
            0x31 => Ok(Pong),
            other => Err(ProtoError::UnknownType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Event name as used by browser clients.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Joined => "joined",
            Self::UserJoined => "user-joined",
            Self::UserLeft => "user-left",
            Self::Leave => "leave",
            Self::PeerReady => "peer-ready",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
            Self::Error => "error",
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }
}
