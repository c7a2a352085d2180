use std::fmt;

use crate::signaling::protocol::RoomId;

/// Why a join was refused. The `Display` text is what the joiner receives
/// in `error{message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// The room already holds its two members.
    RoomFull,
    /// Empty or whitespace-only room id.
    InvalidRoom,
    /// The connection already belongs to a room.
    AlreadyInRoom { room: RoomId },
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomFull => f.write_str("room full"),
            Self::InvalidRoom => f.write_str("invalid room id"),
            Self::AlreadyInRoom { room } => write!(f, "already in room {room}"),
        }
    }
}

impl std::error::Error for JoinError {}
