use crate::signaling::protocol::SignalingMsg;

/// What the signaling client reports back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    /// A message from the relay.
    Msg(SignalingMsg),
    /// The connection is gone; no further events follow.
    Disconnected { reason: String },
}
