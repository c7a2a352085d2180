use crate::signaling::protocol::SignalingMsg;

/// Internal identifier for a connected client (one TCP connection).
pub type ClientId = u64;

/// A message the server wants to send to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMsg {
    pub client_id_target: ClientId,
    pub msg: SignalingMsg,
}

impl OutgoingMsg {
    pub fn to(client_id_target: ClientId, msg: SignalingMsg) -> Self {
        Self {
            client_id_target,
            msg,
        }
    }
}
