use crate::signaling::protocol::SignalingMsg;

/// Commands issued by the participant into the signaling client's writer.
#[derive(Debug)]
pub enum SignalingCommand {
    Send(SignalingMsg),
    Disconnect,
}
