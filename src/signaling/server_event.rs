use std::sync::mpsc::Sender;

use crate::signaling::{protocol::SignalingMsg, types::ClientId};

/// Events sent *to* the central server thread.
pub enum ServerEvent {
    /// A new client is registered with its outgoing channel.
    RegisterClient {
        client_id: ClientId,
        to_client: Sender<SignalingMsg>,
    },

    /// A client sent a signaling message.
    MsgFromClient {
        client_id: ClientId,
        msg: SignalingMsg,
    },

    /// A client sent a complete frame whose body could not be decoded.
    /// The connection stays open.
    Malformed { client_id: ClientId, reason: String },

    /// A client disconnected (TCP closed or errored).
    Disconnected { client_id: ClientId },
}
