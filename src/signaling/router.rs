use std::collections::HashMap;
use std::sync::Arc;

use crate::log::{LogSink, NoopLogSink};
use crate::signaling::protocol::SignalingMsg;
use crate::signaling::server_engine::ServerEngine;
use crate::signaling::types::{ClientId, OutgoingMsg};

/// Router glues the `ServerEngine` state machine to per-client outboxes.
///
/// Outboxes keep per-target order, which preserves each sender's order since
/// the engine runs on one thread.
pub struct Router {
    engine: ServerEngine,
    outboxes: HashMap<ClientId, Vec<SignalingMsg>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopLogSink))
    }

    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self {
            engine: ServerEngine::with_log(log),
            outboxes: HashMap::new(),
        }
    }

    /// Ensures an outbox exists for a freshly connected client.
    pub fn register_client(&mut self, client_id: ClientId) {
        self.outboxes.entry(client_id).or_default();
    }

    /// Drops the client's outbox and lets the engine clean up its room.
    pub fn unregister_client(&mut self, client_id: ClientId) {
        self.outboxes.remove(&client_id);

        let out_msgs = self.engine.handle_disconnect(client_id);
        self.enqueue_all(out_msgs);
    }

    /// Handle a message coming *from* a client.
    pub fn handle_from_client(&mut self, from_cid: ClientId, msg: SignalingMsg) {
        let out_msgs = self.engine.handle(from_cid, msg);
        self.enqueue_all(out_msgs);
    }

    /// Handle an undecodable frame from a client.
    pub fn handle_malformed(&mut self, from_cid: ClientId, reason: &str) {
        let out_msgs = self.engine.handle_malformed(from_cid, reason);
        self.enqueue_all(out_msgs);
    }

    /// Drain and return all outgoing messages for a given client.
    pub fn take_outgoing_for(&mut self, client_id: ClientId) -> Vec<SignalingMsg> {
        self.outboxes
            .get_mut(&client_id)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Drain all pending outgoing messages for all clients as
    /// `(client_id_target, msg)`.
    pub fn drain_all_outgoing(&mut self) -> Vec<(ClientId, SignalingMsg)> {
        let mut result = Vec::new();
        for (cid, msgs) in &mut self.outboxes {
            result.extend(msgs.drain(..).map(|m| (*cid, m)));
        }
        result
    }

    pub fn engine(&self) -> &ServerEngine {
        &self.engine
    }

    fn enqueue_all(&mut self, out_msgs: Vec<OutgoingMsg>) {
        for out_msg in out_msgs {
            // Targets that already disconnected have no outbox; drop silently.
            if let Some(queue) = self.outboxes.get_mut(&out_msg.client_id_target) {
                queue.push(out_msg.msg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::{RoomId, SessionDescription};

    fn join(room: &str) -> SignalingMsg {
        SignalingMsg::Join {
            room: RoomId::from(room),
            token: None,
        }
    }

    #[test]
    fn join_and_offer_are_routed_to_the_right_outboxes() {
        let mut router = Router::new();
        let (c1, c2): (ClientId, ClientId) = (1, 2);
        router.register_client(c1);
        router.register_client(c2);

        router.handle_from_client(c1, join("42"));
        router.handle_from_client(c2, join("42"));

        let outs1 = router.take_outgoing_for(c1);
        let outs2 = router.take_outgoing_for(c2);
        assert_eq!(
            outs1,
            vec![
                SignalingMsg::Joined {
                    room: RoomId::from("42"),
                    member_count: 1
                },
                SignalingMsg::UserJoined { member_count: 2 },
                SignalingMsg::PeerReady,
            ]
        );
        assert_eq!(
            outs2,
            vec![SignalingMsg::Joined {
                room: RoomId::from("42"),
                member_count: 2
            }]
        );

        let offer = SignalingMsg::Offer(SessionDescription::offer("v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\n"));
        router.handle_from_client(c1, offer.clone());
        assert!(router.take_outgoing_for(c1).is_empty());
        assert_eq!(router.take_outgoing_for(c2), vec![offer]);
    }

    #[test]
    fn drain_all_outgoing_collects_messages_for_all_clients() {
        let mut router = Router::new();
        router.register_client(1);
        router.register_client(2);

        router.handle_from_client(1, SignalingMsg::Ping { nonce: 1 });
        router.handle_from_client(2, SignalingMsg::Ping { nonce: 2 });

        let mut outgoing = router.drain_all_outgoing();
        outgoing.sort_by_key(|(cid, _)| *cid);
        assert_eq!(
            outgoing,
            vec![
                (1, SignalingMsg::Pong { nonce: 1 }),
                (2, SignalingMsg::Pong { nonce: 2 }),
            ]
        );
        assert!(router.drain_all_outgoing().is_empty());
    }

    #[test]
    fn unregister_notifies_remaining_member() {
        let mut router = Router::new();
        router.register_client(1);
        router.register_client(2);
        router.handle_from_client(1, join("x"));
        router.handle_from_client(2, join("x"));
        router.drain_all_outgoing();

        router.unregister_client(2);
        assert_eq!(
            router.drain_all_outgoing(),
            vec![(1, SignalingMsg::UserLeft { member_count: 1 })]
        );
    }

    #[test]
    fn malformed_goes_back_to_sender() {
        let mut router = Router::new();
        router.register_client(5);
        router.handle_malformed(5, "unknown event type 0x99");
        let out = router.take_outgoing_for(5);
        assert!(matches!(&out[..], [SignalingMsg::Error { message }] if message.contains("0x99")));
    }
}
