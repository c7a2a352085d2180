use std::sync::Arc;

use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::protocol::{RoomId, SignalingMsg};
use crate::signaling::registry::{ROOM_CAPACITY, SessionRegistry};
use crate::signaling::token;
use crate::signaling::types::{ClientId, OutgoingMsg};
use crate::{sink_debug, sink_info, sink_trace, sink_warn};

/// The relay state machine: registry + routing rules, no I/O.
///
/// Every input returns the list of messages to deliver; the caller owns the
/// sockets. Payloads of offer/answer/candidate are never inspected.
pub struct ServerEngine {
    registry: SessionRegistry,
    log: Arc<dyn LogSink>,
}

impl Default for ServerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerEngine {
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopLogSink))
    }

    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            log,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Main entrypoint: handle a message from a client.
    ///
    /// Returns a list of (target_client, msg) to send.
    pub fn handle(&mut self, from_cid: ClientId, msg: SignalingMsg) -> Vec<OutgoingMsg> {
        match msg {
            SignalingMsg::Join { room, token } => self.handle_join(from_cid, room, token),

            SignalingMsg::Leave => self.handle_leave(from_cid, "leave"),

            SignalingMsg::Offer(_) | SignalingMsg::Answer(_) | SignalingMsg::IceCandidate(_) => {
                self.forward_signaling(from_cid, msg)
            }

            SignalingMsg::Ping { nonce } => {
                vec![OutgoingMsg::to(from_cid, SignalingMsg::Pong { nonce })]
            }

            SignalingMsg::Joined { .. }
            | SignalingMsg::UserJoined { .. }
            | SignalingMsg::UserLeft { .. }
            | SignalingMsg::PeerReady
            | SignalingMsg::Error { .. }
            | SignalingMsg::Pong { .. } => {
                sink_warn!(
                    self.log,
                    "ignoring server-only msg from client {}: {}",
                    from_cid,
                    msg.name()
                );
                Vec::new()
            }
        }
    }

    /// A frame arrived whose body could not be decoded. Only the sender hears
    /// about it.
    pub fn handle_malformed(&mut self, from_cid: ClientId, reason: &str) -> Vec<OutgoingMsg> {
        sink_warn!(self.log, "malformed message from client {}: {}", from_cid, reason);
        vec![OutgoingMsg::to(
            from_cid,
            SignalingMsg::error(format!("malformed message: {reason}")),
        )]
    }

    /// Called when a TCP connection closes, to clean up state.
    pub fn handle_disconnect(&mut self, client: ClientId) -> Vec<OutgoingMsg> {
        self.handle_leave(client, "disconnect")
    }

    // ---- Individual handlers ---------------------------------------------

    fn handle_join(
        &mut self,
        client: ClientId,
        room: RoomId,
        token: Option<String>,
    ) -> Vec<OutgoingMsg> {
        match token.as_deref() {
            Some(t) => sink_info!(
                self.log,
                "join attempt: client_id={} room={} token={}",
                client,
                room,
                token::fingerprint(t)
            ),
            None => sink_info!(
                self.log,
                "join attempt: client_id={} room={} (no token)",
                client,
                room
            ),
        }

        let outcome = match self.registry.join(&room, client) {
            Ok(o) => o,
            Err(e) => {
                sink_warn!(self.log, "join refused: client_id={} room={} err={}", client, room, e);
                return vec![OutgoingMsg::to(client, SignalingMsg::error(e.to_string()))];
            }
        };

        let member_count = outcome.member_count;
        sink_info!(
            self.log,
            "client {} joined room {}; room has {} members",
            client,
            room,
            member_count
        );

        let mut out = Vec::with_capacity(1 + 2 * outcome.others.len());
        out.push(OutgoingMsg::to(
            client,
            SignalingMsg::Joined {
                room: room.clone(),
                member_count,
            },
        ));
        for &other in &outcome.others {
            out.push(OutgoingMsg::to(other, SignalingMsg::UserJoined { member_count }));
        }

        if member_count == ROOM_CAPACITY {
            for &other in &outcome.others {
                sink_info!(self.log, "room {} full; peer-ready to client {}", room, other);
                out.push(OutgoingMsg::to(other, SignalingMsg::PeerReady));
            }
        }

        out
    }

    fn handle_leave(&mut self, client: ClientId, cause: &str) -> Vec<OutgoingMsg> {
        let Some(outcome) = self.registry.leave(client) else {
            sink_debug!(self.log, "client {} {} while in no room", client, cause);
            return Vec::new();
        };

        sink_info!(
            self.log,
            "client {} left room {} ({}); {} members remain",
            client,
            outcome.room_id,
            cause,
            outcome.member_count
        );

        outcome
            .remaining
            .iter()
            .map(|&member| {
                OutgoingMsg::to(
                    member,
                    SignalingMsg::UserLeft {
                        member_count: outcome.member_count,
                    },
                )
            })
            .collect()
    }

    /// Relays offer/answer/candidate to every other member of the sender's
    /// room. Dropped (not an error) when there is nobody to deliver to.
    fn forward_signaling(&mut self, from: ClientId, msg: SignalingMsg) -> Vec<OutgoingMsg> {
        let peers = self.registry.peers_of(from);
        if peers.is_empty() {
            sink_warn!(
                self.log,
                "dropping {} from client {}: no other member to deliver to",
                msg.name(),
                from
            );
            return Vec::new();
        }

        sink_trace!(self.log, "relaying {} from {} to {:?}", msg.name(), from, peers);

        peers
            .into_iter()
            .map(|peer| OutgoingMsg::to(peer, msg.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::{LogLevel, MemorySink};
    use crate::signaling::protocol::{IceCandidate, SessionDescription};

    fn join(room: &str) -> SignalingMsg {
        SignalingMsg::Join {
            room: RoomId::from(room),
            token: None,
        }
    }

    fn engine_with_two() -> ServerEngine {
        let mut e = ServerEngine::new();
        e.handle(1, join("42"));
        e.handle(2, join("42"));
        e
    }

    #[test]
    fn first_join_only_acknowledges_sender() {
        let mut e = ServerEngine::new();
        let out = e.handle(1, join("42"));
        assert_eq!(
            out,
            vec![OutgoingMsg::to(
                1,
                SignalingMsg::Joined {
                    room: RoomId::from("42"),
                    member_count: 1
                }
            )]
        );
    }

    #[test]
    fn second_join_notifies_and_sends_peer_ready_to_existing_member_only() {
        let mut e = ServerEngine::new();
        e.handle(1, join("42"));
        let out = e.handle(2, join("42"));

        assert_eq!(
            out,
            vec![
                OutgoingMsg::to(
                    2,
                    SignalingMsg::Joined {
                        room: RoomId::from("42"),
                        member_count: 2
                    }
                ),
                OutgoingMsg::to(1, SignalingMsg::UserJoined { member_count: 2 }),
                OutgoingMsg::to(1, SignalingMsg::PeerReady),
            ]
        );
    }

    #[test]
    fn third_join_gets_room_full_only() {
        let mut e = engine_with_two();
        let out = e.handle(3, join("42"));
        assert_eq!(out, vec![OutgoingMsg::to(3, SignalingMsg::error("room full"))]);
        assert_eq!(e.registry().member_count(&RoomId::from("42")), 2);
    }

    #[test]
    fn negotiation_messages_go_to_the_other_member_verbatim() {
        let mut e = engine_with_two();
        let offer = SignalingMsg::Offer(SessionDescription::offer("v=0\r\n"));
        assert_eq!(e.handle(1, offer.clone()), vec![OutgoingMsg::to(2, offer)]);

        let cand = SignalingMsg::IceCandidate(IceCandidate::new("candidate:1", 0, "0"));
        assert_eq!(e.handle(2, cand.clone()), vec![OutgoingMsg::to(1, cand)]);
    }

    #[test]
    fn relay_without_peer_is_dropped_and_logged() {
        let sink = Arc::new(MemorySink::new());
        let mut e = ServerEngine::with_log(sink.clone());
        assert!(e
            .handle(7, SignalingMsg::Answer(SessionDescription::answer("v=0")))
            .is_empty());
        e.handle(1, join("solo"));
        assert!(e
            .handle(1, SignalingMsg::Offer(SessionDescription::offer("v=0")))
            .is_empty());
        assert!(sink.contains(LogLevel::Warn, "dropping offer"));
        assert!(sink.contains(LogLevel::Warn, "dropping answer"));
    }

    #[test]
    fn leave_and_disconnect_notify_the_remaining_member() {
        let mut e = engine_with_two();
        assert_eq!(
            e.handle(2, SignalingMsg::Leave),
            vec![OutgoingMsg::to(1, SignalingMsg::UserLeft { member_count: 1 })]
        );
        // Nobody left to tell.
        assert!(e.handle_disconnect(1).is_empty());
        assert_eq!(e.registry().room_count(), 0);
        // Second disconnect of the same client is a no-op.
        assert!(e.handle_disconnect(1).is_empty());
    }

    #[test]
    fn ping_pong_and_server_only_messages() {
        let mut e = ServerEngine::new();
        assert_eq!(
            e.handle(4, SignalingMsg::Ping { nonce: 77 }),
            vec![OutgoingMsg::to(4, SignalingMsg::Pong { nonce: 77 })]
        );
        assert!(e.handle(4, SignalingMsg::PeerReady).is_empty());
        assert!(e.handle(4, SignalingMsg::UserLeft { member_count: 0 }).is_empty());
    }

    #[test]
    fn malformed_body_errors_to_sender() {
        let mut e = ServerEngine::new();
        let out = e.handle_malformed(3, "invalid JSON body: eof");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].client_id_target, 3);
        match &out[0].msg {
            SignalingMsg::Error { message } => assert!(message.starts_with("malformed message")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn token_is_logged_only_as_fingerprint() {
        let sink = Arc::new(MemorySink::new());
        let mut e = ServerEngine::with_log(sink.clone());
        e.handle(
            1,
            SignalingMsg::Join {
                room: RoomId::from("42"),
                token: Some("very-secret-bearer".into()),
            },
        );
        let lines = sink.lines();
        assert!(lines.iter().all(|(_, l)| !l.contains("very-secret-bearer")));
        assert!(sink.contains(LogLevel::Info, &token::fingerprint("very-secret-bearer")));
    }
}
