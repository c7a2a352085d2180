use std::collections::VecDeque;
use std::sync::Arc;

use crate::log::{LogLevel, LogSink};
use crate::media::track::MediaTrack;
use crate::negotiation::negotiation_action::NegotiationAction;
use crate::negotiation::negotiation_error::NegotiationError;
use crate::negotiation::negotiation_event::NegotiationEvent;
use crate::negotiation::peer_connection::{PeerConnection, PeerConnectionError};
use crate::negotiation::role::Role;
use crate::negotiation::signaling_state::SignalingState;
use crate::negotiation::state_machine::{NegotiationState, reduce};
use crate::signaling::protocol::SignalingMsg;
use crate::{sink_debug, sink_error, sink_info, sink_trace, sink_warn};

/// What one [`Negotiator::handle`] call produced for the outside world.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NegotiationOutput {
    /// Messages to relay to the other member, in order.
    pub outgoing: Vec<SignalingMsg>,
    /// Errors the user should see.
    pub surfaced: Vec<NegotiationError>,
}

impl NegotiationOutput {
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.surfaced.is_empty()
    }

    pub fn append(&mut self, mut other: NegotiationOutput) {
        self.outgoing.append(&mut other.outgoing);
        self.surfaced.append(&mut other.surfaced);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatorStats {
    pub offers_sent: u32,
    pub answers_sent: u32,
    pub rollbacks: u32,
    pub collisions_dropped: u32,
}

/// Runs the negotiation reducer against a peer connection.
///
/// Each input is reduced; the resulting actions are executed in order.
/// Offer/answer creation completes synchronously here, so its completion
/// event is queued and reduced within the same `handle` call. A rejected
/// description aborts the rest of its batch and is fed back as
/// `ApplyFailed`. Local candidates gathered by the peer connection are
/// turned into `LocalCandidate` events after every batch.
pub struct Negotiator {
    state: NegotiationState,
    pc: Box<dyn PeerConnection>,
    log: Arc<dyn LogSink>,
    stats: NegotiatorStats,
}

impl Negotiator {
    pub fn new(role: Role, pc: Box<dyn PeerConnection>, log: Arc<dyn LogSink>) -> Self {
        sink_debug!(log, "negotiation session created as {}", role);
        Self {
            state: NegotiationState::new(role),
            pc,
            log,
            stats: NegotiatorStats::default(),
        }
    }

    pub fn handle(&mut self, event: NegotiationEvent) -> NegotiationOutput {
        let mut out = NegotiationOutput::default();
        let mut queue = VecDeque::from([event]);

        while let Some(ev) = queue.pop_front() {
            sink_trace!(self.log, "negotiation event {} in {}", ev.name(), self.state.signaling());
            let (next, actions) = reduce(self.state.clone(), ev);
            self.state = next;
            self.execute(actions, &mut queue, &mut out);

            for cand in self.pc.drain_local_candidates() {
                queue.push_back(NegotiationEvent::LocalCandidate(cand));
            }
        }
        out
    }

    fn execute(
        &mut self,
        actions: Vec<NegotiationAction>,
        queue: &mut VecDeque<NegotiationEvent>,
        out: &mut NegotiationOutput,
    ) {
        for action in actions {
            match action {
                NegotiationAction::CreateOffer { epoch } => {
                    let ev = match self.pc.create_offer() {
                        Ok(description) => NegotiationEvent::OfferCreated { epoch, description },
                        Err(e) => NegotiationEvent::DescriptionFailed {
                            epoch,
                            reason: e.to_string(),
                        },
                    };
                    queue.push_back(ev);
                }
                NegotiationAction::CreateAnswer { epoch } => {
                    let ev = match self.pc.create_answer() {
                        Ok(description) => NegotiationEvent::AnswerCreated { epoch, description },
                        Err(e) => NegotiationEvent::DescriptionFailed {
                            epoch,
                            reason: e.to_string(),
                        },
                    };
                    queue.push_back(ev);
                }
                NegotiationAction::ApplyLocal(desc) => {
                    if let Err(e) = self.pc.set_local_description(&desc) {
                        sink_warn!(self.log, "local {} rejected: {}", desc.sdp_type, e);
                        queue.push_front(NegotiationEvent::ApplyFailed {
                            reason: e.to_string(),
                        });
                        return;
                    }
                }
                NegotiationAction::ApplyRemote(desc) => {
                    if let Err(e) = self.pc.set_remote_description(&desc) {
                        sink_warn!(self.log, "remote {} rejected: {}", desc.sdp_type, e);
                        queue.push_front(NegotiationEvent::ApplyFailed {
                            reason: e.to_string(),
                        });
                        return;
                    }
                }
                NegotiationAction::Rollback => {
                    self.stats.rollbacks += 1;
                    if let Err(e) = self.pc.rollback() {
                        sink_warn!(self.log, "rollback failed: {}", e);
                    }
                }
                NegotiationAction::AddCandidate(cand) => {
                    if let Err(e) = self.pc.add_ice_candidate(&cand) {
                        sink_warn!(self.log, "dropping remote candidate: {}", e);
                    }
                }
                NegotiationAction::Send(msg) => {
                    match &msg {
                        SignalingMsg::Offer(_) => self.stats.offers_sent += 1,
                        SignalingMsg::Answer(_) => self.stats.answers_sent += 1,
                        _ => {}
                    }
                    out.outgoing.push(msg);
                }
                NegotiationAction::Report(err) => self.report(err, out),
                NegotiationAction::Log { level, text } => self.emit(level, &text),
                NegotiationAction::Close => {
                    self.pc.close();
                    sink_info!(self.log, "peer connection closed");
                }
            }
        }
    }

    fn report(&mut self, err: NegotiationError, out: &mut NegotiationOutput) {
        if err == NegotiationError::CollisionDrop {
            self.stats.collisions_dropped += 1;
            sink_info!(self.log, "{} (impolite side)", err);
        } else if err.is_surfaced() {
            sink_error!(self.log, "{}", err);
            out.surfaced.push(err);
        } else {
            sink_debug!(self.log, "{}", err);
        }
    }

    fn emit(&self, level: LogLevel, text: &str) {
        match level {
            LogLevel::Trace => sink_trace!(self.log, "{}", text),
            LogLevel::Debug => sink_debug!(self.log, "{}", text),
            LogLevel::Info => sink_info!(self.log, "{}", text),
            LogLevel::Warn => sink_warn!(self.log, "{}", text),
            LogLevel::Error => sink_error!(self.log, "{}", text),
        }
    }

    pub fn negotiation_needed(&mut self) -> NegotiationOutput {
        self.handle(NegotiationEvent::NegotiationNeeded)
    }

    /// Feeds a relayed offer, answer or candidate. Other messages are not
    /// negotiation input and produce nothing.
    pub fn on_remote(&mut self, msg: &SignalingMsg) -> NegotiationOutput {
        let event = match msg {
            SignalingMsg::Offer(desc) => NegotiationEvent::RemoteOffer(desc.clone()),
            SignalingMsg::Answer(desc) => NegotiationEvent::RemoteAnswer(desc.clone()),
            SignalingMsg::IceCandidate(cand) => NegotiationEvent::RemoteCandidate(cand.clone()),
            _ => return NegotiationOutput::default(),
        };
        self.handle(event)
    }

    pub fn hangup(&mut self) -> NegotiationOutput {
        self.handle(NegotiationEvent::Hangup)
    }

    /// Attaches a track on a new sender. Does not start a negotiation.
    ///
    /// # Errors
    /// See [`PeerConnection::add_track`].
    pub fn add_track(&mut self, track: MediaTrack) -> Result<(), PeerConnectionError> {
        self.pc.add_track(track)
    }

    /// Swaps the video sender's track. Does not start a negotiation.
    ///
    /// # Errors
    /// See [`PeerConnection::replace_video_track`].
    pub fn replace_video_track(&mut self, track: MediaTrack) -> Result<(), PeerConnectionError> {
        self.pc.replace_video_track(track)
    }

    pub fn video_sender_track(&self) -> Option<MediaTrack> {
        self.pc.video_sender_track()
    }

    pub fn audio_sender_track(&self) -> Option<MediaTrack> {
        self.pc.audio_sender_track()
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn role(&self) -> Role {
        self.state.role()
    }

    pub fn signaling_state(&self) -> SignalingState {
        self.state.signaling()
    }

    /// State the peer connection itself reports.
    pub fn pc_signaling_state(&self) -> SignalingState {
        self.pc.signaling_state()
    }

    pub fn stats(&self) -> NegotiatorStats {
        self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }
}
