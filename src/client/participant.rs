use std::sync::Arc;

use crate::client::client_event::ClientEvent;
use crate::client::participant_config::ParticipantConfig;
use crate::log::LogSink;
use crate::media::{
    LocalMedia, MediaAcquisitionError, MediaConstraints, MediaStream, MediaTrack, PreviewSource,
    ScreenShareController, SubstitutionError,
};
use crate::negotiation::{
    NegotiationOutput, Negotiator, PeerConnectionFactory, Role, SignalingState,
};
use crate::signaling::protocol::SignalingMsg;
use crate::{sink_debug, sink_error, sink_info, sink_trace, sink_warn};

/// Everything that can happen to a participant. Each is handled to
/// completion before the next one.
#[derive(Debug)]
pub enum ParticipantInput {
    /// The signaling transport is up.
    Connected,
    Signal(SignalingMsg),
    HangUp,
    StartScreenShare,
    StopScreenShare,
    UserMedia(Result<MediaStream, MediaAcquisitionError>),
    DisplayMedia(Result<MediaTrack, MediaAcquisitionError>),
    /// A watched track was ended by its source.
    TrackEnded { track_id: String },
    Disconnected { reason: String },
}

/// Work the participant asks its runtime to do.
#[derive(Debug)]
pub enum ParticipantEffect {
    Send(SignalingMsg),
    /// Completes with `ParticipantInput::UserMedia`.
    RequestUserMedia(MediaConstraints),
    /// Completes with `ParticipantInput::DisplayMedia`.
    RequestDisplayMedia,
    /// Report `TrackEnded` when the source ends this track.
    WatchTrack(MediaTrack),
    Notify(ClientEvent),
}

/// One side of a tutoring call.
///
/// Owns its local media, at most one negotiation session and the
/// screen-share controller. Receiving `peer-ready` makes it the
/// offer-creator; a first offer with no session makes it the answerer.
/// Signals that arrive while camera and microphone are being acquired are
/// held and replayed once the session exists.
pub struct Participant {
    config: ParticipantConfig,
    factory: Arc<dyn PeerConnectionFactory>,
    log: Arc<dyn LogSink>,
    in_room: bool,
    member_count: usize,
    media: Option<LocalMedia>,
    /// Role of the call waiting on `UserMedia`.
    acquiring: Option<Role>,
    session: Option<Negotiator>,
    screen: ScreenShareController,
    display_requested: bool,
    deferred: Vec<SignalingMsg>,
    last_signaling: Option<SignalingState>,
    finished: bool,
}

impl Participant {
    pub fn new(
        config: ParticipantConfig,
        factory: Arc<dyn PeerConnectionFactory>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            config,
            factory,
            screen: ScreenShareController::new(Arc::clone(&log)),
            log,
            in_room: false,
            member_count: 0,
            media: None,
            acquiring: None,
            session: None,
            display_requested: false,
            deferred: Vec::new(),
            last_signaling: None,
            finished: false,
        }
    }

    pub fn handle(&mut self, input: ParticipantInput) -> Vec<ParticipantEffect> {
        let mut fx = Vec::new();
        if self.finished {
            release_late_capture(input);
            return fx;
        }

        match input {
            ParticipantInput::Connected => {
                sink_info!(self.log, "connected; joining room {}", self.config.room);
                fx.push(notify(ClientEvent::Status("connected".into())));
                fx.push(ParticipantEffect::Send(SignalingMsg::Join {
                    room: self.config.room.clone(),
                    token: self.config.token.clone(),
                }));
            }
            ParticipantInput::Signal(msg) => self.on_signal(msg, &mut fx),
            ParticipantInput::HangUp => self.hang_up(&mut fx),
            ParticipantInput::StartScreenShare => self.request_screen_share(&mut fx),
            ParticipantInput::StopScreenShare => self.stop_screen_share(&mut fx),
            ParticipantInput::UserMedia(result) => self.on_user_media(result, &mut fx),
            ParticipantInput::DisplayMedia(result) => self.on_display_media(result, &mut fx),
            ParticipantInput::TrackEnded { track_id } => self.on_track_ended(&track_id, &mut fx),
            ParticipantInput::Disconnected { reason } => {
                sink_warn!(self.log, "signaling transport lost: {}", reason);
                self.teardown();
                self.in_room = false;
                self.finished = true;
                fx.push(notify(ClientEvent::Disconnected { reason }));
            }
        }
        fx
    }

    fn on_signal(&mut self, msg: SignalingMsg, fx: &mut Vec<ParticipantEffect>) {
        sink_trace!(self.log, "signal {}", msg.name());
        match msg {
            SignalingMsg::Joined { room, member_count } => {
                sink_info!(self.log, "joined room {} ({} present)", room, member_count);
                self.in_room = true;
                self.member_count = member_count;
                fx.push(notify(ClientEvent::Status(format!("joined room {room}"))));
                fx.push(notify(ClientEvent::MemberCount(member_count)));
            }
            SignalingMsg::UserJoined { member_count } => {
                self.member_count = member_count;
                fx.push(notify(ClientEvent::MemberCount(member_count)));
            }
            SignalingMsg::UserLeft { member_count } => {
                self.member_count = member_count;
                fx.push(notify(ClientEvent::MemberCount(member_count)));
                if self.session.is_some() || self.acquiring.is_some() {
                    self.end_call("peer left", fx);
                }
            }
            SignalingMsg::PeerReady => self.begin_call(Role::OfferCreator, fx),
            SignalingMsg::Offer(_) if self.session.is_none() => {
                self.deferred.push(msg);
                self.begin_call(Role::Answerer, fx);
            }
            SignalingMsg::Offer(_) | SignalingMsg::Answer(_) | SignalingMsg::IceCandidate(_) => {
                if self.session.is_some() {
                    self.drive(fx, |neg| neg.on_remote(&msg));
                } else if self.acquiring.is_some() {
                    self.deferred.push(msg);
                } else {
                    sink_debug!(self.log, "{} dropped: no call in progress", msg.name());
                }
            }
            SignalingMsg::Error { message } => {
                sink_warn!(self.log, "relay error: {}", message);
                fx.push(notify(ClientEvent::Error(message)));
            }
            SignalingMsg::Pong { .. } => {}
            other => sink_warn!(self.log, "unexpected {} from relay", other.name()),
        }
    }

    fn begin_call(&mut self, role: Role, fx: &mut Vec<ParticipantEffect>) {
        if self.session.is_some() {
            sink_warn!(self.log, "call already in progress; {} start ignored", role);
            return;
        }
        if self.acquiring.is_some() {
            return;
        }
        if self.media.is_some() {
            self.start_session(role, fx);
            return;
        }
        sink_info!(self.log, "acquiring camera and microphone ({})", role);
        self.acquiring = Some(role);
        fx.push(notify(ClientEvent::Status(
            "acquiring camera and microphone".into(),
        )));
        fx.push(ParticipantEffect::RequestUserMedia(MediaConstraints::default()));
    }

    fn on_user_media(
        &mut self,
        result: Result<MediaStream, MediaAcquisitionError>,
        fx: &mut Vec<ParticipantEffect>,
    ) {
        let Some(role) = self.acquiring.take() else {
            // The call ended while the devices were being opened.
            if let Ok(stream) = result {
                stream.stop();
            }
            return;
        };

        match result {
            Ok(stream) => {
                let media = LocalMedia::new(stream);
                fx.push(notify(ClientEvent::PreviewChanged(media.preview())));
                self.media = Some(media);
                self.start_session(role, fx);
            }
            Err(e) => {
                sink_error!(self.log, "media acquisition failed: {}", e);
                self.deferred.clear();
                fx.push(notify(ClientEvent::Error(format!(
                    "failed to access camera/microphone: {e}"
                ))));
            }
        }
    }

    fn start_session(&mut self, role: Role, fx: &mut Vec<ParticipantEffect>) {
        let pc = match self.factory.create(&self.config.rtc) {
            Ok(pc) => pc,
            Err(e) => {
                sink_error!(self.log, "cannot create peer connection: {}", e);
                self.deferred.clear();
                fx.push(notify(ClientEvent::Error(format!(
                    "cannot create peer connection: {e}"
                ))));
                return;
            }
        };

        let mut neg = Negotiator::new(role, pc, Arc::clone(&self.log));
        if let Some(media) = &self.media {
            for track in media.camera_stream().tracks() {
                if let Err(e) = neg.add_track(track.clone()) {
                    sink_warn!(self.log, "{} track not attached: {}", track.kind(), e);
                }
            }
        }
        sink_info!(self.log, "call starting as {}", role);
        fx.push(notify(ClientEvent::RoleAssigned(role)));
        self.session = Some(neg);
        self.last_signaling = None;

        // The answerer's tracks ride on its answer; only the offer-creator
        // needs a negotiation of its own.
        if role == Role::OfferCreator {
            self.drive(fx, Negotiator::negotiation_needed);
        }
        for msg in std::mem::take(&mut self.deferred) {
            self.drive(fx, |neg| neg.on_remote(&msg));
        }
    }

    /// Runs one negotiator step and turns its output into effects.
    fn drive<F>(&mut self, fx: &mut Vec<ParticipantEffect>, step: F)
    where
        F: FnOnce(&mut Negotiator) -> NegotiationOutput,
    {
        let Some(neg) = self.session.as_mut() else {
            return;
        };
        let out = step(neg);
        self.absorb(out, fx);
    }

    fn absorb(&mut self, out: NegotiationOutput, fx: &mut Vec<ParticipantEffect>) {
        fx.extend(out.outgoing.into_iter().map(ParticipantEffect::Send));
        fx.extend(
            out.surfaced
                .into_iter()
                .map(|e| notify(ClientEvent::Error(e.to_string()))),
        );

        let state = self.session.as_ref().map(Negotiator::signaling_state);
        if state.is_some() && state != self.last_signaling {
            self.last_signaling = state;
            if let Some(s) = state {
                fx.push(notify(ClientEvent::SignalingState(s)));
            }
        }
    }

    fn request_screen_share(&mut self, fx: &mut Vec<ParticipantEffect>) {
        if self.session.is_none() {
            fx.push(notify(ClientEvent::Error("no active call to share into".into())));
            return;
        }
        if self.screen.is_sharing() || self.display_requested {
            fx.push(notify(ClientEvent::Error(
                SubstitutionError::AlreadySharing.to_string(),
            )));
            return;
        }
        self.display_requested = true;
        fx.push(ParticipantEffect::RequestDisplayMedia);
    }

    fn on_display_media(
        &mut self,
        result: Result<MediaTrack, MediaAcquisitionError>,
        fx: &mut Vec<ParticipantEffect>,
    ) {
        self.display_requested = false;
        let track = match result {
            Ok(track) => track,
            Err(e) => {
                let e = SubstitutionError::from(e);
                sink_warn!(self.log, "{}", e);
                fx.push(notify(ClientEvent::Error(e.to_string())));
                return;
            }
        };

        let (Some(neg), Some(media)) = (self.session.as_mut(), self.media.as_mut()) else {
            sink_debug!(self.log, "screen track arrived after the call ended");
            track.stop();
            return;
        };
        match self.screen.start(neg, media, track.clone()) {
            Ok(out) => {
                fx.push(ParticipantEffect::WatchTrack(track));
                self.absorb(out, fx);
                fx.push(notify(ClientEvent::PreviewChanged(PreviewSource::Screen)));
            }
            Err(e) => fx.push(notify(ClientEvent::Error(e.to_string()))),
        }
    }

    fn stop_screen_share(&mut self, fx: &mut Vec<ParticipantEffect>) {
        let (Some(neg), Some(media)) = (self.session.as_mut(), self.media.as_mut()) else {
            fx.push(notify(ClientEvent::Error(
                SubstitutionError::NotSharing.to_string(),
            )));
            return;
        };
        let result = self.screen.stop(neg, media);
        self.after_restore(result, fx);
    }

    fn on_track_ended(&mut self, track_id: &str, fx: &mut Vec<ParticipantEffect>) {
        let (Some(neg), Some(media)) = (self.session.as_mut(), self.media.as_mut()) else {
            return;
        };
        match self.screen.on_track_ended(track_id, neg, media) {
            Some(result) => self.after_restore(result, fx),
            None => sink_debug!(self.log, "track {} ended; not shared", track_id),
        }
    }

    fn after_restore(
        &mut self,
        result: Result<NegotiationOutput, SubstitutionError>,
        fx: &mut Vec<ParticipantEffect>,
    ) {
        match result {
            Ok(out) => self.absorb(out, fx),
            Err(e) => fx.push(notify(ClientEvent::Error(e.to_string()))),
        }
        if let Some(media) = &self.media {
            fx.push(notify(ClientEvent::PreviewChanged(media.preview())));
        }
    }

    /// The other side left: close the session, keep camera and microphone
    /// for the next peer.
    fn end_call(&mut self, reason: &str, fx: &mut Vec<ParticipantEffect>) {
        sink_info!(self.log, "call ended: {}", reason);
        let was_sharing = self.screen.is_sharing();
        if let Some(media) = self.media.as_mut() {
            self.screen.abandon(media);
        }
        self.close_session();
        fx.push(notify(ClientEvent::CallEnded {
            reason: reason.to_string(),
        }));
        if was_sharing && let Some(media) = &self.media {
            fx.push(notify(ClientEvent::PreviewChanged(media.preview())));
        }
    }

    fn hang_up(&mut self, fx: &mut Vec<ParticipantEffect>) {
        sink_info!(self.log, "hanging up");
        self.teardown();
        if self.in_room {
            fx.push(ParticipantEffect::Send(SignalingMsg::Leave));
            self.in_room = false;
        }
        self.finished = true;
        fx.push(notify(ClientEvent::PreviewChanged(PreviewSource::None)));
        fx.push(notify(ClientEvent::CallEnded {
            reason: "hung up".into(),
        }));
    }

    /// Closes the session and stops every local track.
    fn teardown(&mut self) {
        if let Some(media) = self.media.as_mut() {
            self.screen.abandon(media);
            media.stop_all();
        }
        self.media = None;
        self.close_session();
    }

    fn close_session(&mut self) {
        if let Some(mut neg) = self.session.take() {
            neg.hangup();
            let stats = neg.stats();
            sink_debug!(
                self.log,
                "session stats: offers={} answers={} rollbacks={} collisions={}",
                stats.offers_sent,
                stats.answers_sent,
                stats.rollbacks,
                stats.collisions_dropped
            );
        }
        self.acquiring = None;
        self.display_requested = false;
        self.deferred.clear();
        self.last_signaling = None;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn in_room(&self) -> bool {
        self.in_room
    }

    pub fn member_count(&self) -> usize {
        self.member_count
    }

    pub fn session(&self) -> Option<&Negotiator> {
        self.session.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(Negotiator::role)
    }

    pub fn signaling_state(&self) -> Option<SignalingState> {
        self.session.as_ref().map(Negotiator::signaling_state)
    }

    pub fn media(&self) -> Option<&LocalMedia> {
        self.media.as_ref()
    }

    pub fn is_sharing(&self) -> bool {
        self.screen.is_sharing()
    }
}

fn notify(ev: ClientEvent) -> ParticipantEffect {
    ParticipantEffect::Notify(ev)
}

/// Tracks captured for a participant that already finished are stopped.
pub(crate) fn release_late_capture(input: ParticipantInput) {
    match input {
        ParticipantInput::UserMedia(Ok(stream)) => stream.stop(),
        ParticipantInput::DisplayMedia(Ok(track)) => track.stop(),
        _ => {}
    }
}
