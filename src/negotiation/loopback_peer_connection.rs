//! Headless peer connection.
//!
//! Produces real-looking SDP text and a host candidate, and enforces the
//! browser's signaling-state rules, but never opens a socket. Lets the whole
//! negotiation run in tests and in `peer_probe` without devices or network.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::media::track::{MediaTrack, TrackKind};
use crate::negotiation::peer_connection::{
    PeerConnection, PeerConnectionError, PeerConnectionFactory,
};
use crate::negotiation::rtc_configuration::RtcConfiguration;
use crate::negotiation::signaling_state::SignalingState;
use crate::signaling::protocol::{IceCandidate, SdpType, SessionDescription};

const DEFAULT_PORT: u16 = 9;
const DEFAULT_PROTO: &str = "UDP/TLS/RTP/SAVPF";
const DEFAULT_CONN_ADDR: &str = "0.0.0.0";
const HOST_ADDR: &str = "127.0.0.1";
const OPUS_RTPMAP: &str = "111 opus/48000/2";
const VP8_RTPMAP: &str = "96 VP8/90000";
const MSID_STREAM: &str = "tutorlink";

/// What a test can see of a loopback connection after it was boxed.
#[derive(Debug, Default, Clone)]
pub struct LoopbackSnapshot {
    pub remote_candidates: Vec<IceCandidate>,
    pub closed: bool,
    pub rollbacks: u32,
}

/// Shared view onto one [`LoopbackPeerConnection`].
#[derive(Debug, Default, Clone)]
pub struct LoopbackObserver {
    inner: Arc<Mutex<LoopbackSnapshot>>,
}

impl LoopbackObserver {
    pub fn snapshot(&self) -> LoopbackSnapshot {
        self.inner.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut LoopbackSnapshot)) {
        if let Ok(mut g) = self.inner.lock() {
            f(&mut g);
        }
    }
}

pub struct LoopbackPeerConnection {
    state: SignalingState,
    session_id: u64,
    version: u64,
    ufrag: String,
    pwd: String,
    port: u16,
    audio_sender: Option<MediaTrack>,
    video_sender: Option<MediaTrack>,
    current_local: Option<SessionDescription>,
    current_remote: Option<SessionDescription>,
    pending_local: Option<SessionDescription>,
    pending_remote: Option<SessionDescription>,
    gathered: bool,
    local_candidates: Vec<IceCandidate>,
    observer: LoopbackObserver,
}

impl Default for LoopbackPeerConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackPeerConnection {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            state: SignalingState::Idle,
            session_id: rng.gen_range(1_000_000_000..u64::from(u32::MAX)),
            version: 1,
            ufrag: random_token(&mut rng, 8),
            pwd: random_token(&mut rng, 24),
            port: rng.gen_range(49_152..65_535),
            audio_sender: None,
            video_sender: None,
            current_local: None,
            current_remote: None,
            pending_local: None,
            pending_remote: None,
            gathered: false,
            local_candidates: Vec::new(),
            observer: LoopbackObserver::default(),
        }
    }

    pub fn observer(&self) -> LoopbackObserver {
        self.observer.clone()
    }

    fn ensure_open(&self) -> Result<(), PeerConnectionError> {
        if self.state == SignalingState::Closed {
            Err(PeerConnectionError::Closed)
        } else {
            Ok(())
        }
    }

    fn invalid(&self, op: &'static str) -> PeerConnectionError {
        PeerConnectionError::InvalidState {
            op,
            state: self.state,
        }
    }

    /// Stable state to land in when nothing is pending.
    fn settled_state(&self) -> SignalingState {
        if self.current_local.is_some() || self.current_remote.is_some() {
            SignalingState::Stable
        } else {
            SignalingState::Idle
        }
    }

    fn sender_for(&self, kind: TrackKind) -> Option<&MediaTrack> {
        match kind {
            TrackKind::Audio => self.audio_sender.as_ref(),
            TrackKind::Video => self.video_sender.as_ref(),
        }
    }

    /// m-line kinds for a new offer: everything already negotiated plus every
    /// attached sender, audio first.
    fn offer_kinds(&self) -> Vec<TrackKind> {
        let negotiated = self
            .current_remote
            .as_ref()
            .map(|d| media_kinds(&d.sdp))
            .unwrap_or_default();
        [TrackKind::Audio, TrackKind::Video]
            .into_iter()
            .filter(|k| negotiated.contains(k) || self.sender_for(*k).is_some())
            .collect()
    }

    fn render(&mut self, kinds: &[TrackKind], setup: &str) -> String {
        self.version += 1;
        let mids: Vec<String> = (0..kinds.len()).map(|i| i.to_string()).collect();

        let mut sdp = String::new();
        let _ = write!(
            sdp,
            "v=0\r\no=- {} {} IN IP4 {HOST_ADDR}\r\ns=-\r\nt=0 0\r\n",
            self.session_id, self.version
        );
        if !mids.is_empty() {
            let _ = write!(sdp, "a=group:BUNDLE {}\r\n", mids.join(" "));
        }
        let _ = write!(sdp, "a=msid-semantic: WMS {MSID_STREAM}\r\n");

        for (mid, kind) in kinds.iter().enumerate() {
            let (media, rtpmap) = match kind {
                TrackKind::Audio => ("audio", OPUS_RTPMAP),
                TrackKind::Video => ("video", VP8_RTPMAP),
            };
            let pt = rtpmap.split(' ').next().unwrap_or_default();
            let _ = write!(
                sdp,
                "m={media} {DEFAULT_PORT} {DEFAULT_PROTO} {pt}\r\n\
                 c=IN IP4 {DEFAULT_CONN_ADDR}\r\n\
                 a=mid:{mid}\r\n\
                 a=ice-ufrag:{}\r\n\
                 a=ice-pwd:{}\r\n\
                 a=setup:{setup}\r\n\
                 a=rtcp-mux\r\n\
                 a=rtpmap:{rtpmap}\r\n",
                self.ufrag, self.pwd
            );
            match self.sender_for(*kind) {
                Some(track) => {
                    let _ = write!(sdp, "a=sendrecv\r\na=msid:{MSID_STREAM} {}\r\n", track.id());
                }
                None => sdp.push_str("a=recvonly\r\n"),
            }
        }
        sdp
    }

    fn gather(&mut self) {
        if self.gathered {
            return;
        }
        self.gathered = true;
        self.local_candidates.push(IceCandidate::new(
            format!(
                "candidate:1 1 udp 2122260223 {HOST_ADDR} {} typ host",
                self.port
            ),
            0,
            "0",
        ));
    }
}

impl PeerConnection for LoopbackPeerConnection {
    fn create_offer(&mut self) -> Result<SessionDescription, PeerConnectionError> {
        self.ensure_open()?;
        if self.state == SignalingState::HaveRemoteOffer {
            return Err(self.invalid("create-offer"));
        }
        let kinds = self.offer_kinds();
        Ok(SessionDescription::offer(self.render(&kinds, "actpass")))
    }

    fn create_answer(&mut self) -> Result<SessionDescription, PeerConnectionError> {
        self.ensure_open()?;
        let Some(offer) = self.pending_remote.as_ref() else {
            return Err(self.invalid("create-answer"));
        };
        let kinds = media_kinds(&offer.sdp);
        Ok(SessionDescription::answer(self.render(&kinds, "active")))
    }

    fn set_local_description(&mut self, desc: &SessionDescription) -> Result<(), PeerConnectionError> {
        self.ensure_open()?;
        check_sdp(desc)?;
        match (desc.sdp_type, self.state) {
            (SdpType::Offer, s) if s.is_stable() || s == SignalingState::HaveLocalOffer => {
                self.pending_local = Some(desc.clone());
                self.state = SignalingState::HaveLocalOffer;
            }
            (SdpType::Answer, SignalingState::HaveRemoteOffer) => {
                self.current_local = Some(desc.clone());
                self.current_remote = self.pending_remote.take();
                self.state = SignalingState::Stable;
            }
            _ => return Err(self.invalid("set-local-description")),
        }
        self.gather();
        Ok(())
    }

    fn set_remote_description(
        &mut self,
        desc: &SessionDescription,
    ) -> Result<(), PeerConnectionError> {
        self.ensure_open()?;
        check_sdp(desc)?;
        match (desc.sdp_type, self.state) {
            (SdpType::Offer, s) if s.is_stable() || s == SignalingState::HaveRemoteOffer => {
                self.pending_remote = Some(desc.clone());
                self.state = SignalingState::HaveRemoteOffer;
            }
            (SdpType::Answer, SignalingState::HaveLocalOffer) => {
                self.current_remote = Some(desc.clone());
                self.current_local = self.pending_local.take();
                self.state = SignalingState::Stable;
            }
            _ => return Err(self.invalid("set-remote-description")),
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PeerConnectionError> {
        self.ensure_open()?;
        if self.state.is_stable() {
            return Ok(());
        }
        self.pending_local = None;
        self.pending_remote = None;
        self.state = self.settled_state();
        self.observer.update(|s| s.rollbacks += 1);
        Ok(())
    }

    fn add_ice_candidate(&mut self, candidate: &IceCandidate) -> Result<(), PeerConnectionError> {
        self.ensure_open()?;
        if self.current_remote.is_none() && self.pending_remote.is_none() {
            return Err(PeerConnectionError::NoRemoteDescription);
        }
        // An empty candidate marks end-of-candidates.
        if !candidate.candidate.is_empty() && !candidate.candidate.starts_with("candidate:") {
            return Err(PeerConnectionError::InvalidDescription(
                "malformed ice candidate".into(),
            ));
        }
        let c = candidate.clone();
        self.observer.update(move |s| s.remote_candidates.push(c));
        Ok(())
    }

    fn add_track(&mut self, track: MediaTrack) -> Result<(), PeerConnectionError> {
        self.ensure_open()?;
        let kind = track.kind();
        let slot = match kind {
            TrackKind::Audio => &mut self.audio_sender,
            TrackKind::Video => &mut self.video_sender,
        };
        if slot.is_some() {
            return Err(PeerConnectionError::SenderExists(kind));
        }
        *slot = Some(track);
        Ok(())
    }

    fn replace_video_track(&mut self, track: MediaTrack) -> Result<(), PeerConnectionError> {
        self.ensure_open()?;
        if track.kind() != TrackKind::Video {
            return Err(PeerConnectionError::KindMismatch {
                sender: TrackKind::Video,
                track: track.kind(),
            });
        }
        match self.video_sender.as_mut() {
            Some(slot) => {
                *slot = track;
                Ok(())
            }
            None => Err(PeerConnectionError::NoSender(TrackKind::Video)),
        }
    }

    fn video_sender_track(&self) -> Option<MediaTrack> {
        self.video_sender.clone()
    }

    fn audio_sender_track(&self) -> Option<MediaTrack> {
        self.audio_sender.clone()
    }

    fn drain_local_candidates(&mut self) -> Vec<IceCandidate> {
        std::mem::take(&mut self.local_candidates)
    }

    fn signaling_state(&self) -> SignalingState {
        self.state
    }

    fn close(&mut self) {
        if self.state == SignalingState::Closed {
            return;
        }
        self.state = SignalingState::Closed;
        self.audio_sender = None;
        self.video_sender = None;
        self.local_candidates.clear();
        self.observer.update(|s| s.closed = true);
    }
}

/// Factory for [`LoopbackPeerConnection`]s. Keeps an observer of every
/// connection it built, newest last.
#[derive(Debug, Default)]
pub struct LoopbackFactory {
    observers: Mutex<Vec<LoopbackObserver>>,
}

impl LoopbackFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observers(&self) -> Vec<LoopbackObserver> {
        self.observers.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl PeerConnectionFactory for LoopbackFactory {
    fn create(
        &self,
        _config: &RtcConfiguration,
    ) -> Result<Box<dyn PeerConnection>, PeerConnectionError> {
        let pc = LoopbackPeerConnection::new();
        if let Ok(mut g) = self.observers.lock() {
            g.push(pc.observer());
        }
        Ok(Box::new(pc))
    }
}

fn random_token(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn check_sdp(desc: &SessionDescription) -> Result<(), PeerConnectionError> {
    if desc.sdp.starts_with("v=0") {
        Ok(())
    } else {
        Err(PeerConnectionError::InvalidDescription(format!(
            "{} does not start with v=0",
            desc.sdp_type
        )))
    }
}

/// Media kinds of the m-lines in `sdp`, in order.
fn media_kinds(sdp: &str) -> Vec<TrackKind> {
    sdp.lines()
        .filter_map(|l| {
            if l.starts_with("m=audio") {
                Some(TrackKind::Audio)
            } else if l.starts_with("m=video") {
                Some(TrackKind::Video)
            } else {
                None
            }
        })
        .collect()
}
