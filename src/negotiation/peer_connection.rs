use std::fmt;

use crate::media::track::{MediaTrack, TrackKind};
use crate::negotiation::rtc_configuration::RtcConfiguration;
use crate::negotiation::signaling_state::SignalingState;
use crate::signaling::protocol::{IceCandidate, SessionDescription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerConnectionError {
    Closed,
    InvalidState {
        op: &'static str,
        state: SignalingState,
    },
    InvalidDescription(String),
    NoRemoteDescription,
    NoSender(TrackKind),
    SenderExists(TrackKind),
    /// A track of one kind offered to a sender of the other.
    KindMismatch { sender: TrackKind, track: TrackKind },
    Unsupported(&'static str),
}

impl fmt::Display for PeerConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("peer connection closed"),
            Self::InvalidState { op, state } => write!(f, "{op} not allowed in state {state}"),
            Self::InvalidDescription(e) => write!(f, "invalid description: {e}"),
            Self::NoRemoteDescription => f.write_str("no remote description"),
            Self::NoSender(k) => write!(f, "no {k} sender"),
            Self::SenderExists(k) => write!(f, "{k} sender already attached"),
            Self::KindMismatch { sender, track } => {
                write!(f, "cannot put a {track} track on the {sender} sender")
            }
            Self::Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl std::error::Error for PeerConnectionError {}

/// The peer-connection capability the negotiator drives.
///
/// Mirrors the browser object: description calls move it through
/// [`SignalingState`]s and fail when issued out of order. Implementations
/// must not block; the driver calls them from the participant loop.
pub trait PeerConnection: Send {
    /// # Errors
    /// Closed, or an answer is pending.
    fn create_offer(&mut self) -> Result<SessionDescription, PeerConnectionError>;

    /// # Errors
    /// Closed, or no remote offer applied.
    fn create_answer(&mut self) -> Result<SessionDescription, PeerConnectionError>;

    /// # Errors
    /// The description does not fit the current state or does not parse.
    fn set_local_description(&mut self, desc: &SessionDescription) -> Result<(), PeerConnectionError>;

    /// # Errors
    /// The description does not fit the current state or does not parse.
    fn set_remote_description(&mut self, desc: &SessionDescription)
    -> Result<(), PeerConnectionError>;

    /// Drops any pending description. No-op when stable.
    ///
    /// # Errors
    /// Closed.
    fn rollback(&mut self) -> Result<(), PeerConnectionError>;

    /// # Errors
    /// No remote description yet, or the candidate does not parse.
    fn add_ice_candidate(&mut self, candidate: &IceCandidate) -> Result<(), PeerConnectionError>;

    /// Attaches a track on a new sender of its kind.
    ///
    /// # Errors
    /// Closed, or a sender of that kind already exists.
    fn add_track(&mut self, track: MediaTrack) -> Result<(), PeerConnectionError>;

    /// Swaps the track on the existing video sender.
    ///
    /// # Errors
    /// Closed, no video sender, or `track` is not video.
    fn replace_video_track(&mut self, track: MediaTrack) -> Result<(), PeerConnectionError>;

    fn video_sender_track(&self) -> Option<MediaTrack>;

    fn audio_sender_track(&self) -> Option<MediaTrack>;

    /// Local candidates gathered since the last call.
    fn drain_local_candidates(&mut self) -> Vec<IceCandidate>;

    fn signaling_state(&self) -> SignalingState;

    /// Releases the transport. Idempotent.
    fn close(&mut self);
}

/// Builds peer connections for new sessions.
pub trait PeerConnectionFactory: Send + Sync {
    /// # Errors
    /// The configuration cannot be honoured.
    fn create(&self, config: &RtcConfiguration)
    -> Result<Box<dyn PeerConnection>, PeerConnectionError>;
}
