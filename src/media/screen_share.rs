use std::fmt;
use std::sync::Arc;

use crate::log::LogSink;
use crate::media::local_media::LocalMedia;
use crate::media::media_devices::MediaAcquisitionError;
use crate::media::track::{MediaTrack, TrackKind};
use crate::negotiation::{NegotiationOutput, Negotiator, PeerConnectionError};
use crate::{sink_info, sink_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    AlreadySharing,
    NotSharing,
    NoVideoSender,
    NotVideo,
    Replace(PeerConnectionError),
    Acquisition(MediaAcquisitionError),
}

impl fmt::Display for SubstitutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySharing => f.write_str("screen share already active"),
            Self::NotSharing => f.write_str("no screen share active"),
            Self::NoVideoSender => f.write_str("no outbound video sender"),
            Self::NotVideo => f.write_str("screen capture returned a non-video track"),
            Self::Replace(e) => write!(f, "replacing video track failed: {e}"),
            Self::Acquisition(e) => write!(f, "screen capture failed: {e}"),
        }
    }
}

impl std::error::Error for SubstitutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Replace(e) => Some(e),
            Self::Acquisition(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MediaAcquisitionError> for SubstitutionError {
    fn from(e: MediaAcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

/// Swaps the single outbound video sender between camera and screen.
///
/// The audio sender is never touched. Every successful swap re-enters
/// negotiation once. A failed start leaves the camera attached and stops the
/// screen track it was handed.
pub struct ScreenShareController {
    sharing: Option<MediaTrack>,
    log: Arc<dyn LogSink>,
}

impl ScreenShareController {
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self { sharing: None, log }
    }

    pub fn is_sharing(&self) -> bool {
        self.sharing.is_some()
    }

    pub fn screen_track(&self) -> Option<&MediaTrack> {
        self.sharing.as_ref()
    }

    /// Puts `screen` on the video sender and renegotiates.
    ///
    /// # Errors
    /// Already sharing, no video sender, or the peer connection refused the
    /// track. `screen` is stopped in every error case.
    pub fn start(
        &mut self,
        negotiator: &mut Negotiator,
        media: &mut LocalMedia,
        screen: MediaTrack,
    ) -> Result<NegotiationOutput, SubstitutionError> {
        let result = self.attach(negotiator, &screen);
        if let Err(e) = result {
            sink_warn!(self.log, "screen share not started: {}", e);
            screen.stop();
            return Err(e);
        }

        sink_info!(self.log, "screen share started ({})", screen.id());
        media.set_screen(Some(screen.clone()));
        self.sharing = Some(screen);
        Ok(negotiator.negotiation_needed())
    }

    fn attach(&self, negotiator: &mut Negotiator, screen: &MediaTrack) -> Result<(), SubstitutionError> {
        if self.is_sharing() {
            return Err(SubstitutionError::AlreadySharing);
        }
        if screen.kind() != TrackKind::Video {
            return Err(SubstitutionError::NotVideo);
        }
        if negotiator.video_sender_track().is_none() {
            return Err(SubstitutionError::NoVideoSender);
        }
        negotiator
            .replace_video_track(screen.clone())
            .map_err(SubstitutionError::Replace)
    }

    /// Puts the camera back on the video sender, stops the screen track and
    /// renegotiates.
    ///
    /// # Errors
    /// Not sharing, or the camera could not be reattached. The screen track
    /// is released either way.
    pub fn stop(
        &mut self,
        negotiator: &mut Negotiator,
        media: &mut LocalMedia,
    ) -> Result<NegotiationOutput, SubstitutionError> {
        let Some(screen) = self.sharing.take() else {
            return Err(SubstitutionError::NotSharing);
        };
        media.take_screen();
        screen.stop();

        let camera = media
            .camera_track()
            .cloned()
            .ok_or(SubstitutionError::NoVideoSender)?;
        negotiator
            .replace_video_track(camera)
            .map_err(SubstitutionError::Replace)?;

        sink_info!(self.log, "screen share stopped; camera restored");
        Ok(negotiator.negotiation_needed())
    }

    /// Reacts to a track ended by its source. `None` when `track_id` is not
    /// the active screen track.
    pub fn on_track_ended(
        &mut self,
        track_id: &str,
        negotiator: &mut Negotiator,
        media: &mut LocalMedia,
    ) -> Option<Result<NegotiationOutput, SubstitutionError>> {
        if self.sharing.as_ref().map(MediaTrack::id) != Some(track_id) {
            return None;
        }
        sink_info!(self.log, "screen track ended by its source");
        Some(self.stop(negotiator, media))
    }

    /// Drops the share without touching the peer connection (hangup path).
    pub fn abandon(&mut self, media: &mut LocalMedia) {
        if let Some(screen) = self.sharing.take() {
            screen.stop();
        }
        media.take_screen();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::media::local_media::{MediaStream, PreviewSource};
    use crate::media::track::TrackSource;
    use crate::negotiation::{LoopbackPeerConnection, Role};
    use crate::signaling::protocol::SignalingMsg;

    struct Fixture {
        neg: Negotiator,
        media: LocalMedia,
        ctl: ScreenShareController,
        camera: MediaTrack,
        mic: MediaTrack,
    }

    fn fixture() -> Fixture {
        let log: Arc<dyn LogSink> = Arc::new(NoopLogSink);
        let mic = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone, "mic");
        let camera = MediaTrack::new(TrackKind::Video, TrackSource::Camera, "cam");
        let mut neg = Negotiator::new(
            Role::OfferCreator,
            Box::new(LoopbackPeerConnection::new()),
            Arc::clone(&log),
        );
        neg.add_track(mic.clone()).unwrap();
        neg.add_track(camera.clone()).unwrap();
        let media = LocalMedia::new(MediaStream {
            audio: Some(mic.clone()),
            video: Some(camera.clone()),
        });
        Fixture {
            neg,
            media,
            ctl: ScreenShareController::new(log),
            camera,
            mic,
        }
    }

    fn screen() -> MediaTrack {
        MediaTrack::new(TrackKind::Video, TrackSource::Screen, "screen")
    }

    #[test]
    fn start_swaps_video_and_offers() {
        let mut f = fixture();
        let s = screen();
        let out = f.ctl.start(&mut f.neg, &mut f.media, s.clone()).unwrap();

        assert!(matches!(out.outgoing[0], SignalingMsg::Offer(_)));
        assert_eq!(f.neg.video_sender_track(), Some(s));
        assert_eq!(f.neg.audio_sender_track(), Some(f.mic.clone()));
        assert_eq!(f.media.preview(), PreviewSource::Screen);
        assert!(f.ctl.is_sharing());
    }

    #[test]
    fn second_start_is_rejected_and_surplus_track_stopped() {
        let mut f = fixture();
        f.ctl.start(&mut f.neg, &mut f.media, screen()).unwrap();
        let extra = screen();
        let err = f.ctl.start(&mut f.neg, &mut f.media, extra.clone()).unwrap_err();
        assert_eq!(err, SubstitutionError::AlreadySharing);
        assert!(!extra.is_live());
    }

    #[test]
    fn source_end_restores_camera() {
        let mut f = fixture();
        let s = screen();
        f.ctl.start(&mut f.neg, &mut f.media, s.clone()).unwrap();

        assert!(f.ctl.on_track_ended("other", &mut f.neg, &mut f.media).is_none());
        let out = f
            .ctl
            .on_track_ended(s.id(), &mut f.neg, &mut f.media)
            .unwrap()
            .unwrap();
        // Still waiting on the first answer, so the re-offer is deferred.
        assert!(out.outgoing.is_empty());
        assert!(f.neg.state().renegotiation_pending());

        assert_eq!(f.neg.video_sender_track(), Some(f.camera.clone()));
        assert_eq!(f.media.preview(), PreviewSource::Camera);
        assert!(!s.is_live());
        assert!(!f.ctl.is_sharing());
    }

    #[test]
    fn failure_leaves_camera_attached() {
        let mut f = fixture();
        f.neg.hangup();
        let s = screen();
        let err = f.ctl.start(&mut f.neg, &mut f.media, s.clone()).unwrap_err();
        assert!(matches!(err, SubstitutionError::NoVideoSender));
        assert!(!s.is_live());
        assert!(!f.ctl.is_sharing());
        assert_eq!(f.media.preview(), PreviewSource::Camera);
    }

    #[test]
    fn stop_without_share_is_an_error() {
        let mut f = fixture();
        assert_eq!(
            f.ctl.stop(&mut f.neg, &mut f.media).unwrap_err(),
            SubstitutionError::NotSharing
        );
    }
}
