use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::media::local_media::MediaStream;
use crate::media::media_devices::{MediaAcquisitionError, MediaConstraints, MediaDevices};
use crate::media::track::{MediaTrack, TrackKind, TrackSource};

/// Device provider that fabricates tracks instead of opening hardware.
///
/// Used by `peer_probe` and the tests. Permission can be revoked per capture
/// kind, and the "stop sharing" button is simulated with
/// [`end_screen_share`](Self::end_screen_share).
#[derive(Debug, Default)]
pub struct SyntheticDevices {
    deny_user_media: AtomicBool,
    deny_display_media: AtomicBool,
    issued: Mutex<Vec<MediaTrack>>,
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_deny_user_media(&self, deny: bool) {
        self.deny_user_media.store(deny, Ordering::SeqCst);
    }

    pub fn set_deny_display_media(&self, deny: bool) {
        self.deny_display_media.store(deny, Ordering::SeqCst);
    }

    /// Every track handed out so far, live or not.
    pub fn issued_tracks(&self) -> Vec<MediaTrack> {
        self.issued.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn live_tracks(&self) -> Vec<MediaTrack> {
        self.issued_tracks()
            .into_iter()
            .filter(MediaTrack::is_live)
            .collect()
    }

    /// Ends every live screen track from the source side. Returns how many.
    pub fn end_screen_share(&self) -> usize {
        let screens: Vec<_> = self
            .live_tracks()
            .into_iter()
            .filter(|t| t.source() == TrackSource::Screen)
            .collect();
        for t in &screens {
            t.end_from_source();
        }
        screens.len()
    }

    fn issue(&self, track: MediaTrack) -> MediaTrack {
        if let Ok(mut g) = self.issued.lock() {
            g.push(track.clone());
        }
        track
    }
}

impl MediaDevices for SyntheticDevices {
    fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaAcquisitionError> {
        if self.deny_user_media.load(Ordering::SeqCst) {
            return Err(MediaAcquisitionError::PermissionDenied);
        }
        if !constraints.audio && !constraints.video {
            return Err(MediaAcquisitionError::DeviceUnavailable(
                "no media kind requested".into(),
            ));
        }

        let audio = constraints.audio.then(|| {
            self.issue(MediaTrack::new(
                TrackKind::Audio,
                TrackSource::Microphone,
                "synthetic microphone",
            ))
        });
        let video = constraints.video.then(|| {
            self.issue(MediaTrack::new(
                TrackKind::Video,
                TrackSource::Camera,
                "synthetic camera",
            ))
        });
        Ok(MediaStream { audio, video })
    }

    fn get_display_media(&self) -> Result<MediaTrack, MediaAcquisitionError> {
        if self.deny_display_media.load(Ordering::SeqCst) {
            return Err(MediaAcquisitionError::PermissionDenied);
        }
        Ok(self.issue(MediaTrack::new(
            TrackKind::Video,
            TrackSource::Screen,
            "synthetic screen",
        )))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn issues_requested_kinds_only() {
        let dev = SyntheticDevices::new();
        let stream = dev
            .get_user_media(&MediaConstraints {
                audio: false,
                video: true,
            })
            .unwrap();
        assert!(stream.audio.is_none());
        assert_eq!(stream.video.as_ref().map(MediaTrack::kind), Some(TrackKind::Video));
        assert_eq!(dev.issued_tracks().len(), 1);
    }

    #[test]
    fn denial_is_reported() {
        let dev = SyntheticDevices::new();
        dev.set_deny_display_media(true);
        assert_eq!(
            dev.get_display_media().unwrap_err(),
            MediaAcquisitionError::PermissionDenied
        );
        dev.set_deny_user_media(true);
        assert!(dev.get_user_media(&MediaConstraints::default()).is_err());
        assert!(dev.issued_tracks().is_empty());
    }

    #[test]
    fn end_screen_share_only_touches_screen_tracks() {
        let dev = SyntheticDevices::new();
        let cam = dev.get_user_media(&MediaConstraints::default()).unwrap();
        let screen = dev.get_display_media().unwrap();

        assert_eq!(dev.end_screen_share(), 1);
        assert!(!screen.is_live());
        assert!(cam.tracks().all(MediaTrack::is_live));
        assert_eq!(dev.end_screen_share(), 0);
    }
}
