use crate::media::track::{MediaTrack, TrackKind};

/// Tracks returned by one `get_user_media` call.
#[derive(Debug, Clone, Default)]
pub struct MediaStream {
    pub audio: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
}

impl MediaStream {
    pub fn tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.audio.iter().chain(self.video.iter())
    }

    pub fn stop(&self) {
        self.tracks().for_each(MediaTrack::stop);
    }
}

/// Which track the local preview shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    None,
    Camera,
    Screen,
}

/// Everything this participant captured, owned for the life of the call.
#[derive(Debug, Default)]
pub struct LocalMedia {
    camera: MediaStream,
    screen: Option<MediaTrack>,
}

impl LocalMedia {
    pub fn new(camera: MediaStream) -> Self {
        Self {
            camera,
            screen: None,
        }
    }

    pub fn camera_stream(&self) -> &MediaStream {
        &self.camera
    }

    pub fn camera_track(&self) -> Option<&MediaTrack> {
        self.camera.video.as_ref()
    }

    pub fn microphone_track(&self) -> Option<&MediaTrack> {
        self.camera.audio.as_ref()
    }

    pub fn screen_track(&self) -> Option<&MediaTrack> {
        self.screen.as_ref()
    }

    pub fn set_screen(&mut self, track: Option<MediaTrack>) {
        self.screen = track;
    }

    /// Removes the screen track, returning it.
    pub fn take_screen(&mut self) -> Option<MediaTrack> {
        self.screen.take()
    }

    pub fn preview(&self) -> PreviewSource {
        if self.screen.is_some() {
            PreviewSource::Screen
        } else if self.camera_track().is_some() {
            PreviewSource::Camera
        } else {
            PreviewSource::None
        }
    }

    /// Looks a track up by id across camera, microphone and screen.
    pub fn find(&self, track_id: &str) -> Option<&MediaTrack> {
        self.camera
            .tracks()
            .chain(self.screen.iter())
            .find(|t| t.id() == track_id)
    }

    pub fn track_of_kind(&self, kind: TrackKind) -> Option<&MediaTrack> {
        match kind {
            TrackKind::Audio => self.microphone_track(),
            TrackKind::Video => self.camera_track(),
        }
    }

    /// Stops camera, microphone and screen; the handles are released.
    pub fn stop_all(&mut self) {
        self.camera.stop();
        if let Some(screen) = self.screen.take() {
            screen.stop();
        }
        self.camera = MediaStream::default();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::media::track::TrackSource;

    fn camera_stream() -> MediaStream {
        MediaStream {
            audio: Some(MediaTrack::new(TrackKind::Audio, TrackSource::Microphone, "mic")),
            video: Some(MediaTrack::new(TrackKind::Video, TrackSource::Camera, "cam")),
        }
    }

    #[test]
    fn preview_follows_screen() {
        let mut media = LocalMedia::new(camera_stream());
        assert_eq!(media.preview(), PreviewSource::Camera);

        let screen = MediaTrack::new(TrackKind::Video, TrackSource::Screen, "screen");
        media.set_screen(Some(screen.clone()));
        assert_eq!(media.preview(), PreviewSource::Screen);
        assert_eq!(media.find(screen.id()), Some(&screen));

        media.take_screen();
        assert_eq!(media.preview(), PreviewSource::Camera);
    }

    #[test]
    fn stop_all_stops_every_track() {
        let stream = camera_stream();
        let screen = MediaTrack::new(TrackKind::Video, TrackSource::Screen, "screen");
        let mut media = LocalMedia::new(stream.clone());
        media.set_screen(Some(screen.clone()));

        media.stop_all();
        assert!(stream.tracks().all(|t| !t.is_live()));
        assert!(!screen.is_live());
        assert_eq!(media.preview(), PreviewSource::None);
    }
}
