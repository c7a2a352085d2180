use std::fmt;

use crate::media::local_media::MediaStream;
use crate::media::track::MediaTrack;

/// What `get_user_media` should capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaAcquisitionError {
    PermissionDenied,
    DeviceUnavailable(String),
    /// The user dismissed the picker.
    Cancelled,
}

impl fmt::Display for MediaAcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::DeviceUnavailable(what) => write!(f, "device unavailable: {what}"),
            Self::Cancelled => f.write_str("capture cancelled"),
        }
    }
}

impl std::error::Error for MediaAcquisitionError {}

/// Capture capability injected into the participant.
///
/// Calls may block on a permission prompt, so the client runtime invokes
/// them from a worker thread.
pub trait MediaDevices: Send + Sync {
    /// Camera and/or microphone.
    ///
    /// # Errors
    /// Permission denied or no matching device.
    fn get_user_media(&self, constraints: &MediaConstraints)
    -> Result<MediaStream, MediaAcquisitionError>;

    /// A single screen-capture video track.
    ///
    /// # Errors
    /// Permission denied, picker cancelled, or capture unavailable.
    fn get_display_media(&self) -> Result<MediaTrack, MediaAcquisitionError>;
}
