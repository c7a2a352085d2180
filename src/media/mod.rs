//! Local capture: tracks, the injected device capability, and the
//! camera/screen substitution on the outbound video sender.
pub mod local_media;
pub mod media_devices;
pub mod screen_share;
pub mod synthetic_devices;
pub mod track;

pub use local_media::{LocalMedia, MediaStream, PreviewSource};
pub use media_devices::{MediaAcquisitionError, MediaConstraints, MediaDevices};
pub use screen_share::{ScreenShareController, SubstitutionError};
pub use synthetic_devices::SyntheticDevices;
pub use track::{MediaTrack, TrackKind, TrackSource};
