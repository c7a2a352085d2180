use std::{fmt, io};

use crate::signaling::protocol::FrameError;

/// Errors from the participant side of the signaling connection.
///
/// Once connected, the only thing `send()` can reliably report is that the
/// client is disconnected (the writer thread has exited and dropped its
/// command receiver).
#[derive(Debug)]
pub enum SignalingClientError {
    Io(io::Error),
    Frame(FrameError),
    Disconnected,
}

impl fmt::Display for SignalingClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Frame(e) => write!(f, "{e}"),
            Self::Disconnected => write!(f, "signaling client disconnected"),
        }
    }
}

impl std::error::Error for SignalingClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Frame(e) => Some(e),
            Self::Disconnected => None,
        }
    }
}

impl From<io::Error> for SignalingClientError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FrameError> for SignalingClientError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}
