use std::{fmt, io};

/// Protocol-level errors: a frame arrived but its contents are unusable.
#[derive(Debug)]
pub enum ProtoError {
    UnknownType(u8),
    BadVersion(u8),
    TooLarge { max: usize, actual: usize },
    InvalidUtf8,
    Json(String),
    InvalidFormat(&'static str),
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(t) => write!(f, "unknown event type 0x{t:02x}"),
            Self::BadVersion(v) => write!(f, "unsupported protocol version {v}"),
            Self::TooLarge { max, actual } => {
                write!(f, "frame body of {actual} bytes exceeds limit of {max}")
            }
            Self::InvalidUtf8 => f.write_str("body is not valid UTF-8"),
            Self::Json(e) => write!(f, "invalid JSON body: {e}"),
            Self::InvalidFormat(what) => write!(f, "invalid body: {what}"),
        }
    }
}

impl std::error::Error for ProtoError {}

impl From<serde_json::Error> for ProtoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Frame-level error wrapper: IO vs protocol.
#[derive(Debug)]
pub enum FrameError {
    Io(io::Error),
    Proto(ProtoError),
}

impl FrameError {
    /// True when the whole frame was consumed and the stream is still in sync,
    /// so the connection can keep going after reporting the error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => false,
            Self::Proto(p) => !matches!(p, ProtoError::BadVersion(_) | ProtoError::TooLarge { .. }),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Proto(e) => write!(f, "protocol error: {e}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Proto(e) => Some(e),
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ProtoError> for FrameError {
    fn from(e: ProtoError) -> Self {
        Self::Proto(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_errors_are_recoverable_header_errors_are_not() {
        assert!(FrameError::from(ProtoError::UnknownType(0x99)).is_recoverable());
        assert!(FrameError::from(ProtoError::Json("eof".into())).is_recoverable());
        assert!(!FrameError::from(ProtoError::BadVersion(7)).is_recoverable());
        assert!(!FrameError::from(ProtoError::TooLarge { max: 1, actual: 2 }).is_recoverable());
        let io = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(!FrameError::from(io).is_recoverable());
    }
}
