use std::fmt;

use crate::media::PreviewSource;
use crate::negotiation::{Role, SignalingState};

/// What the participant tells its UI (or the probe's stdout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Status(String),
    MemberCount(usize),
    RoleAssigned(Role),
    SignalingState(SignalingState),
    PreviewChanged(PreviewSource),
    /// A surfaced failure; the call, if any, keeps running.
    Error(String),
    CallEnded { reason: String },
    Disconnected { reason: String },
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(s) => write!(f, "status: {s}"),
            Self::MemberCount(n) => write!(f, "participants: {n}/2"),
            Self::RoleAssigned(r) => write!(f, "role: {r}"),
            Self::SignalingState(s) => write!(f, "signaling: {s}"),
            Self::PreviewChanged(p) => write!(f, "preview: {p:?}"),
            Self::Error(e) => write!(f, "error: {e}"),
            Self::CallEnded { reason } => write!(f, "call ended: {reason}"),
            Self::Disconnected { reason } => write!(f, "disconnected: {reason}"),
        }
    }
}
