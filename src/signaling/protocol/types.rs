use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// ---- Room id --------------------------------------------------------------

/// Opaque room identifier. Browsers send it as a string or a number; both
/// normalise to the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawRoomId")]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRoomId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawRoomId> for RoomId {
    fn from(raw: RawRoomId) -> Self {
        match raw {
            RawRoomId::Text(s) => Self(s),
            RawRoomId::Number(n) => Self(n.to_string()),
        }
    }
}

// ---- Session description --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Pranswer => "pranswer",
            Self::Rollback => "rollback",
        })
    }
}

/// `{type, sdp}` as produced by a browser peer connection. Fields the relay
/// does not know about ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    #[serde(default)]
    pub sdp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionDescription {
    pub fn new(sdp_type: SdpType, sdp: impl Into<String>) -> Self {
        Self {
            sdp_type,
            sdp: sdp.into(),
            extra: Map::new(),
        }
    }

    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Offer, sdp)
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Answer, sdp)
    }
}

// ---- ICE candidate --------------------------------------------------------

/// Candidate record, relayed verbatim and never parsed by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceCandidate {
    #[serde(default)]
    pub candidate: String,
    #[serde(rename = "sdpMLineIndex", default)]
    pub sdp_mline_index: Option<u16>,
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>, sdp_mline_index: u16, sdp_mid: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mline_index: Some(sdp_mline_index),
            sdp_mid: Some(sdp_mid.into()),
            extra: Map::new(),
        }
    }
}

// ---- Bodies of the control events -----------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JoinBody {
    pub eid: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JoinedBody {
    pub room: RoomId,
    pub member_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MemberCountBody {
    pub member_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NonceBody {
    #[serde(default)]
    pub nonce: u64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn room_id_accepts_string_or_number() {
        let a: RoomId = serde_json::from_value(json!("42")).unwrap();
        let b: RoomId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(&b).unwrap(), json!("42"));
        assert!(serde_json::from_value::<RoomId>(json!({"id": 1})).is_err());
    }

    #[test]
    fn candidate_keeps_unknown_fields() {
        let raw = json!({
            "candidate": "candidate:1 1 udp 2122260223 192.168.1.4 54321 typ host",
            "sdpMLineIndex": 0,
            "sdpMid": "0",
            "usernameFragment": "abcd"
        });
        let cand: IceCandidate = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cand.sdp_mline_index, Some(0));
        assert_eq!(cand.sdp_mid.as_deref(), Some("0"));
        assert_eq!(serde_json::to_value(&cand).unwrap(), raw);
    }

    #[test]
    fn description_type_is_checked_by_serde() {
        let d: SessionDescription =
            serde_json::from_value(json!({"type": "answer", "sdp": "v=0\r\n"})).unwrap();
        assert_eq!(d.sdp_type, SdpType::Answer);
        assert!(serde_json::from_value::<SessionDescription>(json!({"type": "bogus"})).is_err());
    }
}
