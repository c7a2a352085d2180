use serde::{Serialize, de::DeserializeOwned};

use super::{
    MsgType, ProtoError, SignalingMsg,
    types::{ErrorBody, JoinBody, JoinedBody, MemberCountBody, NonceBody, SdpType, SessionDescription},
};

// ---- Encode to body bytes -------------------------------------------------

pub fn encode_msg(msg: &SignalingMsg) -> Result<(MsgType, Vec<u8>), ProtoError> {
    use SignalingMsg::*;

    let body = match msg {
        Join { room, token } => to_body(&JoinBody {
            eid: room.clone(),
            token: token.clone(),
        })?,
        Leave | PeerReady => b"{}".to_vec(),
        Joined { room, member_count } => to_body(&JoinedBody {
            room: room.clone(),
            member_count: *member_count,
        })?,
        UserJoined { member_count } | UserLeft { member_count } => to_body(&MemberCountBody {
            member_count: *member_count,
        })?,
        Offer(desc) => {
            expect_sdp_type(desc, SdpType::Offer)?;
            to_body(desc)?
        }
        Answer(desc) => {
            expect_sdp_type(desc, SdpType::Answer)?;
            to_body(desc)?
        }
        IceCandidate(cand) => to_body(cand)?,
        Error { message } => to_body(&ErrorBody {
            message: message.clone(),
        })?,
        Ping { nonce } | Pong { nonce } => to_body(&NonceBody { nonce: *nonce })?,
    };

    Ok((msg.msg_type(), body))
}

// ---- Decode from body bytes ----------------------------------------------

pub fn decode_msg(msg_type: MsgType, body: &[u8]) -> Result<SignalingMsg, ProtoError> {
    use SignalingMsg::*;

    let msg = match msg_type {
        MsgType::Join => {
            let b: JoinBody = from_body(body)?;
            if b.eid.is_empty() {
                return Err(ProtoError::InvalidFormat("join needs a non-empty eid"));
            }
            Join {
                room: b.eid,
                token: b.token.filter(|t| !t.is_empty()),
            }
        }
        MsgType::Leave => {
            expect_object_or_empty(body)?;
            Leave
        }
        MsgType::PeerReady => {
            expect_object_or_empty(body)?;
            PeerReady
        }
        MsgType::Joined => {
            let b: JoinedBody = from_body(body)?;
            Joined {
                room: b.room,
                member_count: b.member_count,
            }
        }
        MsgType::UserJoined => {
            let b: MemberCountBody = from_body(body)?;
            UserJoined {
                member_count: b.member_count,
            }
        }
        MsgType::UserLeft => {
            let b: MemberCountBody = from_body(body)?;
            UserLeft {
                member_count: b.member_count,
            }
        }
        MsgType::Offer => {
            let d: SessionDescription = from_body(body)?;
            expect_sdp_type(&d, SdpType::Offer)?;
            Offer(d)
        }
        MsgType::Answer => {
            let d: SessionDescription = from_body(body)?;
            expect_sdp_type(&d, SdpType::Answer)?;
            Answer(d)
        }
        MsgType::IceCandidate => IceCandidate(from_body(body)?),
        MsgType::Error => {
            let b: ErrorBody = from_body(body)?;
            Error { message: b.message }
        }
        MsgType::Ping => Ping {
            nonce: from_body::<NonceBody>(body)?.nonce,
        },
        MsgType::Pong => Pong {
            nonce: from_body::<NonceBody>(body)?.nonce,
        },
    };

    Ok(msg)
}

// ---- Helpers -------------------------------------------------------------

fn to_body<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtoError> {
    Ok(serde_json::to_vec(value)?)
}

fn from_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProtoError> {
    let text = std::str::from_utf8(body).map_err(|_| ProtoError::InvalidUtf8)?;
    Ok(serde_json::from_str(text)?)
}

/// Bodiless events accept an empty body or any JSON object.
fn expect_object_or_empty(body: &[u8]) -> Result<(), ProtoError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    from_body::<serde_json::Map<String, serde_json::Value>>(body).map(|_| ())
}

fn expect_sdp_type(desc: &SessionDescription, want: SdpType) -> Result<(), ProtoError> {
    if desc.sdp_type == want {
        Ok(())
    } else {
        Err(ProtoError::InvalidFormat("description type does not match event"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::types::{IceCandidate, RoomId};
    use serde_json::{Value, json};

    fn body_json(msg: &SignalingMsg) -> Value {
        let (_, body) = encode_msg(msg).unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn join_body_uses_eid_and_accepts_numeric_room() {
        let msg = decode_msg(MsgType::Join, br#"{"eid": 42}"#).unwrap();
        assert_eq!(
            msg,
            SignalingMsg::Join {
                room: RoomId::from("42"),
                token: None
            }
        );
        assert_eq!(body_json(&msg), json!({"eid": "42"}));
    }

    #[test]
    fn join_rejects_empty_room() {
        assert!(matches!(
            decode_msg(MsgType::Join, br#"{"eid": ""}"#),
            Err(ProtoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn control_event_bodies_match_browser_shape() {
        let joined = SignalingMsg::Joined {
            room: RoomId::from("42"),
            member_count: 2,
        };
        assert_eq!(body_json(&joined), json!({"room": "42", "member_count": 2}));
        assert_eq!(
            body_json(&SignalingMsg::UserLeft { member_count: 1 }),
            json!({"member_count": 1})
        );
        assert_eq!(body_json(&SignalingMsg::PeerReady), json!({}));
        assert_eq!(
            body_json(&SignalingMsg::error("room full")),
            json!({"message": "room full"})
        );
    }

    #[test]
    fn bodiless_events_accept_empty_body() {
        assert_eq!(decode_msg(MsgType::PeerReady, b"").unwrap(), SignalingMsg::PeerReady);
        assert_eq!(decode_msg(MsgType::Leave, b" {} ").unwrap(), SignalingMsg::Leave);
        assert!(decode_msg(MsgType::Leave, b"[1]").is_err());
    }

    #[test]
    fn offer_with_answer_type_is_rejected() {
        let err = decode_msg(MsgType::Offer, br#"{"type":"answer","sdp":"v=0"}"#).unwrap_err();
        assert!(matches!(err, ProtoError::InvalidFormat(_)));

        let bad = SignalingMsg::Offer(SessionDescription::answer("v=0"));
        assert!(encode_msg(&bad).is_err());
    }

    #[test]
    fn candidate_is_carried_verbatim() {
        let raw = br#"{"candidate":"candidate:0 1 UDP 1 10.0.0.1 9 typ host","sdpMLineIndex":1,"sdpMid":"1","foo":[1,2]}"#;
        let msg = decode_msg(MsgType::IceCandidate, raw).unwrap();
        let SignalingMsg::IceCandidate(IceCandidate { ref extra, .. }) = msg else {
            panic!("expected candidate");
        };
        assert_eq!(extra.get("foo"), Some(&json!([1, 2])));
        assert_eq!(
            body_json(&msg),
            serde_json::from_slice::<Value>(raw).unwrap()
        );
    }

    #[test]
    fn garbage_body_is_a_json_error() {
        assert!(matches!(
            decode_msg(MsgType::Ping, b"not json"),
            Err(ProtoError::Json(_))
        ));
        assert!(matches!(
            decode_msg(MsgType::Error, &[0xff, 0xfe]),
            Err(ProtoError::InvalidUtf8)
        ));
    }
}
