use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::{
    FrameError, HEADER_LEN, MAX_BODY_LEN, MsgType, PROTO_VERSION, ProtoError, SignalingMsg,
    decode_msg, encode_msg,
};

/// A frame whose header was valid and whose body was fully read, but whose
/// type byte has not been interpreted yet.
#[derive(Debug)]
pub struct RawFrame {
    pub type_byte: u8,
    pub body: Vec<u8>,
}

/// Write a single frame: [ver][type][reserved u16=0][len u32][body...]
pub fn write_frame<W: Write>(w: &mut W, msg_type: MsgType, body: &[u8]) -> io::Result<()> {
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "body too large"))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.write_u8(PROTO_VERSION)?;
    frame.write_u8(msg_type.as_u8())?;
    frame.write_u16::<BigEndian>(0)?;
    frame.write_u32::<BigEndian>(len)?;
    frame.extend_from_slice(body);

    w.write_all(&frame)?;
    w.flush()
}

/// Read a single frame, enforcing a max body length.
///
/// The body is consumed before the type byte is checked, so an unknown type
/// leaves the stream aligned on the next frame.
pub fn read_frame<R: Read>(r: &mut R, max_body: usize) -> Result<RawFrame, FrameError> {
    let mut header = [0u8; HEADER_LEN];
    r.read_exact(&mut header)?;

    let mut h = &header[..];
    let ver = h.read_u8()?;
    if ver != PROTO_VERSION {
        return Err(ProtoError::BadVersion(ver).into());
    }
    let type_byte = h.read_u8()?;
    let _reserved = h.read_u16::<BigEndian>()?;
    let len = h.read_u32::<BigEndian>()? as usize;

    if len > max_body {
        return Err(ProtoError::TooLarge {
            max: max_body,
            actual: len,
        }
        .into());
    }

    let mut body = vec![0u8; len];
    r.read_exact(&mut body)?;

    Ok(RawFrame { type_byte, body })
}

/// Encode and write one message.
pub fn write_msg<W: Write>(w: &mut W, msg: &SignalingMsg) -> Result<(), FrameError> {
    let (msg_type, body) = encode_msg(msg)?;
    if body.len() > MAX_BODY_LEN {
        return Err(ProtoError::TooLarge {
            max: MAX_BODY_LEN,
            actual: body.len(),
        }
        .into());
    }
    write_frame(w, msg_type, &body)?;
    Ok(())
}

/// Read and decode one message.
pub fn read_msg<R: Read>(r: &mut R, max_body: usize) -> Result<SignalingMsg, FrameError> {
    let frame = read_frame(r, max_body)?;
    let msg_type = MsgType::from_u8(frame.type_byte)?;
    Ok(decode_msg(msg_type, &frame.body)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::{IceCandidate, RoomId, SessionDescription};
    use std::io::Cursor;

    #[test]
    fn header_layout_is_big_endian() {
        let mut buf = Vec::new();
        write_frame(&mut buf, MsgType::Join, b"{}").unwrap();
        assert_eq!(&buf[..HEADER_LEN], &[1, 0x12, 0, 0, 0, 0, 0, 2]);
        assert_eq!(&buf[HEADER_LEN..], b"{}");
    }

    #[test]
    fn consecutive_messages_read_back_in_order() {
        let msgs = vec![
            SignalingMsg::Join {
                room: RoomId::from("42"),
                token: Some("tok".into()),
            },
            SignalingMsg::Offer(SessionDescription::offer("v=0\r\n")),
            SignalingMsg::IceCandidate(IceCandidate::new("candidate:1", 0, "0")),
            SignalingMsg::Leave,
        ];
        let mut buf = Vec::new();
        for m in &msgs {
            write_msg(&mut buf, m).unwrap();
        }

        let mut cur = Cursor::new(buf);
        for m in &msgs {
            assert_eq!(&read_msg(&mut cur, MAX_BODY_LEN).unwrap(), m);
        }
        assert!(matches!(read_msg(&mut cur, MAX_BODY_LEN), Err(FrameError::Io(_))));
    }

    #[test]
    fn unknown_type_keeps_stream_aligned() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[1, 0x99, 0, 0, 0, 0, 0, 3]);
        buf.extend_from_slice(b"abc");
        write_msg(&mut buf, &SignalingMsg::Ping { nonce: 9 }).unwrap();

        let mut cur = Cursor::new(buf);
        let err = read_msg(&mut cur, MAX_BODY_LEN).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            read_msg(&mut cur, MAX_BODY_LEN).unwrap(),
            SignalingMsg::Ping { nonce: 9 }
        );
    }

    #[test]
    fn oversized_and_bad_version_are_fatal() {
        let mut buf = Vec::new();
        write_frame(&mut buf, MsgType::Offer, &[b' '; 64]).unwrap();
        let err = read_frame(&mut Cursor::new(buf), 16).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Proto(ProtoError::TooLarge { max: 16, actual: 64 })
        ));
        assert!(!err.is_recoverable());

        let bad = [2u8, 0x12, 0, 0, 0, 0, 0, 0];
        let err = read_frame(&mut Cursor::new(bad), 16).unwrap_err();
        assert!(matches!(err, FrameError::Proto(ProtoError::BadVersion(2))));
    }
}
