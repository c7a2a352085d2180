//! Signaling wire protocol.
//!
//! Each event travels as one frame over a persistent TCP stream:
//!
//! ```text
//! ----------- Header (8 bytes) ------------------------------
//! Version (1B) - Event Type (1B) - Reserved (2B) - Body Len (4B, BE)
//! ----------- Body -----------------------------------------
//! UTF-8 JSON payload, up to MAX_BODY_LEN
//! ```
pub mod codec;
pub mod constants;
pub mod errors;
pub mod framing;
pub mod msg;
pub mod msg_type;
pub mod types;

pub use codec::{decode_msg, encode_msg};
pub use constants::{HEADER_LEN, MAX_BODY_LEN, PROTO_VERSION};
pub use errors::{FrameError, ProtoError};
pub use framing::{RawFrame, read_frame, read_msg, write_frame, write_msg};
pub use msg::SignalingMsg;
pub use msg_type::MsgType;
pub use types::{IceCandidate, RoomId, SdpType, SessionDescription};
