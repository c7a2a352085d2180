//! Signaling relay: session registry, routing rules and the TCP server that
//! carries them.
pub mod errors;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod run;
pub mod runtime;
pub mod server_engine;
pub mod server_event;
pub mod signaling_server;
pub mod token;
pub mod transport;
pub mod types;

pub use errors::JoinError;
pub use registry::{ROOM_CAPACITY, SessionRegistry};
pub use server_engine::ServerEngine;
pub use signaling_server::SignalingServer;
pub use types::{ClientId, OutgoingMsg};
