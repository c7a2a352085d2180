//! Per-participant offer/answer/ICE negotiation.
//!
//! [`state_machine::reduce`] is the perfect-negotiation algorithm as a pure
//! function; [`Negotiator`] executes its actions against a
//! [`PeerConnection`].
pub mod loopback_peer_connection;
pub mod negotiation_action;
pub mod negotiation_error;
pub mod negotiation_event;
pub mod negotiator;
pub mod peer_connection;
pub mod role;
pub mod rtc_configuration;
pub mod signaling_state;
pub mod state_machine;

pub use loopback_peer_connection::{LoopbackFactory, LoopbackPeerConnection};
pub use negotiation_action::NegotiationAction;
pub use negotiation_error::NegotiationError;
pub use negotiation_event::NegotiationEvent;
pub use negotiator::{NegotiationOutput, Negotiator, NegotiatorStats};
pub use peer_connection::{PeerConnection, PeerConnectionError, PeerConnectionFactory};
pub use role::Role;
pub use rtc_configuration::RtcConfiguration;
pub use signaling_state::SignalingState;
pub use state_machine::{NegotiationState, reduce};
