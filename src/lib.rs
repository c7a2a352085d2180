//! TutorLink RTC is the negotiation core of the tutoring platform's video
//! sessions.
//!
//! It provides two binaries:
//! - `signaling_server`: the relay that pairs two participants per room and
//!   forwards their offer/answer/ICE events.
//! - `peer_probe`: a headless participant used to smoke-test a relay.
//!
//! The library holds both halves: the relay with its session registry, and
//! the participant side with its perfect-negotiation state machine and
//! camera/screen track substitution.

/// Participant event loop: media, negotiation session, screen share.
pub mod client;
/// Handles configuration loading and management.
pub mod config;
/// Logging utilities shared by relay and participants.
pub mod log;
/// Local capture tracks and the injected device capability.
pub mod media;
/// Offer/answer/ICE negotiation state machine and its driver.
pub mod negotiation;
/// Signaling relay and its wire protocol.
pub mod signaling;
/// Participant end of the signaling connection.
pub mod signaling_client;
