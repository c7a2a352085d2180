//! Participant side: one event loop per call participant that owns local
//! media, the negotiation session and the screen-share controller.
pub mod client_event;
pub mod participant;
pub mod participant_config;
pub mod runtime;

pub use client_event::ClientEvent;
pub use participant::{Participant, ParticipantEffect, ParticipantInput};
pub use participant_config::ParticipantConfig;
pub use runtime::{ParticipantHandle, spawn_participant};
