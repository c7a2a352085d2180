use crate::config::Config;
use crate::negotiation::RtcConfiguration;
use crate::signaling::protocol::RoomId;

const SESSION_SECTION: &str = "Session";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:6969";

/// Where a participant connects, which room it joins, and the ICE settings
/// for its peer connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantConfig {
    pub server_addr: String,
    pub room: RoomId,
    /// Opaque bearer credential from the backend; carried on `join`.
    pub token: Option<String>,
    pub rtc: RtcConfiguration,
}

impl ParticipantConfig {
    pub fn new(room: impl Into<RoomId>) -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            room: room.into(),
            token: None,
            rtc: RtcConfiguration::default(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_server_addr(mut self, addr: impl Into<String>) -> Self {
        self.server_addr = addr.into();
        self
    }

    /// Reads `[Session] server_addr, room, token` and the `[Ice]` section.
    ///
    /// # Errors
    /// No room configured, or an invalid `[Ice]` value.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let room = config
            .get_non_empty(SESSION_SECTION, "room")
            .ok_or_else(|| "[Session] room is not set".to_string())?;

        Ok(Self {
            server_addr: config
                .get_or_default(SESSION_SECTION, "server_addr", DEFAULT_SERVER_ADDR)
                .to_string(),
            room: RoomId::new(room),
            token: config
                .get_non_empty(SESSION_SECTION, "token")
                .map(str::to_string),
            rtc: RtcConfiguration::from_config(config)?,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn reads_session_section() {
        let cfg = Config::parse("[Session]\nroom = 42\ntoken = abc\n");
        let pc = ParticipantConfig::from_config(&cfg).unwrap();
        assert_eq!(pc.room.as_str(), "42");
        assert_eq!(pc.token.as_deref(), Some("abc"));
        assert_eq!(pc.server_addr, DEFAULT_SERVER_ADDR);
    }

    #[test]
    fn room_is_required() {
        let err = ParticipantConfig::from_config(&Config::parse("[Session]\ntoken = abc\n")).unwrap_err();
        assert!(err.contains("room"));
    }
}
