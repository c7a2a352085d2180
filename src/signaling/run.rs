use std::io;
use std::sync::Arc;

use crate::config::Config;
use crate::log::LogSink;
use crate::signaling::protocol::MAX_BODY_LEN;
use crate::signaling::signaling_server::SignalingServer;

/// Address used when neither the command line nor the config names one.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:6969";

const SIGNALING_SECTION: &str = "Signaling";

/// Run the signaling relay on `addr` using the given log sink.
///
/// `[Signaling] max_frame_len` lowers the per-frame body limit when set.
pub fn run_signaling_server_with_log(
    addr: &str,
    config: &Config,
    log_sink: Arc<dyn LogSink>,
) -> io::Result<()> {
    let max_body = config
        .get_parsed::<usize>(SIGNALING_SECTION, "max_frame_len")
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
        .unwrap_or(MAX_BODY_LEN);

    SignalingServer::bind(addr, log_sink)?
        .with_max_body(max_body)
        .run()
}

/// `[Signaling] bind_addr`, or the built-in default.
#[must_use]
pub fn configured_bind_addr(config: &Config) -> String {
    config
        .get_non_empty(SIGNALING_SECTION, "bind_addr")
        .unwrap_or(DEFAULT_BIND_ADDR)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_from_config_or_default() {
        assert_eq!(configured_bind_addr(&Config::empty()), DEFAULT_BIND_ADDR);
        let cfg = Config::parse("[Signaling]\nbind_addr = 127.0.0.1:7001\n");
        assert_eq!(configured_bind_addr(&cfg), "127.0.0.1:7001");
    }
}
