use std::time::{SystemTime, UNIX_EPOCH};

use crate::log::log_level::LogLevel;

/// A single log line travelling from a producer to the logger worker.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// Severity of the line.
    pub level: LogLevel,
    /// Wall-clock timestamp in milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    /// The formatted message.
    pub text: String,
    /// Module path the line was emitted from.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a message stamped with the current time.
    pub fn new(level: LogLevel, text: impl Into<String>, target: &'static str) -> Self {
        Self {
            level,
            ts_ms: now_millis(),
            text: text.into(),
            target,
        }
    }

    /// One line as written to the log file: `[Level] ts | target | text`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("[{}] {} | {} | {}", self.level, self.ts_ms, self.target, self.text)
    }
}

/// Milliseconds since the UNIX epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_contains_level_target_and_text() {
        let msg = LogMsg::new(LogLevel::Warn, "room full", "tutorlink_rtc::signaling");
        let line = msg.render();
        assert!(line.starts_with("[WARN] "));
        assert!(line.contains("tutorlink_rtc::signaling"));
        assert!(line.ends_with("room full"));
        assert!(msg.ts_ms > 0);
    }
}
