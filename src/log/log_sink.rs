use crate::log::log_level::LogLevel;

/// Destination for log lines. Implementations must never block the caller for long:
/// the relay's server loop and every participant loop log from their hot path.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
