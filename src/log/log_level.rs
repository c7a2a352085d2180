use std::fmt;

/// Defines the severity levels for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-message chatter (every relayed frame, every buffered candidate).
    Trace,
    /// Negotiation decisions that are normal but worth seeing when debugging glare.
    Debug,
    /// Room membership changes, call start/stop.
    Info,
    /// Dropped or rejected signals and recoverable failures.
    Warn,
    /// Failures surfaced to the user or that end a connection.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}
