use std::sync::Mutex;

use crate::log::{log_level::LogLevel, log_sink::LogSink};

/// Sink that keeps every line in memory. Meant for tests and for the probe
/// binary, which prints the captured lines on exit.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// True if any line at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(lvl, text)| *lvl == level && text.contains(needle))
    }

    pub fn drain(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, msg: &str, _target: &'static str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push((level, msg.to_owned()));
        }
    }
}
