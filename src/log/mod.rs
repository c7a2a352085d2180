//! Leveled logging shared by the relay and the participant client.
//!
//! Components never talk to a concrete logger: they hold an
//! `Arc<dyn LogSink>` and use the `sink_*!` macros, which compile away when
//! the matching `log-*` cargo feature is off.
pub mod log_level;
pub mod log_macros;
pub mod log_msg;
pub mod log_sink;
pub mod logger;
pub mod logger_handle;
pub mod memory_sink;
pub mod noop_log_sink;
pub use log_level::LogLevel;
pub use log_sink::LogSink;
pub use memory_sink::MemorySink;
pub use noop_log_sink::NoopLogSink;
