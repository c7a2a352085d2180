use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, TrySendError},
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush every 100 lines when debugging, to see crashes near real-time.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

const LOGGING_SECTION: &str = "Logging";

/// Bounded, non-blocking logger that writes to a per-process log file.
///
/// Producers enqueue through a [`LoggerHandle`]; a single background thread
/// drains the queue, writes each line and flushes every `FLUSH_BATCH_SIZE`
/// lines. The worker exits (after a final flush) once every handle is dropped.
pub struct Logger {
    handle: LoggerHandle,
    _thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts the logger for a participant process (`[Logging] client_log_*`).
    #[must_use]
    pub fn start_client(cap: usize, config: &Config) -> Self {
        Self::start("client_log_filename", "client_log_path", cap, config)
    }

    /// Starts the logger for the relay process (`[Logging] server_log_*`).
    #[must_use]
    pub fn start_server(cap: usize, config: &Config) -> Self {
        Self::start("server_log_filename", "server_log_path", cap, config)
    }

    fn start(fn_key: &str, path_key: &str, cap: usize, config: &Config) -> Self {
        let app_name = config.get_non_empty(LOGGING_SECTION, fn_key);

        match config.get_non_empty(LOGGING_SECTION, path_key) {
            Some(dir) => Self::start_in_dir(expand_path(dir), app_name, cap),
            None => Self::start_default(app_name, cap),
        }
    }

    /// Starts the logger in a `logs/` directory next to the executable.
    ///
    /// Example filename: `target/debug/logs/tutorlink-server-20261016_093045-pid1234.log`
    #[must_use]
    pub fn start_default(app_name: Option<&str>, cap: usize) -> Self {
        let base = exe_dir_fallback_cwd().join("logs");
        Self::start_in_dir(base, app_name, cap)
    }

    /// Starts the logger in `dir`, creating it when missing.
    ///
    /// The file is named `<app>-<YYYYMMDD_HHMMSS>-pid<N>.log`. When the file
    /// cannot be opened the worker falls back to a temp file, then to a sink;
    /// logging never panics.
    pub fn start_in_dir<D: AsRef<Path>>(dir: D, app_name: Option<&str>, cap: usize) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let fname = log_file_name(app_name, &timestamp_for_filename(), std::process::id());
        let file_path = dir.join(fname);

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let handle = LoggerHandle { tx };

        let worker_path = file_path.clone();
        let _thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || {
                let mut out = BufWriter::new(open_writer(&worker_path));
                let mut lines_written: u32 = 0;

                while let Ok(m) = rx.recv() {
                    let _ = writeln!(&mut out, "{}", m.render());
                    lines_written = lines_written.wrapping_add(1);

                    if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) || m.level >= LogLevel::Error {
                        let _ = out.flush();
                    }
                }

                let _ = out.flush();
            })
            .ok();

        Self {
            handle,
            _thread,
            file_path,
        }
    }

    /// Enqueues a line without blocking; drops it when the queue is full.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    /// Cloneable handle for other threads.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn open_writer(path: &Path) -> Box<dyn Write + Send> {
    if let Ok(f) = OpenOptions::new().create(true).append(true).open(path) {
        return Box::new(f);
    }
    let fallback = std::env::temp_dir().join("tutorlink-fallback.log");
    match OpenOptions::new().create(true).append(true).open(&fallback) {
        Ok(f) => Box::new(f),
        Err(_) => Box::new(io::sink()),
    }
}

fn log_file_name(app_name: Option<&str>, ts: &str, pid: u32) -> String {
    match app_name {
        Some(name) => format!("{name}-{ts}-pid{pid}.log"),
        None => format!("{ts}-pid{pid}.log"),
    }
}

fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// `YYYYMMDD_HHMMSS` in UTC, e.g. `20261016_093045`.
fn timestamp_for_filename() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let tm = unix_to_utc(secs);
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        tm.year, tm.mon, tm.day, tm.hour, tm.min, tm.sec
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SimpleUtc {
    year: i64,
    mon: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
}

/// Civil-from-days conversion of a UNIX timestamp, avoiding a date crate.
#[allow(clippy::many_single_char_names, clippy::cast_possible_truncation)]
fn unix_to_utc(s: u64) -> SimpleUtc {
    let sec = (s % 60) as u32;
    let min = ((s / 60) % 60) as u32;
    let hour = ((s / 3_600) % 24) as u32;
    let days = (s / 86_400) as i64;

    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(m <= 2);

    SimpleUtc {
        year,
        mon: m as u32,
        day: d as u32,
        hour,
        min,
        sec,
    }
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from);

    match (home, path_str) {
        (Some(home), "~") => home,
        (Some(mut home), p) if p.starts_with("~/") || p.starts_with("~\\") => {
            home.push(&p[2..]);
            home
        }
        _ => PathBuf::from(path_str),
    }
}
