use std::sync::Arc;
use std::{env, process};

use tutorlink_rtc::config::Config;
use tutorlink_rtc::log::LogSink;
use tutorlink_rtc::log::logger::Logger;
use tutorlink_rtc::signaling::run::{configured_bind_addr, run_signaling_server_with_log};

fn main() -> std::io::Result<()> {
    // --- Parse CLI args ----------------------------------------------------
    //
    // Supported:
    //   cargo run --bin signaling_server
    //      -> binds to [Signaling] bind_addr, or 0.0.0.0:6969
    //
    //   cargo run --bin signaling_server -- 0.0.0.0:7000
    //      -> binds to 0.0.0.0:7000
    //
    //   cargo run --bin signaling_server -- 127.0.0.1 7000
    //      -> binds to 127.0.0.1:7000

    let args: Vec<String> = env::args().collect();
    let (config, config_path) = Config::load_default();

    let addr = match args.len() {
        // no extra args -> config or default listen address
        1 => configured_bind_addr(&config),

        // one extra arg: full addr "IP:PORT"
        2 => args[1].clone(),

        // two extra args: IP + PORT
        3 => format!("{}:{}", args[1], args[2]),

        _ => {
            eprintln!("Usage:");
            eprintln!("  {}                # listen on [Signaling] bind_addr or 0.0.0.0:6969", args[0]);
            eprintln!("  {} [ADDR]         # e.g. 0.0.0.0:7000", args[0]);
            eprintln!("  {} [IP] [PORT]    # e.g. 127.0.0.1 7000", args[0]);
            eprintln!();
            eprintln!("The config file is read from $TUTORLINK_CONFIG or tutorlink.conf");
            eprintln!("next to the executable.");
            process::exit(1);
        }
    };

    // --- Start process logger ----------------------------------------------
    let logger = Logger::start_server(1024, &config);
    let log_sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    match &config_path {
        Some(p) => eprintln!("[signaling_server] config: {}", p.display()),
        None => eprintln!("[signaling_server] no config file; using defaults"),
    }
    eprintln!("[signaling_server] log file: {}", logger.file_path().display());
    eprintln!("[signaling_server] starting on {addr}");

    // --- Run signaling server (blocks) -------------------------------------
    run_signaling_server_with_log(&addr, &config, log_sink)
}
