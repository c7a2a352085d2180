use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};
use std::{env, process};

use tutorlink_rtc::client::{ClientEvent, ParticipantConfig, spawn_participant};
use tutorlink_rtc::config::Config;
use tutorlink_rtc::log::LogSink;
use tutorlink_rtc::log::logger::Logger;
use tutorlink_rtc::media::{PreviewSource, SyntheticDevices};
use tutorlink_rtc::negotiation::{LoopbackFactory, RtcConfiguration, SignalingState};

const CALL_TIMEOUT: Duration = Duration::from_secs(60);

fn main() {
    // --- Parse CLI args ----------------------------------------------------
    //
    //   peer_probe                      -> [Session] server_addr/room from config
    //   peer_probe 127.0.0.1:6969 42    -> explicit relay and room
    //   peer_probe 127.0.0.1:6969 42 --share
    //      -> also round-trips a screen share once the call is up
    let args: Vec<String> = env::args().collect();
    let share = args.iter().any(|a| a == "--share");
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();

    let (config, _) = Config::load_default();
    let participant_config = match positional.as_slice() {
        [] => ParticipantConfig::from_config(&config),
        [addr, room] => RtcConfiguration::from_config(&config).map(|rtc| {
            let mut c = ParticipantConfig::new(room.as_str()).with_server_addr(addr.as_str());
            c.rtc = rtc;
            c.token = config.get_non_empty("Session", "token").map(str::to_string);
            c
        }),
        _ => Err(format!("usage: {} [SERVER_ADDR ROOM] [--share]", args[0])),
    };
    let participant_config = match participant_config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let logger = Logger::start_client(1024, &config);
    let log: Arc<dyn LogSink> = Arc::new(logger.handle());
    let devices = Arc::new(SyntheticDevices::new());

    eprintln!(
        "[peer_probe] joining room {} at {} (log: {})",
        participant_config.room,
        participant_config.server_addr,
        logger.file_path().display()
    );

    let handle = match spawn_participant(
        participant_config,
        devices.clone(),
        Arc::new(LoopbackFactory::new()),
        log,
    ) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("[peer_probe] cannot reach relay: {e}");
            process::exit(1);
        }
    };

    let deadline = Instant::now() + CALL_TIMEOUT;
    let mut reached_stable = false;
    let mut shared = false;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let ev = match handle.events().recv_timeout(remaining) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => {
                eprintln!("[peer_probe] timed out waiting for the call");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };
        println!("{ev}");

        match ev {
            ClientEvent::SignalingState(SignalingState::Stable) if !reached_stable => {
                reached_stable = true;
                if share {
                    handle.start_screen_share();
                } else {
                    break;
                }
            }
            ClientEvent::PreviewChanged(PreviewSource::Screen) => {
                shared = true;
                // Simulates the OS "stop sharing" button.
                devices.end_screen_share();
            }
            ClientEvent::PreviewChanged(PreviewSource::Camera) if shared => break,
            ClientEvent::Disconnected { .. } | ClientEvent::CallEnded { .. } => break,
            _ => {}
        }
    }

    handle.hang_up();
    while let Ok(ev) = handle.events().recv_timeout(Duration::from_millis(500)) {
        println!("{ev}");
    }
    let _ = handle.join();

    if !reached_stable {
        process::exit(1);
    }
}
