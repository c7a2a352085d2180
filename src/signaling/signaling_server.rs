use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{Arc, mpsc};
use std::{io, thread};

use crate::log::{LogSink, NoopLogSink};
use crate::signaling::protocol::MAX_BODY_LEN;
use crate::signaling::router::Router;
use crate::signaling::runtime::run_server_loop;
use crate::signaling::server_event::ServerEvent;
use crate::signaling::transport::spawn_connection_threads;
use crate::signaling::types::ClientId;
use crate::{sink_info, sink_warn};

/// Top-level runtime object for the signaling relay.
///
/// Owns the bound listener and the log sink; `run` spins up the central
/// server loop plus one reader/writer thread pair per accepted connection.
pub struct SignalingServer {
    listener: TcpListener,
    log: Arc<dyn LogSink>,
    max_body: usize,
}

impl SignalingServer {
    /// Binds immediately so callers (and tests using port 0) can read the
    /// actual address before `run`.
    pub fn bind<A: ToSocketAddrs>(addr: A, log: Arc<dyn LogSink>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            log,
            max_body: MAX_BODY_LEN,
        })
    }

    pub fn bind_no_log<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Self::bind(addr, Arc::new(NoopLogSink))
    }

    /// Lowers the per-frame body limit (never above the protocol maximum).
    #[must_use]
    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body.min(MAX_BODY_LEN);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Blocking main loop: spawn the central server loop, accept TCP clients.
    pub fn run(self) -> io::Result<()> {
        let Self {
            listener,
            log,
            max_body,
        } = self;

        // Events from all connections -> central server loop
        let (server_tx, server_rx) = mpsc::channel::<ServerEvent>();

        {
            let log_for_loop = log.clone();
            let log_for_router = log.clone();

            thread::Builder::new()
                .name("sig-server-loop".into())
                .spawn(move || {
                    sink_info!(log_for_loop, "[signaling] server loop started");
                    let router = Router::with_log(log_for_router);
                    run_server_loop(router, log_for_loop, server_rx);
                })?;
        }

        let mut next_client_id: ClientId = 1;
        sink_info!(log, "signaling server listening on {}", listener.local_addr()?);

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    sink_warn!(log, "incoming TCP accept failed: {} (continuing to accept)", e);
                    continue;
                }
            };
            let _ = stream.set_nodelay(true);

            let client_id = next_client_id;
            next_client_id += 1;

            let peer = stream
                .peer_addr()
                .map_or_else(|_| "?".to_string(), |a| a.to_string());
            sink_info!(log, "accepted TCP connection from {} as client_id={}", peer, client_id);

            if let Err(e) =
                spawn_connection_threads(client_id, stream, server_tx.clone(), log.clone(), max_body)
            {
                sink_warn!(
                    log,
                    "failed to spawn connection threads for client {}: {}",
                    client_id,
                    e
                );
            }
        }

        Ok(())
    }

    /// Runs the server on a background thread.
    pub fn spawn(self) -> io::Result<thread::JoinHandle<io::Result<()>>> {
        thread::Builder::new()
            .name("sig-accept".into())
            .spawn(move || self.run())
    }
}
