use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use crate::log::LogSink;
use crate::signaling::protocol::{FrameError, MAX_BODY_LEN, SignalingMsg, read_msg, write_msg};
use crate::signaling::server_event::ServerEvent;
use crate::signaling::types::ClientId;
use crate::{sink_debug, sink_warn};

/// Thin wrapper over a blocking stream that speaks in `SignalingMsg`.
pub struct Connection<S> {
    pub client_id: ClientId,
    stream: S,
    max_body: usize,
}

impl<S> Connection<S>
where
    S: Read + Write,
{
    pub fn new(id: ClientId, stream: S) -> Self {
        Self::with_max_body(id, stream, MAX_BODY_LEN)
    }

    pub fn with_max_body(id: ClientId, stream: S, max_body: usize) -> Self {
        Self {
            client_id: id,
            stream,
            max_body,
        }
    }

    pub fn recv(&mut self) -> Result<SignalingMsg, FrameError> {
        read_msg(&mut self.stream, self.max_body)
    }

    pub fn send(&mut self, msg: &SignalingMsg) -> Result<(), FrameError> {
        write_msg(&mut self.stream, msg)
    }
}

/// Spawn reader + writer threads for a single TcpStream client.
///
/// The reader turns frames into `ServerEvent`s; a frame whose body does not
/// decode becomes `Malformed` and reading continues. The writer drains the
/// client's outgoing channel and shuts the socket down when it ends, which
/// also unblocks the reader.
pub fn spawn_connection_threads(
    client_id: ClientId,
    stream: TcpStream,
    server_tx: Sender<ServerEvent>,
    log: Arc<dyn LogSink>,
    max_body: usize,
) -> std::io::Result<()> {
    let (to_client_tx, to_client_rx) = mpsc::channel::<SignalingMsg>();

    let read_stream = stream.try_clone()?;
    let write_stream = stream;

    server_tx
        .send(ServerEvent::RegisterClient {
            client_id,
            to_client: to_client_tx,
        })
        .map_err(|_| std::io::Error::other("server loop is gone"))?;

    // READER THREAD: socket -> ServerEvent
    {
        let server_tx = server_tx.clone();
        let log = log.clone();
        thread::Builder::new()
            .name(format!("sig-reader-{client_id}"))
            .spawn(move || {
                let mut conn = Connection::with_max_body(client_id, read_stream, max_body);

                loop {
                    let ev = match conn.recv() {
                        Ok(msg) => ServerEvent::MsgFromClient { client_id, msg },
                        Err(e) if e.is_recoverable() => ServerEvent::Malformed {
                            client_id,
                            reason: frame_reason(&e),
                        },
                        Err(FrameError::Io(io_e)) => {
                            sink_debug!(
                                log,
                                "[conn {}] reader closed: {} (kind={:?})",
                                client_id,
                                io_e,
                                io_e.kind()
                            );
                            let _ = server_tx.send(ServerEvent::Disconnected { client_id });
                            break;
                        }
                        Err(other) => {
                            sink_warn!(log, "[conn {}] fatal frame error: {}", client_id, other);
                            let _ = server_tx.send(ServerEvent::Disconnected { client_id });
                            break;
                        }
                    };
                    if server_tx.send(ev).is_err() {
                        break;
                    }
                }
            })?;
    }

    // WRITER THREAD: to_client_rx -> socket
    thread::Builder::new()
        .name(format!("sig-writer-{client_id}"))
        .spawn(move || {
            let shutdown_handle = write_stream.try_clone().ok();
            let mut conn = Connection::new(client_id, write_stream);

            while let Ok(msg) = to_client_rx.recv() {
                if let Err(e) = conn.send(&msg) {
                    sink_warn!(log, "[conn {}] error sending {}: {}", client_id, msg.name(), e);
                    let _ = server_tx.send(ServerEvent::Disconnected { client_id });
                    break;
                }
            }

            if let Some(s) = shutdown_handle {
                let _ = s.shutdown(Shutdown::Both);
            }
        })?;

    Ok(())
}

/// Error text sent back to the client, without the `protocol error:` prefix.
fn frame_reason(e: &FrameError) -> String {
    match e {
        FrameError::Proto(p) => p.to_string(),
        FrameError::Io(io_e) => io_e.to_string(),
    }
}
