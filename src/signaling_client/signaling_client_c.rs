use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::log::LogSink;
use crate::signaling::protocol::{FrameError, MAX_BODY_LEN, SignalingMsg, read_msg, write_msg};
use crate::signaling_client::signaling_client_error::SignalingClientError;
use crate::signaling_client::signaling_command::SignalingCommand;
use crate::signaling_client::signaling_event::SignalingEvent;
use crate::{sink_debug, sink_info, sink_warn};

/// Participant end of the relay connection.
///
/// A writer thread drains `SignalingCommand`s onto the socket; a reader thread
/// turns frames into `SignalingEvent`s. Both are blocking std threads.
pub struct SignalingClient {
    cmd_tx: Sender<SignalingCommand>,
}

impl SignalingClient {
    /// Connects and returns the client plus the receiver of its events.
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        log: Arc<dyn LogSink>,
    ) -> Result<(Self, Receiver<SignalingEvent>), SignalingClientError> {
        let (tx, rx) = mpsc::channel();
        let client = Self::connect_into(addr, log, tx, |ev| ev)?;
        Ok((client, rx))
    }

    /// Connects and delivers every event through `wrap` into `events`, so an
    /// owner with its own input enum needs no bridge thread.
    pub fn connect_into<A, T, F>(
        addr: A,
        log: Arc<dyn LogSink>,
        events: Sender<T>,
        wrap: F,
    ) -> Result<Self, SignalingClientError>
    where
        A: ToSocketAddrs,
        T: Send + 'static,
        F: Fn(SignalingEvent) -> T + Send + 'static,
    {
        let stream = TcpStream::connect(addr)?;
        let _ = stream.set_nodelay(true);
        let peer = stream.peer_addr()?;
        sink_info!(log, "connected to signaling relay at {}", peer);

        let mut read_stream = stream.try_clone()?;
        let mut write_stream = stream;
        let (cmd_tx, cmd_rx) = mpsc::channel::<SignalingCommand>();

        // READER THREAD: socket -> events
        {
            let log = log.clone();
            thread::Builder::new()
                .name("sig-client-reader".into())
                .spawn(move || {
                    let reason = loop {
                        match read_msg(&mut read_stream, MAX_BODY_LEN) {
                            Ok(msg) => {
                                sink_debug!(log, "signaling rx: {}", msg.name());
                                if events.send(wrap(SignalingEvent::Msg(msg))).is_err() {
                                    return;
                                }
                            }
                            Err(e) if e.is_recoverable() => {
                                sink_warn!(log, "skipping undecodable frame from relay: {}", e);
                            }
                            Err(FrameError::Io(e)) => break format!("connection closed: {e}"),
                            Err(e) => break e.to_string(),
                        }
                    };
                    sink_info!(log, "signaling connection ended: {}", reason);
                    let _ = events.send(wrap(SignalingEvent::Disconnected { reason }));
                })?;
        }

        // WRITER THREAD: commands -> socket
        thread::Builder::new()
            .name("sig-client-writer".into())
            .spawn(move || {
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        SignalingCommand::Send(msg) => {
                            sink_debug!(log, "signaling tx: {}", msg.name());
                            if let Err(e) = write_msg(&mut write_stream, &msg) {
                                sink_warn!(log, "signaling send of {} failed: {}", msg.name(), e);
                                break;
                            }
                        }
                        SignalingCommand::Disconnect => break,
                    }
                }
                // Unblocks the reader, which reports the disconnect.
                let _ = write_stream.shutdown(Shutdown::Both);
            })?;

        Ok(Self { cmd_tx })
    }

    /// Queues `msg` for the writer thread.
    pub fn send(&self, msg: SignalingMsg) -> Result<(), SignalingClientError> {
        self.cmd_tx
            .send(SignalingCommand::Send(msg))
            .map_err(|_| SignalingClientError::Disconnected)
    }

    /// Closes the connection after already-queued messages are written.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(SignalingCommand::Disconnect);
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
