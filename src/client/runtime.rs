use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::thread::{self, JoinHandle};

use crate::client::client_event::ClientEvent;
use crate::client::participant::{
    Participant, ParticipantEffect, ParticipantInput, release_late_capture,
};
use crate::client::participant_config::ParticipantConfig;
use crate::log::LogSink;
use crate::media::{MediaAcquisitionError, MediaDevices};
use crate::negotiation::PeerConnectionFactory;
use crate::signaling_client::{SignalingClient, SignalingClientError, SignalingEvent};
use crate::{sink_debug, sink_info, sink_warn};

/// Control surface of a running participant.
///
/// Dropping the handle hangs up.
pub struct ParticipantHandle {
    input_tx: Sender<ParticipantInput>,
    events_rx: Receiver<ClientEvent>,
    thread: Option<JoinHandle<()>>,
}

impl ParticipantHandle {
    pub fn hang_up(&self) {
        let _ = self.input_tx.send(ParticipantInput::HangUp);
    }

    pub fn start_screen_share(&self) {
        let _ = self.input_tx.send(ParticipantInput::StartScreenShare);
    }

    pub fn stop_screen_share(&self) {
        let _ = self.input_tx.send(ParticipantInput::StopScreenShare);
    }

    /// Everything the participant reported, in order.
    pub fn events(&self) -> &Receiver<ClientEvent> {
        &self.events_rx
    }

    /// Waits for the participant loop to finish.
    pub fn join(mut self) -> thread::Result<()> {
        match self.thread.take() {
            Some(t) => t.join(),
            None => Ok(()),
        }
    }
}

impl Drop for ParticipantHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.hang_up();
        }
    }
}

/// Connects to the relay and runs a participant on its own thread.
///
/// The loop owns the [`Participant`]; the signaling reader, device workers
/// and track-ended callbacks all feed the same input channel. Device calls
/// run on short-lived worker threads so a permission prompt never stalls
/// signaling.
///
/// # Errors
/// The relay cannot be reached, or the loop thread cannot be spawned.
pub fn spawn_participant(
    config: ParticipantConfig,
    devices: Arc<dyn MediaDevices>,
    factory: Arc<dyn PeerConnectionFactory>,
    log: Arc<dyn LogSink>,
) -> Result<ParticipantHandle, SignalingClientError> {
    let (input_tx, input_rx) = mpsc::channel::<ParticipantInput>();
    let (events_tx, events_rx) = mpsc::channel::<ClientEvent>();

    let client = SignalingClient::connect_into(
        config.server_addr.as_str(),
        Arc::clone(&log),
        input_tx.clone(),
        |ev| match ev {
            SignalingEvent::Msg(msg) => ParticipantInput::Signal(msg),
            SignalingEvent::Disconnected { reason } => ParticipantInput::Disconnected { reason },
        },
    )?;
    let _ = input_tx.send(ParticipantInput::Connected);

    let participant = Participant::new(config, factory, Arc::clone(&log));
    let ctx = LoopContext {
        client,
        devices,
        input_tx: input_tx.clone(),
        events_tx,
        log,
    };
    let thread = thread::Builder::new()
        .name("participant".into())
        .spawn(move || run_participant_loop(participant, &ctx, &input_rx))?;

    Ok(ParticipantHandle {
        input_tx,
        events_rx,
        thread: Some(thread),
    })
}

struct LoopContext {
    client: SignalingClient,
    devices: Arc<dyn MediaDevices>,
    input_tx: Sender<ParticipantInput>,
    events_tx: Sender<ClientEvent>,
    log: Arc<dyn LogSink>,
}

fn run_participant_loop(
    mut participant: Participant,
    ctx: &LoopContext,
    input_rx: &Receiver<ParticipantInput>,
) {
    while let Ok(input) = input_rx.recv() {
        for effect in participant.handle(input) {
            apply_effect(ctx, effect);
        }
        if participant.is_finished() {
            break;
        }
    }
    sink_info!(ctx.log, "participant loop finished");
    ctx.client.disconnect();
}

fn apply_effect(ctx: &LoopContext, effect: ParticipantEffect) {
    match effect {
        ParticipantEffect::Send(msg) => {
            if let Err(e) = ctx.client.send(msg) {
                // The reader reports the disconnect as its own input.
                sink_warn!(ctx.log, "signal not sent: {}", e);
            }
        }
        ParticipantEffect::RequestUserMedia(constraints) => {
            let devices = Arc::clone(&ctx.devices);
            spawn_device_worker(
                &ctx.input_tx,
                &ctx.log,
                "user-media",
                move || devices.get_user_media(&constraints),
                ParticipantInput::UserMedia,
            );
        }
        ParticipantEffect::RequestDisplayMedia => {
            let devices = Arc::clone(&ctx.devices);
            spawn_device_worker(
                &ctx.input_tx,
                &ctx.log,
                "display-media",
                move || devices.get_display_media(),
                ParticipantInput::DisplayMedia,
            );
        }
        ParticipantEffect::WatchTrack(track) => {
            let tx = ctx.input_tx.clone();
            track.on_ended(move |id| {
                let _ = tx.send(ParticipantInput::TrackEnded {
                    track_id: id.to_string(),
                });
            });
        }
        ParticipantEffect::Notify(ev) => {
            sink_debug!(ctx.log, "client event: {}", ev);
            let _ = ctx.events_tx.send(ev);
        }
    }
}

/// Runs one device call off the loop thread. `wrap` turns its outcome,
/// including a failure to start the worker, into the matching input.
fn spawn_device_worker<T, W>(
    input_tx: &Sender<ParticipantInput>,
    log: &Arc<dyn LogSink>,
    what: &'static str,
    work: W,
    wrap: fn(Result<T, MediaAcquisitionError>) -> ParticipantInput,
) where
    T: Send + 'static,
    W: FnOnce() -> Result<T, MediaAcquisitionError> + Send + 'static,
{
    let tx = input_tx.clone();
    let spawned = thread::Builder::new()
        .name(format!("media-{what}"))
        .spawn(move || deliver_capture(&tx, wrap(work())));

    if let Err(e) = spawned {
        sink_warn!(log, "cannot start {} worker: {}", what, e);
        let err = MediaAcquisitionError::DeviceUnavailable(format!("worker thread: {e}"));
        deliver_capture(input_tx, wrap(Err(err)));
    }
}

/// Hands a device result to the loop. Captured tracks nobody will receive
/// are stopped.
fn deliver_capture(tx: &Sender<ParticipantInput>, input: ParticipantInput) {
    if let Err(SendError(input)) = tx.send(input) {
        release_late_capture(input);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use std::time::Duration;

    use super::*;
    use crate::log::NoopLogSink;
    use crate::media::SyntheticDevices;

    fn noop() -> Arc<dyn LogSink> {
        Arc::new(NoopLogSink)
    }

    #[test]
    fn device_failure_comes_back_as_the_requested_kind() {
        let (tx, rx) = mpsc::channel();
        let devices = Arc::new(SyntheticDevices::new());
        devices.set_deny_display_media(true);

        let d = Arc::clone(&devices);
        spawn_device_worker(
            &tx,
            &noop(),
            "display-media",
            move || d.get_display_media(),
            ParticipantInput::DisplayMedia,
        );

        let input = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            input,
            ParticipantInput::DisplayMedia(Err(MediaAcquisitionError::PermissionDenied))
        ));
    }

    #[test]
    fn capture_for_a_finished_participant_is_stopped() {
        let (tx, rx) = mpsc::channel::<ParticipantInput>();
        drop(rx);
        let devices = SyntheticDevices::new();

        let stream = devices.get_user_media(&Default::default()).unwrap();
        deliver_capture(&tx, ParticipantInput::UserMedia(Ok(stream)));
        let screen = devices.get_display_media().unwrap();
        deliver_capture(&tx, ParticipantInput::DisplayMedia(Ok(screen)));

        assert_eq!(devices.issued_tracks().len(), 3);
        assert!(devices.live_tracks().is_empty());
    }
}
