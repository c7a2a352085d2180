use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Audio => "audio",
            Self::Video => "video",
        })
    }
}

/// Where a track's samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    Microphone,
    Camera,
    Screen,
}

type EndedCallback = Box<dyn FnOnce(&str) + Send>;

struct TrackInner {
    id: String,
    kind: TrackKind,
    source: TrackSource,
    label: String,
    live: AtomicBool,
    on_ended: Mutex<Vec<EndedCallback>>,
}

/// Handle to one captured media track.
///
/// Clones share the same underlying track. A track ends either locally
/// ([`stop`](Self::stop), no notification) or from its source
/// ([`end_from_source`](Self::end_from_source), e.g. the OS "stop sharing"
/// button), which fires the `on_ended` callbacks exactly once.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, source: TrackSource, label: impl Into<String>) -> Self {
        let id = format!("{}-{:016x}", kind, rand::thread_rng().r#gen::<u64>());
        Self {
            inner: Arc::new(TrackInner {
                id,
                kind,
                source,
                label: label.into(),
                live: AtomicBool::new(true),
                on_ended: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn source(&self) -> TrackSource {
        self.inner.source
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Registers a callback for source-side termination. Ignored once the
    /// track has ended.
    pub fn on_ended<F>(&self, f: F)
    where
        F: FnOnce(&str) + Send + 'static,
    {
        if let Ok(mut cbs) = self.inner.on_ended.lock()
            && self.is_live()
        {
            cbs.push(Box::new(f));
        }
    }

    /// Stops the track locally. Callbacks are discarded, not fired.
    pub fn stop(&self) {
        self.inner.live.store(false, Ordering::SeqCst);
        if let Ok(mut cbs) = self.inner.on_ended.lock() {
            cbs.clear();
        }
    }

    /// The source ended the track; fires the callbacks once.
    pub fn end_from_source(&self) {
        if !self.inner.live.swap(false, Ordering::SeqCst) {
            return;
        }
        let cbs = match self.inner.on_ended.lock() {
            Ok(mut cbs) => std::mem::take(&mut *cbs),
            Err(_) => return,
        };
        for cb in cbs {
            cb(self.id());
        }
    }
}

impl PartialEq for MediaTrack {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for MediaTrack {}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("source", &self.inner.source)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn ids_are_unique_and_clones_compare_equal() {
        let a = MediaTrack::new(TrackKind::Video, TrackSource::Camera, "cam");
        let b = MediaTrack::new(TrackKind::Video, TrackSource::Camera, "cam");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.id().starts_with("video-"));
    }

    #[test]
    fn source_end_fires_callbacks_once() {
        let t = MediaTrack::new(TrackKind::Video, TrackSource::Screen, "screen");
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        t.on_ended(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        t.end_from_source();
        t.end_from_source();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!t.is_live());
    }

    #[test]
    fn local_stop_does_not_notify() {
        let t = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone, "mic");
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        t.on_ended(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        t.stop();
        t.end_from_source();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
