#![forbid(unsafe_code)]

use tokio::sync::broadcast;

/// Events emitted by a [`crate::VideoSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Stream metadata fetched during initialization.
    MetadataLoaded { fps: f64, frames_count: u64 },
    /// A frame range landed in the buffer.
    FramesLoaded { start_frame: u64, count: u64 },
    /// A detached background prefetch failed. Direct callers of
    /// `initialize` observe fetch errors as `Err` instead.
    PrefetchFailed { start_frame: u64, error: String },
    /// The service returned an empty frame set; no more frames exist.
    EndOfStream,
}

/// Broadcast bus for session events.
///
/// `publish()` is a sync call and safe from any context. Without
/// subscribers events are silently dropped; slow subscribers observe
/// `RecvError::Lagged` instead of blocking the session.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<StreamEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: StreamEvent) {
        let _ = self.tx.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.tx.subscribe()
    }
}
