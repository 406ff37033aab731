#![forbid(unsafe_code)]

//! Per-stream session: metadata bootstrap, single-flight fetch
//! coordination, and the lookahead scheduler.
//!
//! Concurrency model: overlapping async calls, never parallel fetches. The
//! in-flight slot holds at most one shared fetch future; late callers
//! clone it and await the same completion. The fetch future is the only
//! writer of the buffer and the completion flag. Locks are never held
//! across an await point.

use std::sync::Arc;

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, OnceCell};
use tracing::{debug, trace, warn};

use crate::{
    api::VideoApi,
    buffer::FrameBuffer,
    config::SessionOptions,
    error::{StreamError, StreamResult},
    events::{EventBus, StreamEvent},
};

/// Immutable stream metadata, set exactly once by [`VideoSession::initialize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamMeta {
    pub fps: f64,
    pub original_width: u32,
    pub original_height: u32,
    pub frames_count: u64,
}

type SharedFetch = Shared<BoxFuture<'static, StreamResult<()>>>;

struct SessionState {
    buffer: FrameBuffer,
    completed: bool,
}

struct Inner<A> {
    api: A,
    stream_id: String,
    options: SessionOptions,
    meta: OnceCell<StreamMeta>,
    state: RwLock<SessionState>,
    /// Single-flight token: at most one fetch outstanding per session.
    in_flight: Mutex<Option<SharedFetch>>,
    events: EventBus,
}

/// Streaming frame cache for one remote ASCII video.
///
/// Construct with a stream identifier and a [`VideoApi`], await
/// [`initialize`](Self::initialize) once, then drive playback with
/// [`read_window`](Self::read_window). Cheap to clone; clones share state.
pub struct VideoSession<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for VideoSession<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: VideoApi + 'static> VideoSession<A> {
    pub fn new(stream_id: impl Into<String>, api: A) -> Self {
        Self::with_options(stream_id, api, SessionOptions::default())
    }

    pub fn with_options(stream_id: impl Into<String>, api: A, options: SessionOptions) -> Self {
        let events = EventBus::new(options.events_channel_capacity);
        Self {
            inner: Arc::new(Inner {
                api,
                stream_id: stream_id.into(),
                options,
                meta: OnceCell::new(),
                state: RwLock::new(SessionState {
                    buffer: FrameBuffer::new(),
                    completed: false,
                }),
                in_flight: Mutex::new(None),
                events,
            }),
        }
    }

    /// One-shot metadata bootstrap plus the initial priming fetch.
    ///
    /// Must complete before the session is usable; on failure no partial
    /// state is exposed and reads return [`StreamError::NotInitialized`].
    pub async fn initialize(&self) -> StreamResult<()> {
        let meta = self
            .inner
            .meta
            .get_or_try_init(|| async {
                let info = self.inner.api.stream_info(&self.inner.stream_id).await?;
                debug!(
                    stream = %self.inner.stream_id,
                    fps = info.fps,
                    frames_count = info.frames_count,
                    "stream metadata loaded"
                );
                self.inner.events.publish(StreamEvent::MetadataLoaded {
                    fps: info.fps,
                    frames_count: info.frames_count,
                });
                Ok::<_, StreamError>(StreamMeta {
                    fps: info.fps,
                    original_width: info.original_width,
                    original_height: info.original_height,
                    frames_count: info.frames_count,
                })
            })
            .await?;

        self.fetch_range(0, self.preload_frames(meta)).await
    }

    /// Best-effort read of frames `[position, position + count)`.
    ///
    /// Missing frames come back as `None` holes; a re-read on the next
    /// tick may find them filled. Waits for an in-flight fetch only when
    /// the requested window itself is undersupplied, so a steady-state
    /// playback loop is never blocked on network latency. Returns an
    /// empty vec once the stream is exhausted.
    pub async fn read_window(
        &self,
        position: u64,
        count: u64,
    ) -> StreamResult<Vec<Option<String>>> {
        let meta = *self.inner.meta.get().ok_or(StreamError::NotInitialized)?;
        let total = meta.frames_count;
        let target = self.preload_frames(&meta) + count;

        let preloaded = {
            let state = self.inner.state.read();
            if state.completed {
                return Ok(Vec::new());
            }
            state.buffer.preloaded_from(position, total)
        };

        if preloaded < count {
            let in_flight = self.inner.in_flight.lock().clone();
            if let Some(fetch) = in_flight {
                // Give freshly fetched data a chance to land. The caller
                // that started the fetch observes its error.
                let _ = fetch.await;
            }
        }

        let (window, preloaded, next_gap, completed) = {
            let state = self.inner.state.read();
            (
                state.buffer.window(position, count),
                state.buffer.preloaded_from(position, total),
                state.buffer.next_gap(position, total),
                state.completed,
            )
        };

        if !completed && preloaded < target {
            self.spawn_prefetch(next_gap, target);
        }

        Ok(window)
    }

    pub fn stream_id(&self) -> &str {
        &self.inner.stream_id
    }

    /// Frames per second, available after initialization.
    pub fn fps(&self) -> Option<f64> {
        self.inner.meta.get().map(|m| m.fps)
    }

    /// Source dimensions `(width, height)`, available after initialization.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.inner
            .meta
            .get()
            .map(|m| (m.original_width, m.original_height))
    }

    /// Total frame count reported by the service, available after
    /// initialization. Advisory: the authoritative end-of-stream signal is
    /// an empty frame response.
    pub fn total_frames(&self) -> Option<u64> {
        self.inner.meta.get().map(|m| m.frames_count)
    }

    /// Whether the service has signalled end-of-stream. Never resets.
    pub fn completed(&self) -> bool {
        self.inner.state.read().completed
    }

    /// Length of the contiguous buffered run starting at `position`.
    pub fn preloaded_from(&self, position: u64) -> u64 {
        let Some(meta) = self.inner.meta.get() else {
            return 0;
        };
        self.inner
            .state
            .read()
            .buffer
            .preloaded_from(position, meta.frames_count)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.inner.events.subscribe()
    }

    fn preload_frames(&self, meta: &StreamMeta) -> u64 {
        (meta.fps * f64::from(self.inner.options.preload_seconds)).ceil() as u64
    }

    /// Single-flight range fetch: joins the in-flight operation if one
    /// exists, no-ops once the stream is exhausted.
    async fn fetch_range(&self, start_frame: u64, count: u64) -> StreamResult<()> {
        match self.ensure_fetch(start_frame, count) {
            Some(fetch) => fetch.await,
            None => Ok(()),
        }
    }

    /// Install a fetch future in the in-flight slot, or hand back the one
    /// already there. `None` once the stream is exhausted.
    fn ensure_fetch(&self, start_frame: u64, count: u64) -> Option<SharedFetch> {
        let mut slot = self.inner.in_flight.lock();
        if let Some(existing) = slot.as_ref() {
            trace!(start_frame, count, "joining in-flight fetch");
            return Some(existing.clone());
        }
        if self.inner.state.read().completed {
            return None;
        }

        let inner = Arc::clone(&self.inner);
        let fetch = async move {
            let result = inner.fetch_and_merge(start_frame, count).await;
            // Clear the slot before resolving so the next caller can
            // start a fresh fetch.
            *inner.in_flight.lock() = None;
            result
        }
        .boxed()
        .shared();

        *slot = Some(fetch.clone());
        Some(fetch)
    }

    /// Detached refill ahead of playback; does not delay the current read.
    fn spawn_prefetch(&self, start_frame: u64, count: u64) {
        let Some(fetch) = self.ensure_fetch(start_frame, count) else {
            return;
        };
        let events = self.inner.events.clone();
        tokio::spawn(async move {
            if let Err(error) = fetch.await {
                warn!(start_frame, count, %error, "background prefetch failed");
                events.publish(StreamEvent::PrefetchFailed {
                    start_frame,
                    error: error.to_string(),
                });
            }
        });
    }
}

impl<A: VideoApi> Inner<A> {
    async fn fetch_and_merge(&self, start_frame: u64, count: u64) -> StreamResult<()> {
        debug!(stream = %self.stream_id, start_frame, count, "fetching frame range");
        let batch = self
            .api
            .frame_range(&self.stream_id, start_frame, count)
            .await?;

        if batch.frames.is_empty() {
            self.state.write().completed = true;
            debug!(stream = %self.stream_id, start_frame, "empty frame set, stream exhausted");
            self.events.publish(StreamEvent::EndOfStream);
            return Ok(());
        }

        let loaded = batch.frames.len() as u64;
        self.state.write().buffer.merge(batch.frames);
        trace!(stream = %self.stream_id, start_frame, loaded, "merged frame range");
        self.events.publish(StreamEvent::FramesLoaded {
            start_frame,
            count: loaded,
        });
        Ok(())
    }
}
