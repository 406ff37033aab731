#![forbid(unsafe_code)]

//! Client-side frame cache for remotely rendered ASCII video.
//!
//! A playback surface repeatedly asks for frame windows; [`VideoSession`]
//! answers from a local sparse buffer, fetches missing ranges from the
//! rendering service through [`VideoApi`], and keeps a lookahead buffer
//! filled so playback does not stall on network latency. At most one range
//! fetch is in flight per session; concurrent requests join the existing
//! operation instead of issuing duplicates.

pub mod api;
pub mod buffer;
pub mod config;
pub mod error;
pub mod events;
pub mod session;

pub use api::{FrameBatch, HttpVideoApi, StreamInfo, VideoApi};
pub use buffer::FrameBuffer;
pub use config::SessionOptions;
pub use error::{StreamError, StreamResult};
pub use events::{EventBus, StreamEvent};
pub use session::{StreamMeta, VideoSession};
