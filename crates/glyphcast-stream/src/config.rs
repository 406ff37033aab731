#![forbid(unsafe_code)]

/// Tuning knobs for a [`crate::VideoSession`].
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Seconds of playback to keep buffered ahead of the read position.
    ///
    /// The initial priming fetch requests `fps * preload_seconds` frames,
    /// and the lookahead scheduler refills toward
    /// `fps * preload_seconds + window` frames.
    pub preload_seconds: u32,
    /// Capacity of the events broadcast channel.
    pub events_channel_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            preload_seconds: 5,
            events_channel_capacity: 32,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set seconds of lookahead to keep buffered.
    pub fn with_preload_seconds(mut self, seconds: u32) -> Self {
        self.preload_seconds = seconds;
        self
    }

    /// Set events broadcast channel capacity.
    pub fn with_events_channel_capacity(mut self, capacity: usize) -> Self {
        self.events_channel_capacity = capacity;
        self
    }
}
