//! Audio sink traits and error types.

use std::sync::Arc;

/// Error type for audio operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// No usable backend or device
    #[error("no audio sink available: {0}")]
    SinkUnavailable(String),
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
}

/// An audio output that accepts independent PCM streams.
pub trait AudioSink: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Start streaming `pcm` (interleaved when `channels == 2`) at
    /// `sample_rate`.
    ///
    /// A `looping` stream stays open after its data runs out, waiting for
    /// [`StreamHandle::append`]; a one-shot stream ends by itself.
    fn stream(
        &self,
        pcm: &[i16],
        sample_rate: u32,
        channels: u16,
        looping: bool,
    ) -> Result<Arc<dyn StreamHandle>, AudioError>;
}

/// A live stream opened by [`AudioSink::stream`].
pub trait StreamHandle: Send + Sync {
    /// Queue more PCM after what is already buffered. No-op once stopped.
    fn append(&self, pcm: &[i16]);

    /// Frames queued but not yet played.
    fn buffered_frames(&self) -> usize;

    /// Stop immediately and drop anything still queued.
    fn stop(&self);

    fn is_stopped(&self) -> bool;
}
