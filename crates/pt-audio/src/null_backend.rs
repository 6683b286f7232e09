//! Silent sink for render-only playback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::traits::{AudioError, AudioSink, StreamHandle};

/// Accepts every stream and plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn stream(
        &self,
        _pcm: &[i16],
        _sample_rate: u32,
        _channels: u16,
        _looping: bool,
    ) -> Result<Arc<dyn StreamHandle>, AudioError> {
        Ok(Arc::new(NullStream::default()))
    }
}

#[derive(Debug, Default)]
struct NullStream {
    stopped: AtomicBool,
}

impl StreamHandle for NullStream {
    fn append(&self, _pcm: &[i16]) {}

    fn buffered_frames(&self) -> usize {
        0
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}
