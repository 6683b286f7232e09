//! Recording sink: keeps every stream request for inspection.
//!
//! Nothing is played. Appended data counts as consumed immediately, so a
//! looping stream is topped up on every refeed tick.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::traits::{AudioError, AudioSink, StreamHandle};

/// What one stream received.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamRecord {
    pub sample_rate: u32,
    pub channels: u16,
    pub looping: bool,
    /// PCM passed when the stream was opened
    pub initial: Vec<i16>,
    /// Number of `append` calls accepted
    pub appends: usize,
    /// Samples accepted through `append`
    pub appended_samples: usize,
    pub stopped: bool,
}

/// Sink that records stream requests instead of playing them.
#[derive(Clone, Default)]
pub struct CaptureSink {
    streams: Arc<Mutex<Vec<Arc<Mutex<StreamRecord>>>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stream opened so far, oldest first.
    pub fn records(&self) -> Vec<StreamRecord> {
        self.streams.lock().iter().map(|r| r.lock().clone()).collect()
    }

    /// Streams opened so far.
    pub fn stream_count(&self) -> usize {
        self.streams.lock().len()
    }

    /// Streams not yet stopped.
    pub fn live_count(&self) -> usize {
        self.streams.lock().iter().filter(|r| !r.lock().stopped).count()
    }
}

impl AudioSink for CaptureSink {
    fn name(&self) -> &'static str {
        "capture"
    }

    fn stream(
        &self,
        pcm: &[i16],
        sample_rate: u32,
        channels: u16,
        looping: bool,
    ) -> Result<Arc<dyn StreamHandle>, AudioError> {
        let record = Arc::new(Mutex::new(StreamRecord {
            sample_rate,
            channels,
            looping,
            initial: pcm.to_vec(),
            ..Default::default()
        }));
        self.streams.lock().push(record.clone());
        Ok(Arc::new(CaptureStream(record)))
    }
}

struct CaptureStream(Arc<Mutex<StreamRecord>>);

impl StreamHandle for CaptureStream {
    fn append(&self, pcm: &[i16]) {
        let mut record = self.0.lock();
        if !record.stopped {
            record.appends += 1;
            record.appended_samples += pcm.len();
        }
    }

    fn buffered_frames(&self) -> usize {
        0
    }

    fn stop(&self) {
        self.0.lock().stopped = true;
    }

    fn is_stopped(&self) -> bool {
        self.0.lock().stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_streams_and_appends() {
        let sink = CaptureSink::new();
        let handle = sink.stream(&[1, 2, 3], 8363, 1, true).unwrap();
        handle.append(&[4, 5]);
        handle.append(&[4, 5]);
        handle.stop();
        handle.append(&[6]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].initial, vec![1, 2, 3]);
        assert_eq!(records[0].sample_rate, 8363);
        assert!(records[0].looping);
        assert_eq!(records[0].appends, 2);
        assert_eq!(records[0].appended_samples, 4);
        assert!(records[0].stopped);
        assert_eq!(sink.live_count(), 0);
    }
}
