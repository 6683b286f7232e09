//! Shared tempo value.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Slowest tempo reachable by stepping.
pub const MIN_BPM: u16 = 1;

/// Fastest tempo reachable by stepping.
pub const MAX_BPM: u16 = 999;

/// Beats per minute, shared by the sequencer and its voices.
///
/// Clones refer to the same value. The last write wins.
#[derive(Clone, Debug)]
pub struct Tempo(Arc<AtomicU16>);

impl Tempo {
    pub fn new(bpm: u16) -> Self {
        Self(Arc::new(AtomicU16::new(bpm.clamp(MIN_BPM, MAX_BPM))))
    }

    pub fn get(&self) -> u16 {
        self.0.load(Ordering::Relaxed)
    }

    /// Set from an effect parameter. A tempo of 0 is ignored.
    pub fn set(&self, bpm: u16) {
        if bpm == 0 {
            warn!("ignoring tempo 0");
            return;
        }
        self.0.store(bpm.min(MAX_BPM), Ordering::Relaxed);
    }

    /// Move by `delta`, staying within [`MIN_BPM`]..=[`MAX_BPM`].
    pub fn step(&self, delta: i32) -> u16 {
        let bpm = (self.get() as i32 + delta).clamp(MIN_BPM as i32, MAX_BPM as i32) as u16;
        self.0.store(bpm, Ordering::Relaxed);
        bpm
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(125)
    }
}
