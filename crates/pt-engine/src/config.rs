//! Engine settings.

use std::time::Duration;

/// Pan floor for hard-left channels; a pan of exactly 0 means mono.
const MIN_PAN: f32 = 1.0 / 64.0;

/// Playback settings that are not part of the module.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Tempo before any set-tempo effect
    pub initial_bpm: u16,
    /// Amount one bpm up/down command moves the tempo
    pub bpm_step: u16,
    /// How often a looping voice tops up its stream
    pub refeed_interval: Duration,
    /// `None` streams every voice mono. `Some(s)` pans channels
    /// left/right/right/left around the centre by `s / 2`.
    pub stereo_separation: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_bpm: 125,
            bpm_step: 1,
            refeed_interval: Duration::from_millis(10),
            stereo_separation: None,
        }
    }
}

impl EngineConfig {
    /// Pan position for a channel; 0.0 is mono.
    pub fn pan_for_channel(&self, channel: u8) -> f32 {
        let Some(separation) = self.stereo_separation else {
            return 0.0;
        };
        let offset = separation.clamp(0.0, 1.0) / 2.0;
        match channel % 4 {
            0 | 3 => (0.5 - offset).max(MIN_PAN),
            _ => 0.5 + offset,
        }
    }
}
