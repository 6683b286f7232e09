//! One playback lane.
//!
//! A voice remembers the channel's sample, note, volume and last effect
//! across rows, and owns at most one sink stream at a time. Looping
//! samples are sustained by a refeed task that keeps appending the loop
//! region until the voice is halted.

use std::sync::Arc;
use std::time::Duration;

use pt_audio::{AudioSink, StreamHandle};
use pt_ir::{Effect, EffectKind, Module, MAX_VOLUME};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::frequency::{note_to_frequency, NO_NOTE};
use crate::tempo::Tempo;

/// What a voice is doing right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    /// Nothing streaming
    Idle,
    /// A stream is live
    Playing,
    /// State is tracked but nothing reaches the sink
    Muted,
}

/// A channel's playback state and its sink stream.
pub struct Voice {
    channel: u8,
    module: Arc<Module>,
    sink: Arc<dyn AudioSink>,
    tempo: Tempo,
    pan: f32,
    refeed_interval: Duration,
    /// 1-based sample number; 0 until one is selected
    sample: u8,
    note: i32,
    volume: u8,
    effect: Effect,
    muted: bool,
    stream: Option<Arc<dyn StreamHandle>>,
    refeed: Option<JoinHandle<()>>,
}

impl Voice {
    pub fn new(
        channel: u8,
        module: Arc<Module>,
        sink: Arc<dyn AudioSink>,
        tempo: Tempo,
        pan: f32,
        refeed_interval: Duration,
    ) -> Self {
        Self {
            channel,
            module,
            sink,
            tempo,
            pan,
            refeed_interval,
            sample: 0,
            note: NO_NOTE,
            volume: MAX_VOLUME,
            effect: Effect::default(),
            muted: false,
            stream: None,
            refeed: None,
        }
    }

    /// Apply one cell to this voice.
    ///
    /// `sample_number` 0 keeps the current sample. A new sample resets the
    /// volume to its default, but a set-volume effect in the same cell
    /// wins. A [`NO_NOTE`] cell updates state without retriggering.
    pub fn play(&mut self, note: i32, sample_number: u8, effect: Effect) {
        if sample_number > 0 && sample_number != self.sample {
            if let Some(sample) = self.module.sample(sample_number) {
                self.volume = sample.volume;
            }
            self.sample = sample_number;
        }

        self.effect = effect;
        match effect.kind() {
            EffectKind::SetVolume => self.volume = effect.param.min(MAX_VOLUME),
            EffectKind::SetTempo => self.tempo.set(effect.param as u16),
            kind if kind != EffectKind::None && !kind.is_implemented() => {
                trace!(channel = self.channel, ?kind, "effect ignored");
            }
            _ => {}
        }

        if note == NO_NOTE {
            return;
        }
        self.note = note;
        self.halt();

        let Some(sample) = self.module.sample(self.sample) else {
            return;
        };
        if sample.is_empty() {
            trace!(channel = self.channel, sample = self.sample, "empty sample");
            return;
        }

        let buffer = sample.render(self.volume, self.pan);
        let rate = note_to_frequency(note, sample.finetune);
        if self.muted {
            return;
        }

        let channels = if self.pan == 0.0 { 1 } else { 2 };
        let tail = sample
            .should_loop()
            .then(|| sample.loop_tail(self.volume, self.pan))
            .filter(|tail| !tail.is_empty());

        let stream = match self.sink.stream(&buffer, rate, channels, tail.is_some()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(channel = self.channel, error = %e, "could not open stream");
                return;
            }
        };
        trace!(
            channel = self.channel,
            note,
            sample = self.sample,
            volume = self.volume,
            rate,
            looping = tail.is_some(),
            "trigger"
        );

        if let Some(tail) = tail {
            self.refeed =
                spawn_refeed(stream.clone(), tail, rate, channels, self.refeed_interval);
        }
        self.stream = Some(stream);
    }

    /// Stop the stream and cancel any loop refeed.
    pub fn halt(&mut self) {
        if let Some(task) = self.refeed.take() {
            task.abort();
        }
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
    }

    pub fn mute(&mut self) {
        self.muted = true;
    }

    pub fn unmute(&mut self) {
        self.muted = false;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn state(&self) -> VoiceState {
        if self.muted {
            VoiceState::Muted
        } else if self.stream.as_ref().is_some_and(|s| !s.is_stopped()) {
            VoiceState::Playing
        } else {
            VoiceState::Idle
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Current 1-based sample number, if one has been selected.
    pub fn sample(&self) -> Option<u8> {
        (self.sample > 0).then_some(self.sample)
    }

    /// Last triggered note, or [`NO_NOTE`].
    pub fn note(&self) -> i32 {
        self.note
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }
}

impl Drop for Voice {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Keep a looping stream fed with its loop region.
///
/// Each tick tops the queue up to [`refeed_target`] frames with whole
/// copies of the loop. Needs a tokio runtime; without one the loop plays
/// through once.
fn spawn_refeed(
    stream: Arc<dyn StreamHandle>,
    tail: Arc<[i16]>,
    rate: u32,
    channels: u16,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    let Ok(runtime) = Handle::try_current() else {
        debug!("no runtime, loop will not be sustained");
        return None;
    };
    let tail_frames = tail.len() / channels as usize;
    let target = refeed_target(rate, interval, tail_frames);
    // Bounded so a sink that never reports a backlog can't spin the task
    let max_appends = target.div_ceil(tail_frames);
    Some(runtime.spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if stream.is_stopped() {
                break;
            }
            for _ in 0..max_appends {
                if stream.buffered_frames() >= target {
                    break;
                }
                stream.append(&tail);
            }
        }
    }))
}

/// Frames to keep queued: two refeed intervals of playback, and at least
/// one whole loop.
fn refeed_target(rate: u32, interval: Duration, tail_frames: usize) -> usize {
    let frames = rate as u128 * interval.as_nanos() * 2 / 1_000_000_000;
    (frames as usize).max(tail_frames)
}
