//! Sample data and derived playback buffers.
//!
//! PCM is held as signed 16-bit mono regardless of the source depth. Voices
//! never copy it; they ask the sample for a volume-scaled and optionally
//! panned view, which the sample computes once and caches. Module content
//! never changes after load, so cache entries are never invalidated.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use arrayvec::ArrayString;
use parking_lot::Mutex;

use crate::text::fit;

/// Full-scale channel volume.
pub const MAX_VOLUME: u8 = 64;

/// Magnitude limit for scaled samples.
pub const PCM_LIMIT: i32 = 32767;

/// A sample definition plus its PCM payload.
#[derive(Debug)]
pub struct Sample {
    /// Sample name
    pub name: ArrayString<22>,
    /// Default volume (0-64)
    pub volume: u8,
    /// Finetune (-7..=7)
    pub finetune: i8,
    /// Length in words (2 bytes of 8-bit data each)
    pub length: u16,
    /// Loop start in words
    pub loop_start: u16,
    /// Loop length in words (1 = no loop)
    pub loop_length: u16,
    pcm: Arc<[i16]>,
    cache: Mutex<TransformCache>,
}

/// Cache key: volume plus the bit pattern of the pan position.
type ViewKey = (u8, u32);

#[derive(Debug, Default)]
struct TransformCache {
    scaled: HashMap<u8, Arc<[i16]>>,
    panned: HashMap<ViewKey, Arc<[i16]>>,
    tails: HashMap<ViewKey, Arc<[i16]>>,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: ArrayString::new(),
            volume: MAX_VOLUME,
            finetune: 0,
            length: 0,
            loop_start: 0,
            loop_length: 1,
            pcm: Arc::from(Vec::new()),
            cache: Mutex::new(TransformCache::default()),
        }
    }
}

impl Sample {
    /// Create a new empty sample.
    pub fn new(name: &str) -> Self {
        Self {
            name: fit(name),
            ..Self::default()
        }
    }

    /// Attach signed 8-bit PCM, widening each byte to 16 bits.
    pub fn set_pcm8(&mut self, data: &[u8]) {
        let widened: Vec<i16> = data.iter().map(|&b| ((b as i8) as i16) << 8).collect();
        self.set_pcm16(widened);
    }

    /// Attach 16-bit PCM as-is.
    pub fn set_pcm16(&mut self, data: Vec<i16>) {
        self.pcm = Arc::from(data);
        *self.cache.get_mut() = TransformCache::default();
    }

    /// The unscaled mono PCM.
    pub fn pcm(&self) -> &Arc<[i16]> {
        &self.pcm
    }

    /// Length of the PCM in sample frames.
    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    /// Returns true if the sample has no data.
    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    /// Whether playback should sustain the loop region.
    ///
    /// A loop length of one word is the format's "no loop" marker.
    pub fn should_loop(&self) -> bool {
        self.loop_length != 1
    }

    /// Loop region in mono frame indices, clipped to the PCM length.
    pub fn loop_range(&self) -> Range<usize> {
        let start = (self.loop_start as usize * 2).min(self.pcm.len());
        let end = ((self.loop_start as usize + self.loop_length as usize) * 2).min(self.pcm.len());
        start..end
    }

    /// PCM scaled to `volume`.
    ///
    /// The sample's own volume and 0 both return the base PCM untouched;
    /// 0 means "keep", not silence.
    pub fn scaled(&self, volume: u8) -> Arc<[i16]> {
        if volume == self.volume || volume == 0 {
            return self.pcm.clone();
        }
        let mut cache = self.cache.lock();
        cache
            .scaled
            .entry(volume)
            .or_insert_with(|| Arc::from(scale_volume(&self.pcm, volume)))
            .clone()
    }

    /// PCM at `volume`, interleaved to stereo when `pan` is non-zero.
    pub fn render(&self, volume: u8, pan: f32) -> Arc<[i16]> {
        let scaled = self.scaled(volume);
        if pan == 0.0 {
            return scaled;
        }
        let mut cache = self.cache.lock();
        cache
            .panned
            .entry(view_key(volume, pan))
            .or_insert_with(|| Arc::from(pan_to_stereo(&scaled, pan)))
            .clone()
    }

    /// The loop region of [`Sample::render`], re-streamed to sustain a loop.
    pub fn loop_tail(&self, volume: u8, pan: f32) -> Arc<[i16]> {
        let scaled = self.scaled(volume);
        let range = self.loop_range();
        let mut cache = self.cache.lock();
        cache
            .tails
            .entry(view_key(volume, pan))
            .or_insert_with(|| {
                let mono = &scaled[range];
                if pan == 0.0 {
                    Arc::from(mono)
                } else {
                    Arc::from(pan_to_stereo(mono, pan))
                }
            })
            .clone()
    }
}

fn view_key(volume: u8, pan: f32) -> ViewKey {
    (volume, pan.to_bits())
}

/// Scale every sample by `volume / 64`, flooring and clamping to ±32767.
pub fn scale_volume(pcm: &[i16], volume: u8) -> Vec<i16> {
    pcm.iter()
        .map(|&s| {
            (s as i32 * volume as i32)
                .div_euclid(MAX_VOLUME as i32)
                .clamp(-PCM_LIMIT, PCM_LIMIT) as i16
        })
        .collect()
}

/// Split mono PCM into interleaved stereo: left gets `1 - pan`, right gets `pan`.
///
/// Values round half up, so -2.5 becomes -2.
pub fn pan_to_stereo(pcm: &[i16], pan: f32) -> Vec<i16> {
    let pan = pan.clamp(0.0, 1.0) as f64;
    let mut out = Vec::with_capacity(pcm.len() * 2);
    for &s in pcm {
        let s = s as f64;
        out.push(round_half_up(s * (1.0 - pan)));
        out.push(round_half_up(s * pan));
    }
    out
}

fn round_half_up(value: f64) -> i16 {
    (value + 0.5).floor() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_with(pcm: &[i16], volume: u8) -> Sample {
        let mut sample = Sample::new("lead");
        sample.volume = volume;
        sample.set_pcm16(pcm.to_vec());
        sample
    }

    #[test]
    fn long_names_are_truncated() {
        let sample = Sample::new("a sample name longer than the field");
        assert_eq!(sample.name.as_str(), "a sample name longer t");
    }

    #[test]
    fn widening_preserves_sign() {
        let mut sample = Sample::new("s");
        sample.set_pcm8(&[0x00, 0x01, 0x7F, 0x80, 0xFF]);
        assert_eq!(&sample.pcm()[..], &[0, 256, 32512, -32768, -256]);
    }

    #[test]
    fn base_volume_and_zero_are_identity() {
        let sample = sample_with(&[1000, -1000, 32767], 48);
        assert!(Arc::ptr_eq(&sample.scaled(48), sample.pcm()));
        assert!(Arc::ptr_eq(&sample.scaled(0), sample.pcm()));
    }

    #[test]
    fn half_volume_floors() {
        let sample = sample_with(&[1001, -1001, 32767, -32768], 64);
        assert_eq!(&sample.scaled(32)[..], &[500, -501, 16383, -16384]);
    }

    #[test]
    fn scaled_never_exceeds_limit() {
        let scaled = scale_volume(&[i16::MIN, i16::MAX], 64);
        assert_eq!(scaled, vec![-32767, 32767]);
    }

    #[test]
    fn scaled_buffers_are_cached() {
        let sample = sample_with(&[100, 200], 64);
        let a = sample.scaled(10);
        let b = sample.scaled(10);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn zero_pan_is_mono() {
        let sample = sample_with(&[5, -5], 64);
        assert!(Arc::ptr_eq(&sample.render(64, 0.0), sample.pcm()));
    }

    #[test]
    fn center_pan_splits_evenly() {
        let stereo = pan_to_stereo(&[100, -100, 7], 0.5);
        assert_eq!(stereo, vec![50, 50, -50, -50, 4, 4]);
    }

    #[test]
    fn hard_pan_routes_to_one_side() {
        assert_eq!(pan_to_stereo(&[300], 1.0), vec![0, 300]);
    }

    #[test]
    fn negative_halves_round_up() {
        assert_eq!(pan_to_stereo(&[-5], 0.5), vec![-2, -2]);
    }

    #[test]
    fn loop_flag_uses_length_one_marker() {
        let mut sample = Sample::new("s");
        assert!(!sample.should_loop());
        sample.loop_length = 8;
        assert!(sample.should_loop());
        sample.loop_length = 0;
        assert!(sample.should_loop());
    }

    #[test]
    fn loop_tail_is_word_addressed() {
        let pcm: Vec<i16> = (0..20).collect();
        let mut sample = sample_with(&pcm, 64);
        sample.loop_start = 2;
        sample.loop_length = 3;
        // words 2..5 -> frames 4..10
        assert_eq!(&sample.loop_tail(64, 0.0)[..], &[4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn loop_tail_clips_to_pcm() {
        let mut sample = sample_with(&[1, 2, 3, 4], 64);
        sample.loop_start = 1;
        sample.loop_length = 100;
        assert_eq!(&sample.loop_tail(64, 0.0)[..], &[3, 4]);
    }

    #[test]
    fn panned_loop_tail_is_stereo() {
        let mut sample = sample_with(&[0, 0, 10, 20], 64);
        sample.loop_start = 1;
        sample.loop_length = 2;
        assert_eq!(&sample.loop_tail(64, 0.5)[..], &[5, 5, 10, 10]);
    }
}
