//! Period and note conversion.
//!
//! Cells store Amiga periods. The player maps a period to the nearest note
//! in [`PERIOD_TABLE`], then derives the stream's sample rate from the note
//! on an equal-tempered scale anchored at [`REFERENCE_NOTE`].

use std::time::Duration;

/// Note value meaning "no note in this cell".
pub const NO_NOTE: i32 = -1;

/// Note number the rate formula is anchored to.
pub const REFERENCE_NOTE: i32 = 69;

/// Rate of [`REFERENCE_NOTE`] before scaling, in Hz.
const CALIBRATION: f64 = 832.0;

/// Scale from the calibration tone to a playback sample rate.
const RATE_SCALE: f64 = 16.0;

/// Finetune steps per semitone.
const FINETUNE_DIVISOR: f64 = 64.0;

/// Offset from a table index to its note number.
const NOTE_OFFSET: i32 = 25;

/// Rows per beat; a row lasts a quarter beat.
const ROWS_PER_BEAT: u64 = 4;

/// Finetune-0 periods, highest (lowest pitch) first, seven octaves.
///
/// The middle three octaves are the ProTracker table (856..=113); the
/// outer octaves extend it by doubling and halving.
pub const PERIOD_TABLE: [u16; 84] = [
    3424, 3232, 3048, 2880, 2712, 2560, 2416, 2280, 2152, 2032, 1920, 1812,
    1712, 1616, 1525, 1440, 1357, 1281, 1209, 1141, 1077, 1017, 961, 907,
    856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453,
    428, 404, 381, 360, 339, 320, 302, 285, 269, 254, 240, 226,
    214, 202, 190, 180, 170, 160, 151, 143, 135, 127, 120, 113,
    107, 101, 95, 90, 85, 80, 76, 71, 67, 64, 60, 57,
    53, 50, 47, 45, 42, 40, 38, 36, 34, 32, 30, 28,
];

/// Map a cell period to a note number.
///
/// 0 and 0xFFF are empty cells and give [`NO_NOTE`]. Otherwise the first
/// table entry not above `period` is located; a period strictly closer to
/// the entry before it rounds down a note, ties round up.
pub fn period_to_note(period: u16) -> i32 {
    if period == 0 || period == 0xFFF {
        return NO_NOTE;
    }
    let Some(i) = PERIOD_TABLE.iter().position(|&p| period >= p) else {
        return PERIOD_TABLE.len() as i32 + NOTE_OFFSET - 1;
    };
    let note = i as i32 + NOTE_OFFSET;
    if i == 0 || period == PERIOD_TABLE[i] {
        return note;
    }
    let above = PERIOD_TABLE[i - 1] - period;
    let below = period - PERIOD_TABLE[i];
    if above < below {
        note - 1
    } else {
        note
    }
}

/// Playback sample rate for `note` with a sample's finetune.
pub fn note_to_frequency(note: i32, finetune: i8) -> u32 {
    let semitones = (note - REFERENCE_NOTE) as f64 + finetune as f64 / FINETUNE_DIVISOR;
    (CALIBRATION * (semitones / 12.0).exp2() * RATE_SCALE).floor() as u32
}

/// Length of one row at `bpm`. A bpm of 0 is treated as 1.
pub fn row_duration(bpm: u16) -> Duration {
    const NANOS_PER_MINUTE: u64 = 60_000_000_000;
    Duration::from_nanos(NANOS_PER_MINUTE / ROWS_PER_BEAT / bpm.max(1) as u64)
}
