//! The parsed module.

use arrayvec::ArrayString;

use crate::pattern::Pattern;
use crate::sample::Sample;

/// Sample slots in a 31-instrument module.
pub const SAMPLE_COUNT: usize = 31;

/// Entries in the pattern sequence table.
pub const MAX_SEQUENCE_LENGTH: usize = 128;

/// A complete ProTracker module.
#[derive(Debug)]
pub struct Module {
    /// Song title (NUL-trimmed)
    pub title: ArrayString<20>,
    /// Format tag read at offset 1080 (`M.K.`, `8CHN`, ...)
    pub format_tag: [u8; 4],
    /// Number of channels, derived from the format tag
    pub channel_count: u8,
    /// Number of sequence entries that make up the song
    pub song_length: u8,
    /// Sequence position playback resumes from after the last entry
    pub restart_position: u8,
    /// All 128 sequence entries as stored; only `song_length` are played
    pub sequence_table: [u8; MAX_SEQUENCE_LENGTH],
    /// Patterns, `max(sequence_table) + 1` of them
    pub patterns: Vec<Pattern>,
    /// Sample bank, 1-indexed from pattern data
    pub samples: Vec<Sample>,
}

impl Module {
    /// The played part of the sequence table.
    pub fn sequence(&self) -> &[u8] {
        let len = (self.song_length as usize).min(MAX_SEQUENCE_LENGTH);
        &self.sequence_table[..len]
    }

    /// Pattern played at a sequence position.
    pub fn pattern_at(&self, position: usize) -> Option<&Pattern> {
        let index = *self.sequence().get(position)?;
        self.patterns.get(index as usize)
    }

    /// Sample by its 1-based number as used in pattern cells.
    pub fn sample(&self, number: u8) -> Option<&Sample> {
        match number {
            0 => None,
            n => self.samples.get(n as usize - 1),
        }
    }

    /// Sequence position to continue from once the song ends.
    ///
    /// Restart bytes past the end of the song (many trackers write 127)
    /// fall back to the first position.
    pub fn restart_position(&self) -> usize {
        let restart = self.restart_position as usize;
        if restart < self.sequence().len() {
            restart
        } else {
            0
        }
    }

    /// Format tag as text, for display.
    pub fn format_name(&self) -> String {
        String::from_utf8_lossy(&self.format_tag).into_owned()
    }
}
