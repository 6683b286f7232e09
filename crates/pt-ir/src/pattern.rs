//! Pattern and cell types.

use crate::effects::Effect;

/// Rows in every MOD pattern.
pub const ROWS_PER_PATTERN: usize = 64;

/// Period value some trackers write for "no note" instead of 0.
pub const NO_PERIOD: u16 = 0xFFF;

/// A single cell in a pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Sample number (0 = keep the channel's current sample, 1-31 otherwise)
    pub sample: u8,
    /// Amiga period (0 or 0xFFF = no note)
    pub period: u16,
    /// Effect column
    pub effect: Effect,
}

impl Cell {
    /// Create an empty cell.
    pub const fn empty() -> Self {
        Self {
            sample: 0,
            period: 0,
            effect: Effect::new(0, 0),
        }
    }

    /// Returns true if the cell triggers a note.
    pub fn has_note(&self) -> bool {
        self.period != 0 && self.period != NO_PERIOD
    }

    /// Returns true if the cell is completely empty.
    pub fn is_empty(&self) -> bool {
        self.sample == 0 && self.period == 0 && self.effect.is_empty()
    }
}

/// A pattern: 64 rows by `channels` columns, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    /// Number of channels
    pub channels: u8,
    /// Cell data: `cells[row * channels + channel]`
    pub cells: Vec<Cell>,
}

impl Pattern {
    /// Create a new pattern with empty cells.
    pub fn new(channels: u8) -> Self {
        Self {
            channels,
            cells: vec![Cell::empty(); ROWS_PER_PATTERN * channels as usize],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        match self.channels {
            0 => 0,
            n => self.cells.len() / n as usize,
        }
    }

    /// Get a reference to a cell.
    pub fn cell(&self, row: usize, channel: u8) -> &Cell {
        debug_assert!(channel < self.channels);
        &self.cells[row * self.channels as usize + channel as usize]
    }

    /// Get a mutable reference to a cell.
    pub fn cell_mut(&mut self, row: usize, channel: u8) -> &mut Cell {
        debug_assert!(channel < self.channels);
        &mut self.cells[row * self.channels as usize + channel as usize]
    }

    /// All cells of one row, one per channel.
    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * self.channels as usize;
        &self.cells[start..start + self.channels as usize]
    }
}
