//! Core data model for ptplay.
//!
//! A parsed ProTracker module: title, sample bank, pattern grid and the
//! pattern sequence table. The parser in `pt-formats` produces a
//! [`Module`]; the sequencer in `pt-engine` consumes it.
//!
//! Everything here is immutable after load except the derived-buffer
//! caches inside [`Sample`], which only ever grow.

mod effects;
mod module;
mod pattern;
mod sample;
mod text;

pub use effects::{Effect, EffectKind};
pub use module::{Module, MAX_SEQUENCE_LENGTH, SAMPLE_COUNT};
pub use pattern::{Cell, Pattern, NO_PERIOD, ROWS_PER_PATTERN};
pub use sample::{pan_to_stereo, scale_volume, Sample, MAX_VOLUME, PCM_LIMIT};
pub use text::fit;
