//! Playback engine for ptplay.
//!
//! The [`Sequencer`] walks a [`pt_ir::Module`] row by row on a tempo clock
//! and hands each cell to its channel's [`Voice`]. Voices render sample
//! buffers and stream them to a [`pt_audio::AudioSink`], one stream per
//! voice.

mod config;
mod frequency;
mod render;
mod sequencer;
mod tempo;
mod transport;
mod voice;

pub use config::EngineConfig;
pub use frequency::{
    note_to_frequency, period_to_note, row_duration, NO_NOTE, PERIOD_TABLE, REFERENCE_NOTE,
};
pub use render::{NullRenderer, RowRenderer, RowView};
pub use sequencer::{Sequencer, Step};
pub use tempo::Tempo;
pub use transport::{TransportCommand, TransportCursor, TransportHandle};
pub use voice::{Voice, VoiceState};
