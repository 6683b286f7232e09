//! Row display hook.

use pt_ir::Cell;

/// One row as it is about to play.
#[derive(Debug)]
pub struct RowView<'a> {
    /// Index into the played sequence
    pub position: usize,
    /// Pattern number at that position
    pub pattern: u8,
    pub row: usize,
    pub cells: &'a [Cell],
    /// Per-channel mute flags
    pub muted: &'a [bool],
    pub bpm: u16,
}

/// Receives every row the sequencer reaches. Display only.
pub trait RowRenderer: Send {
    fn render(&mut self, view: &RowView<'_>);
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RowRenderer for NullRenderer {
    fn render(&mut self, _view: &RowView<'_>) {}
}
