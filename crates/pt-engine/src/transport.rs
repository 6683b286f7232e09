//! Live transport control.
//!
//! Commands are queued from any thread and applied by the sequencer at the
//! next row boundary.

use tokio::sync::mpsc;

/// A request to the running sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Stop,
    TogglePlaying,
    IncrementPattern,
    DecrementPattern,
    IncrementBpm,
    DecrementBpm,
    Mute(u8),
    Unmute(u8),
    ToggleMute(u8),
    /// Mute every other channel, or unmute all if this one is already
    /// the only one audible
    Solo(u8),
    UnmuteAll,
    /// Halt every voice and leave the run loop
    Shutdown,
}

/// Cloneable sender for [`TransportCommand`]s.
#[derive(Clone, Debug)]
pub struct TransportHandle {
    tx: mpsc::UnboundedSender<TransportCommand>,
}

impl TransportHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<TransportCommand>) -> Self {
        Self { tx }
    }

    /// Queue a command. Returns false once the sequencer is gone.
    pub fn send(&self, command: TransportCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    /// True once the sequencer has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Snapshot of the sequencer's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportCursor {
    /// Index into the played sequence
    pub position: usize,
    pub row: usize,
    pub bpm: u16,
    pub playing: bool,
    /// Sequence position a pattern change will land on at the next row
    /// boundary
    pub pending_jump: Option<usize>,
}
