//! Song transport.
//!
//! The sequencer owns the cursor (sequence position, row, tempo) and one
//! [`Voice`] per channel. Each row it renders the cells, hands them to the
//! voices and waits one row length at the current tempo. Transport
//! commands are applied between rows, never mid-wait.

use std::sync::Arc;
use std::time::Duration;

use pt_audio::AudioSink;
use pt_ir::{EffectKind, Module};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::frequency::{period_to_note, row_duration};
use crate::render::{NullRenderer, RowRenderer, RowView};
use crate::tempo::Tempo;
use crate::transport::{TransportCommand, TransportCursor, TransportHandle};
use crate::voice::Voice;

/// Outcome of one [`Sequencer::step_row`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Not playing; every voice was halted
    Halted,
    /// A pattern change was applied instead of playing the row
    Jumped,
    /// The row was dispatched; wait this long before the next one
    Played { wait: Duration },
}

/// Drives a module through its voices.
pub struct Sequencer {
    module: Arc<Module>,
    voices: Vec<Voice>,
    tempo: Tempo,
    config: EngineConfig,
    position: usize,
    row: usize,
    playing: bool,
    /// Sequence position to move to at the next row boundary
    pending_jump: Option<usize>,
    shutdown: bool,
    commands: mpsc::UnboundedReceiver<TransportCommand>,
    handle: TransportHandle,
    renderer: Box<dyn RowRenderer>,
}

impl Sequencer {
    pub fn new(module: Arc<Module>, sink: Arc<dyn AudioSink>, config: EngineConfig) -> Self {
        let tempo = Tempo::new(config.initial_bpm);
        let voices = (0..module.channel_count)
            .map(|ch| {
                Voice::new(
                    ch,
                    module.clone(),
                    sink.clone(),
                    tempo.clone(),
                    config.pan_for_channel(ch),
                    config.refeed_interval,
                )
            })
            .collect();
        let (tx, commands) = mpsc::unbounded_channel();

        Self {
            module,
            voices,
            tempo,
            config,
            position: 0,
            row: 0,
            playing: false,
            pending_jump: None,
            shutdown: false,
            commands,
            handle: TransportHandle::new(tx),
            renderer: Box::new(NullRenderer),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn RowRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// A sender for live transport commands.
    pub fn transport(&self) -> TransportHandle {
        self.handle.clone()
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    pub fn bpm(&self) -> u16 {
        self.tempo.get()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn cursor(&self) -> TransportCursor {
        TransportCursor {
            position: self.position,
            row: self.row,
            bpm: self.tempo.get(),
            playing: self.playing,
            pending_jump: self.pending_jump,
        }
    }

    /// Start playing from the current cursor and keep going until
    /// [`TransportCommand::Shutdown`].
    pub async fn play(&mut self) {
        self.start();
        self.run().await;
    }

    /// Run loop. Stays paused while not playing, waiting for commands.
    pub async fn run(&mut self) {
        loop {
            self.drain_commands();
            if self.shutdown {
                break;
            }

            let row_start = Instant::now();
            match self.step_row() {
                Step::Played { wait } => time::sleep_until(row_start + wait).await,
                Step::Jumped => {}
                // Our own handle keeps the channel open, so this only waits
                Step::Halted => {
                    if let Some(command) = self.commands.recv().await {
                        self.apply(command);
                    }
                }
            }
        }
        self.halt_all();
        debug!("sequencer stopped");
    }

    /// Process the row under the cursor and advance.
    ///
    /// A set-tempo effect anywhere in the row changes the wait returned for
    /// that same row. With a pattern change pending, the row is rendered but
    /// not played and the cursor moves to row 0 of the target.
    pub fn step_row(&mut self) -> Step {
        if !self.playing {
            self.halt_all();
            return Step::Halted;
        }

        let module = self.module.clone();
        let Some(pattern) = module.pattern_at(self.position) else {
            warn!(position = self.position, "no pattern at sequence position");
            self.playing = false;
            self.halt_all();
            return Step::Halted;
        };
        let cells = pattern.row(self.row);

        let muted: Vec<bool> = self.voices.iter().map(Voice::is_muted).collect();
        self.renderer.render(&RowView {
            position: self.position,
            pattern: module.sequence()[self.position],
            row: self.row,
            cells,
            muted: &muted,
            bpm: self.tempo.get(),
        });

        if let Some(target) = self.pending_jump.take() {
            self.position = target;
            self.row = 0;
            self.halt_all();
            debug!(position = self.position, "jumped");
            return Step::Jumped;
        }

        for (voice, cell) in self.voices.iter_mut().zip(cells) {
            if cell.effect.kind() == EffectKind::SetTempo {
                self.tempo.set(cell.effect.param as u16);
            }
            voice.play(period_to_note(cell.period), cell.sample, cell.effect);
        }

        let wait = row_duration(self.tempo.get());
        trace!(position = self.position, row = self.row, ?wait, "row");
        self.advance(pattern.rows());
        Step::Played { wait }
    }

    fn advance(&mut self, rows: usize) {
        self.row += 1;
        if self.row < rows {
            return;
        }
        self.row = 0;
        self.position += 1;
        if self.position >= self.module.sequence().len() {
            self.position = self.module.restart_position();
            debug!(restart = self.position, "song looped");
        }
    }

    /// Apply every queued command.
    pub fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    pub fn apply(&mut self, command: TransportCommand) {
        debug!(?command, "transport");
        match command {
            TransportCommand::Play => self.start(),
            TransportCommand::Stop => self.stop(),
            TransportCommand::TogglePlaying => self.toggle_playing(),
            TransportCommand::IncrementPattern => self.increment_pattern(),
            TransportCommand::DecrementPattern => self.decrement_pattern(),
            TransportCommand::IncrementBpm => self.increment_bpm(),
            TransportCommand::DecrementBpm => self.decrement_bpm(),
            TransportCommand::Mute(ch) => self.mute(ch),
            TransportCommand::Unmute(ch) => self.unmute(ch),
            TransportCommand::ToggleMute(ch) => self.toggle_mute(ch),
            TransportCommand::Solo(ch) => self.solo(ch),
            TransportCommand::UnmuteAll => self.unmute_all(),
            TransportCommand::Shutdown => {
                self.playing = false;
                self.shutdown = true;
            }
        }
    }

    pub fn start(&mut self) {
        self.playing = true;
    }

    /// Takes effect at the next row boundary.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn toggle_playing(&mut self) {
        self.playing = !self.playing;
    }

    /// Move to the next sequence position at the next row boundary.
    pub fn increment_pattern(&mut self) {
        let last = self.module.sequence().len().saturating_sub(1);
        let from = self.pending_jump.unwrap_or(self.position);
        self.pending_jump = Some((from + 1).min(last));
    }

    /// Move to the previous sequence position at the next row boundary.
    pub fn decrement_pattern(&mut self) {
        let from = self.pending_jump.unwrap_or(self.position);
        self.pending_jump = Some(from.saturating_sub(1));
    }

    pub fn increment_bpm(&mut self) {
        self.tempo.step(self.config.bpm_step as i32);
    }

    pub fn decrement_bpm(&mut self) {
        self.tempo.step(-(self.config.bpm_step as i32));
    }

    /// Mute a channel and silence it now.
    pub fn mute(&mut self, channel: u8) {
        if let Some(voice) = self.voice_mut(channel) {
            voice.mute();
            voice.halt();
        }
    }

    pub fn unmute(&mut self, channel: u8) {
        if let Some(voice) = self.voice_mut(channel) {
            voice.unmute();
        }
    }

    pub fn toggle_mute(&mut self, channel: u8) {
        if let Some(voice) = self.voice_mut(channel) {
            voice.toggle_mute();
            voice.halt();
        }
    }

    /// Leave only `channel` audible. Soloing a channel that already is the
    /// only audible one unmutes everything.
    pub fn solo(&mut self, channel: u8) {
        let target = channel as usize;
        let Some(voice) = self.voices.get(target) else {
            debug!(channel, "solo on missing channel");
            return;
        };
        let others_muted = self
            .voices
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target)
            .all(|(_, v)| v.is_muted());

        if !voice.is_muted() && others_muted {
            for voice in &mut self.voices {
                voice.unmute();
                voice.halt();
            }
            return;
        }
        for (i, voice) in self.voices.iter_mut().enumerate() {
            if i == target {
                voice.unmute();
            } else {
                voice.mute();
                voice.halt();
            }
        }
    }

    pub fn unmute_all(&mut self) {
        for voice in &mut self.voices {
            voice.unmute();
        }
    }

    fn voice_mut(&mut self, channel: u8) -> Option<&mut Voice> {
        let voice = self.voices.get_mut(channel as usize);
        if voice.is_none() {
            debug!(channel, "no such channel");
        }
        voice
    }

    fn halt_all(&mut self) {
        for voice in &mut self.voices {
            voice.halt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pt_audio::CaptureSink;
    use pt_formats::fixture::{CellSpec, ModBuilder, SampleSpec};
    use pt_formats::load_mod;

    use crate::voice::VoiceState;

    fn sequencer(builder: ModBuilder) -> (Sequencer, CaptureSink) {
        let module = Arc::new(load_mod(&builder.build()).unwrap());
        let sink = CaptureSink::new();
        let seq = Sequencer::new(module, Arc::new(sink.clone()), EngineConfig::default());
        (seq, sink)
    }

    fn with_sample(builder: ModBuilder) -> ModBuilder {
        builder.sample(
            1,
            SampleSpec {
                pcm: vec![10; 32],
                ..Default::default()
            },
        )
    }

    #[test]
    fn idle_until_started() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel());
        assert_eq!(seq.step_row(), Step::Halted);
        assert_eq!(seq.cursor().row, 0);
    }

    #[test]
    fn rows_advance_at_tempo() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel());
        seq.start();
        assert_eq!(
            seq.step_row(),
            Step::Played {
                wait: Duration::from_millis(120)
            }
        );
        assert_eq!(seq.cursor().row, 1);
    }

    #[test]
    fn sequence_wraps_to_restart_position() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel().sequence(&[0, 1, 2]).restart(1));
        seq.start();
        for _ in 0..64 * 2 {
            seq.step_row();
        }
        assert_eq!(seq.cursor().position, 2);
        for _ in 0..64 {
            seq.step_row();
        }
        assert_eq!(seq.cursor().position, 1);
        assert_eq!(seq.cursor().row, 0);
        // And keeps cycling between 1 and 2
        for _ in 0..64 * 2 {
            seq.step_row();
        }
        assert_eq!(seq.cursor().position, 1);
    }

    #[test]
    fn tempo_effect_sets_its_own_row_length() {
        let builder =
            ModBuilder::four_channel().cell(0, 0, 3, CellSpec::default().with_effect(0xF, 64));
        let (mut seq, _) = sequencer(builder);
        seq.start();
        assert_eq!(
            seq.step_row(),
            Step::Played {
                wait: row_duration(64)
            }
        );
        assert_eq!(seq.bpm(), 64);
    }

    #[test]
    fn notes_reach_their_voices() {
        let builder = with_sample(ModBuilder::four_channel())
            .cell(0, 0, 2, CellSpec::note(428, 1))
            .cell(0, 1, 2, CellSpec::note(214, 0));
        let (mut seq, sink) = sequencer(builder);
        seq.start();
        seq.step_row();
        assert_eq!(seq.voices()[2].note(), 61);
        assert_eq!(seq.voices()[2].state(), VoiceState::Playing);
        assert_eq!(seq.voices()[0].state(), VoiceState::Idle);

        seq.step_row();
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].stopped);
        assert!(records[1].sample_rate > records[0].sample_rate);
    }

    #[test]
    fn pattern_jump_waits_for_row_boundary() {
        let builder = with_sample(ModBuilder::four_channel().sequence(&[0, 1]))
            .cell(0, 0, 0, CellSpec::note(428, 1))
            .cell(1, 0, 1, CellSpec::note(428, 1));
        let (mut seq, sink) = sequencer(builder);
        seq.start();
        seq.step_row();

        seq.increment_pattern();
        assert_eq!(seq.cursor().pending_jump, Some(1));
        assert_eq!(seq.cursor().position, 0);
        assert_eq!(seq.step_row(), Step::Jumped);
        assert_eq!(sink.live_count(), 0);
        assert_eq!(seq.cursor().position, 1);
        assert_eq!(seq.cursor().row, 0);
        assert_eq!(seq.cursor().pending_jump, None);

        seq.step_row();
        assert_eq!(seq.voices()[1].state(), VoiceState::Playing);
    }

    #[test]
    fn pattern_moves_clamp_to_sequence() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel().sequence(&[0, 1, 2]));
        seq.decrement_pattern();
        assert_eq!(seq.cursor().pending_jump, Some(0));
        // Repeated moves before a boundary accumulate
        seq.increment_pattern();
        seq.increment_pattern();
        seq.increment_pattern();
        assert_eq!(seq.cursor().pending_jump, Some(2));
        assert_eq!(seq.cursor().position, 0);

        // Paused, the jump waits until playback resumes
        assert_eq!(seq.step_row(), Step::Halted);
        seq.start();
        assert_eq!(seq.step_row(), Step::Jumped);
        assert_eq!(seq.cursor().position, 2);
    }

    #[test]
    fn stop_halts_voices_at_next_row() {
        let builder = with_sample(ModBuilder::four_channel()).cell(0, 0, 0, CellSpec::note(428, 1));
        let (mut seq, sink) = sequencer(builder);
        seq.start();
        seq.step_row();
        seq.stop();
        assert_eq!(sink.live_count(), 1);
        assert_eq!(seq.step_row(), Step::Halted);
        assert_eq!(sink.live_count(), 0);

        seq.toggle_playing();
        assert!(matches!(seq.step_row(), Step::Played { .. }));
    }

    #[test]
    fn bpm_steps() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel());
        seq.increment_bpm();
        seq.increment_bpm();
        seq.decrement_bpm();
        assert_eq!(seq.bpm(), 126);
    }

    #[test]
    fn solo_then_solo_again_unmutes_all() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel());
        seq.solo(1);
        let muted: Vec<bool> = seq.voices().iter().map(Voice::is_muted).collect();
        assert_eq!(muted, vec![true, false, true, true]);

        seq.solo(1);
        assert!(seq.voices().iter().all(|v| !v.is_muted()));
    }

    #[test]
    fn solo_moves_between_channels() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel());
        seq.solo(0);
        seq.solo(3);
        let muted: Vec<bool> = seq.voices().iter().map(Voice::is_muted).collect();
        assert_eq!(muted, vec![true, true, true, false]);
    }

    #[test]
    fn mute_commands() {
        let builder = with_sample(ModBuilder::four_channel()).cell(0, 0, 0, CellSpec::note(428, 1));
        let (mut seq, sink) = sequencer(builder);
        seq.start();
        seq.step_row();
        seq.apply(TransportCommand::ToggleMute(0));
        assert!(seq.voices()[0].is_muted());
        assert_eq!(sink.live_count(), 0);

        seq.apply(TransportCommand::Mute(2));
        seq.apply(TransportCommand::Unmute(0));
        assert!(!seq.voices()[0].is_muted());
        seq.apply(TransportCommand::UnmuteAll);
        assert!(seq.voices().iter().all(|v| !v.is_muted()));

        // Out-of-range channels are ignored
        seq.apply(TransportCommand::Mute(9));
    }

    #[test]
    fn queued_commands_apply_on_drain() {
        let (mut seq, _) = sequencer(ModBuilder::four_channel());
        let transport = seq.transport();
        assert!(transport.send(TransportCommand::Play));
        assert!(transport.send(TransportCommand::IncrementBpm));
        assert!(!seq.is_playing());
        seq.drain_commands();
        assert!(seq.is_playing());
        assert_eq!(seq.bpm(), 126);
    }

    struct Recorder(Arc<Mutex<Vec<(usize, usize, Vec<bool>)>>>);

    impl RowRenderer for Recorder {
        fn render(&mut self, view: &RowView<'_>) {
            assert_eq!(view.cells.len(), view.muted.len());
            self.0.lock().push((view.position, view.row, view.muted.to_vec()));
        }
    }

    #[test]
    fn renderer_sees_each_row() {
        let rows = Arc::new(Mutex::new(Vec::new()));
        let (seq, _) = sequencer(ModBuilder::four_channel());
        let mut seq = seq.with_renderer(Box::new(Recorder(rows.clone())));
        seq.start();
        seq.mute(3);
        seq.step_row();
        seq.step_row();

        let rows = rows.lock();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].1, 1);
        assert_eq!(rows[0].2, vec![false, false, false, true]);
    }

    #[test]
    fn jump_row_is_rendered_from_the_current_pattern() {
        let rows = Arc::new(Mutex::new(Vec::new()));
        let (seq, _) = sequencer(ModBuilder::four_channel().sequence(&[0, 1]));
        let mut seq = seq.with_renderer(Box::new(Recorder(rows.clone())));
        seq.start();
        seq.step_row();
        seq.step_row();
        seq.increment_pattern();
        assert_eq!(seq.step_row(), Step::Jumped);
        seq.step_row();

        let seen: Vec<(usize, usize)> = rows.lock().iter().map(|r| (r.0, r.1)).collect();
        assert_eq!(seen, vec![(0, 0), (0, 1), (0, 2), (1, 0)]);
    }
}
