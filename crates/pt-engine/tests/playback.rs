//! Timed playback through the run loop, on a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pt_audio::CaptureSink;
use pt_engine::{
    EngineConfig, RowRenderer, RowView, Sequencer, TransportCommand, TransportHandle,
};
use pt_formats::fixture::{CellSpec, ModBuilder, SampleSpec};
use pt_formats::load_mod;
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct Rows(Arc<Mutex<Vec<(usize, usize)>>>);

impl Rows {
    fn seen(&self) -> Vec<(usize, usize)> {
        self.0.lock().clone()
    }
}

impl RowRenderer for Rows {
    fn render(&mut self, view: &RowView<'_>) {
        self.0.lock().push((view.position, view.row));
    }
}

fn looping_song() -> ModBuilder {
    ModBuilder::four_channel()
        .sequence(&[0, 1])
        .sample(
            1,
            SampleSpec {
                pcm: (0..64).map(|v| v as i8).collect(),
                loop_start: 8,
                loop_length: 16,
                ..Default::default()
            },
        )
        .cell(0, 0, 0, CellSpec::note(428, 1))
}

type Running = (JoinHandle<Sequencer>, CaptureSink, Rows, TransportHandle);

fn spawn(builder: ModBuilder) -> Running {
    let module = Arc::new(load_mod(&builder.build()).unwrap());
    let sink = CaptureSink::new();
    let rows = Rows::default();
    let seq = Sequencer::new(module, Arc::new(sink.clone()), EngineConfig::default())
        .with_renderer(Box::new(rows.clone()));
    let transport = seq.transport();
    let task = tokio::spawn(async move {
        let mut seq = seq;
        seq.play().await;
        seq
    });
    (task, sink, rows, transport)
}

#[tokio::test(start_paused = true)]
async fn rows_follow_the_tempo_clock() {
    let (task, _sink, rows, transport) = spawn(looping_song());

    // 125 bpm: a row every 120 ms, the first at t = 0
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let seen = rows.seen();
    assert_eq!(seen.len(), 9);
    assert_eq!(seen[8], (0, 8));

    transport.send(TransportCommand::Shutdown);
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn looping_voice_is_sustained_between_rows() {
    let (task, sink, _rows, transport) = spawn(looping_song());

    tokio::time::sleep(Duration::from_millis(500)).await;
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].looping);
    assert!(records[0].appends > 10);
    // Loop is words 8..24
    assert_eq!(records[0].appended_samples % 32, 0);

    transport.send(TransportCommand::Shutdown);
    let seq = task.await.unwrap();
    assert_eq!(sink.live_count(), 0);
    assert!(!seq.is_playing());
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_keep_the_cursor() {
    let (task, sink, rows, transport) = spawn(looping_song());

    tokio::time::sleep(Duration::from_millis(250)).await;
    transport.send(TransportCommand::TogglePlaying);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    // Rows at 0, 120 and 240 played; the pause lands at the 360 boundary
    assert_eq!(rows.seen().len(), 3);
    assert_eq!(sink.live_count(), 0);

    transport.send(TransportCommand::TogglePlaying);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(rows.seen().last(), Some(&(0, 3)));

    transport.send(TransportCommand::Shutdown);
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pattern_jump_from_the_transport() {
    let (task, _sink, rows, transport) = spawn(looping_song());

    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.send(TransportCommand::IncrementPattern);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Row 1 of pattern 0 is shown as the jump lands, then pattern 1 starts at once
    let seen = rows.seen();
    assert_eq!(seen, vec![(0, 0), (0, 1), (1, 0)]);

    transport.send(TransportCommand::Shutdown);
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn set_tempo_changes_the_clock() {
    let song = looping_song().cell(0, 0, 1, CellSpec::default().with_effect(0xF, 250));
    let (task, _sink, rows, transport) = spawn(song);

    // 250 bpm: a row every 60 ms
    tokio::time::sleep(Duration::from_millis(590)).await;
    assert_eq!(rows.seen().len(), 10);

    transport.send(TransportCommand::Shutdown);
    task.await.unwrap();
}
