//! CPAL-based audio sink.
//!
//! One device stream sums every open voice stream. Each voice stream owns a
//! ring buffer filled from the player side and drained by the device
//! callback, stepping through it at `source_rate / device_rate` with
//! sample-and-hold.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, warn};

use crate::traits::{AudioError, AudioSink, StreamHandle};

/// Ring space beyond twice the initial buffer, in seconds of source audio.
const HEADROOM_SECONDS: usize = 1;

type TrackList = Arc<Mutex<Vec<Track>>>;

/// Audio sink on the default CPAL output device.
pub struct CpalSink {
    device_rate: u32,
    tracks: TrackList,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalSink {
    /// Open the default output device.
    ///
    /// The device stream lives on its own thread; this returns once that
    /// thread reports the stream running or fails.
    pub fn new() -> Result<Self, AudioError> {
        let tracks: TrackList = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_tracks = tracks.clone();
        let thread_shutdown = shutdown.clone();
        let thread = std::thread::Builder::new()
            .name("ptplay-audio".into())
            .spawn(move || audio_thread(thread_tracks, thread_shutdown, ready_tx))
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let device_rate = ready_rx
            .recv()
            .map_err(|_| AudioError::DeviceInit("audio thread exited".into()))??;

        debug!(device_rate, "cpal sink ready");
        Ok(Self {
            device_rate,
            tracks,
            shutdown,
            thread: Some(thread),
        })
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl AudioSink for CpalSink {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn stream(
        &self,
        pcm: &[i16],
        sample_rate: u32,
        channels: u16,
        looping: bool,
    ) -> Result<Arc<dyn StreamHandle>, AudioError> {
        if sample_rate == 0 || !(1..=2).contains(&channels) {
            return Err(AudioError::StreamCreate(format!(
                "unsupported stream: {} Hz, {} channels",
                sample_rate, channels
            )));
        }

        let headroom = sample_rate as usize * channels as usize * HEADROOM_SECONDS;
        let (mut producer, consumer) = HeapRb::<i16>::new(pcm.len() * 2 + headroom).split();
        producer.push_slice(pcm);

        let shared = Arc::new(TrackShared {
            producer: Mutex::new(producer),
            stopped: AtomicBool::new(false),
            looping,
            channels,
        });
        self.tracks.lock().push(Track {
            consumer,
            shared: shared.clone(),
            step: sample_rate as f64 / self.device_rate as f64,
            phase: 1.0,
            current: (0.0, 0.0),
            finished: false,
        });

        Ok(Arc::new(CpalStream(shared)))
    }
}

struct TrackShared {
    producer: Mutex<HeapProd<i16>>,
    stopped: AtomicBool,
    looping: bool,
    channels: u16,
}

/// Player-side handle to one mixed stream.
struct CpalStream(Arc<TrackShared>);

impl StreamHandle for CpalStream {
    fn append(&self, pcm: &[i16]) {
        if self.is_stopped() {
            return;
        }
        let pushed = self.0.producer.lock().push_slice(pcm);
        if pushed < pcm.len() {
            warn!(dropped = pcm.len() - pushed, "stream ring full");
        }
    }

    fn buffered_frames(&self) -> usize {
        self.0.producer.lock().occupied_len() / self.0.channels as usize
    }

    fn stop(&self) {
        self.0.stopped.store(true, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.0.stopped.load(Ordering::Relaxed)
    }
}

/// Device-side state of one stream.
struct Track {
    consumer: HeapCons<i16>,
    shared: Arc<TrackShared>,
    /// Source frames per device frame
    step: f64,
    phase: f64,
    current: (f32, f32),
    finished: bool,
}

impl Track {
    fn next_frame(&mut self) -> Option<(f32, f32)> {
        if self.shared.stopped.load(Ordering::Relaxed) {
            self.finished = true;
            return None;
        }
        self.phase += self.step;
        while self.phase >= 1.0 {
            match self.pop_frame() {
                Some(frame) => {
                    self.current = frame;
                    self.phase -= 1.0;
                }
                None if self.shared.looping => {
                    // Underrun: hold silence until the next append
                    self.current = (0.0, 0.0);
                    self.phase = 1.0;
                    break;
                }
                None => {
                    self.finished = true;
                    self.shared.stopped.store(true, Ordering::Relaxed);
                    return None;
                }
            }
        }
        Some(self.current)
    }

    fn pop_frame(&mut self) -> Option<(f32, f32)> {
        let left = self.consumer.try_pop()? as f32 / 32768.0;
        if self.shared.channels == 1 {
            return Some((left, left));
        }
        let right = self.consumer.try_pop().unwrap_or(0) as f32 / 32768.0;
        Some((left, right))
    }
}

fn audio_thread(
    tracks: TrackList,
    shutdown: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<u32, AudioError>>,
) {
    let stream = match open_stream(tracks) {
        Ok((stream, rate)) => {
            let _ = ready.send(Ok(rate));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while !shutdown.load(Ordering::Relaxed) {
        std::thread::park_timeout(Duration::from_millis(100));
    }
    let _ = stream.pause();
}

fn open_stream(tracks: TrackList) -> Result<(cpal::Stream, u32), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::SinkUnavailable("no output device".into()))?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

    let mut config: StreamConfig = config.into();
    // Force stereo output; the mixer writes interleaved pairs
    config.channels = 2;
    let rate = config.sample_rate.0;
    let channels = config.channels as usize;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                data.fill(0.0);
                // Never block the device thread on a player-side push
                let Some(mut tracks) = tracks.try_lock() else {
                    return;
                };
                for chunk in data.chunks_mut(channels) {
                    let (mut left, mut right) = (0.0f32, 0.0f32);
                    for track in tracks.iter_mut() {
                        if let Some((l, r)) = track.next_frame() {
                            left += l;
                            right += r;
                        }
                    }
                    for (i, sample) in chunk.iter_mut().enumerate() {
                        *sample = match i {
                            0 => left.clamp(-1.0, 1.0),
                            1 => right.clamp(-1.0, 1.0),
                            _ => 0.0,
                        };
                    }
                }
                tracks.retain(|t| !t.finished);
            },
            |err| warn!("audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

    stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
    Ok((stream, rate))
}
