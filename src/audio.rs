//! `rodio` implementation of the narration output.
//!
//! Clips are read (or downloaded) and measured on a worker thread so `load`
//! returns immediately; results come back over a channel that
//! `poll_status` drains. rodio 0.18 has no position query, so the playhead
//! is tracked from wall-clock time scaled by the playback speed.

use crate::cache;
use bocadillo_core::output::{AudioOutput, LoadHandle, OutputStatus};
use bocadillo_core::reference::AudioSource;
use bocadillo_core::PlaybackError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Clone)]
struct Clip {
    bytes: Arc<[u8]>,
    duration: Option<Duration>,
}

struct WorkerReport {
    handle: LoadHandle,
    result: Result<Clip, String>,
}

/// Wall-clock playhead.
#[derive(Debug, Clone, Copy)]
struct Playhead {
    base: Duration,
    started_at: Option<Instant>,
    rate: f32,
}

impl Default for Playhead {
    fn default() -> Self {
        Self {
            base: Duration::ZERO,
            started_at: None,
            rate: 1.0,
        }
    }
}

impl Playhead {
    fn position(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started) => self.base + now.saturating_duration_since(started).mul_f32(self.rate),
            None => self.base,
        }
    }

    fn resume(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    fn pause(&mut self, now: Instant) {
        self.base = self.position(now);
        self.started_at = None;
    }

    fn seek(&mut self, now: Instant, position: Duration) {
        self.base = position;
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }

    fn set_rate(&mut self, now: Instant, rate: f32) {
        self.base = self.position(now);
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
        self.rate = rate;
    }
}

pub struct RodioOutput {
    cache_root: PathBuf,
    volume: f32,
    stream: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    next_handle: u64,
    current: Option<LoadHandle>,
    clip: Option<Clip>,
    failure: Option<String>,
    play_when_ready: bool,
    playhead: Playhead,
    reports_tx: Sender<WorkerReport>,
    reports_rx: Receiver<WorkerReport>,
}

impl RodioOutput {
    pub fn new(cache_root: PathBuf, volume: f32) -> Self {
        let (reports_tx, reports_rx) = mpsc::channel();
        Self {
            cache_root,
            volume: volume.clamp(0.0, 2.0),
            stream: None,
            sink: None,
            next_handle: 0,
            current: None,
            clip: None,
            failure: None,
            play_when_ready: false,
            playhead: Playhead::default(),
            reports_tx,
            reports_rx,
        }
    }

    fn drain_reports(&mut self) {
        while let Ok(report) = self.reports_rx.try_recv() {
            if Some(report.handle) != self.current {
                debug!(
                    handle = report.handle.0,
                    "Discarding clip for a superseded load"
                );
                continue;
            }
            match report.result {
                Ok(clip) => {
                    debug!(
                        handle = report.handle.0,
                        bytes = clip.bytes.len(),
                        duration_ms = clip.duration.map(|d| d.as_millis()),
                        "Clip ready"
                    );
                    self.clip = Some(clip);
                    if self.play_when_ready {
                        self.play_when_ready = false;
                        self.play();
                    }
                }
                Err(err) => {
                    warn!(handle = report.handle.0, "Clip failed to load: {err}");
                    self.failure = Some(err);
                }
            }
        }
    }

    fn ensure_stream(&mut self) -> Result<&OutputStreamHandle, String> {
        if self.stream.is_none() {
            let stream = OutputStream::try_default()
                .map_err(|err| format!("Opening audio output: {err}"))?;
            info!("Opened audio output stream");
            self.stream = Some(stream);
        }
        match &self.stream {
            Some((_, handle)) => Ok(handle),
            None => Err("audio output unavailable".to_string()),
        }
    }

    /// Build a fresh sink holding the clip, positioned at the playhead.
    fn rebuild_sink(&mut self, clip: &Clip) -> Result<(), String> {
        let volume = self.volume;
        let rate = self.playhead.rate;
        let handle = self.ensure_stream()?;
        let sink = Sink::try_new(handle).map_err(|err| format!("Creating sink: {err}"))?;
        let decoder = Decoder::new(Cursor::new(Arc::clone(&clip.bytes)))
            .map_err(|err| format!("Decoding clip: {err}"))?;
        sink.pause();
        sink.set_volume(volume);
        sink.set_speed(rate);
        sink.append(decoder);
        let start = self.playhead.base;
        if !start.is_zero() {
            if let Err(err) = sink.try_seek(start) {
                warn!("Failed to seek rebuilt sink: {err}");
            }
        }
        self.sink = Some(sink);
        Ok(())
    }

    fn drop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn sink_drained(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, source: &AudioSource) -> Result<LoadHandle, PlaybackError> {
        if let AudioSource::File(path) = source {
            if !path.is_file() {
                return Err(PlaybackError::load(source.to_string(), "file not found"));
            }
        }

        self.drop_sink();
        self.clip = None;
        self.failure = None;
        self.play_when_ready = false;
        self.playhead = Playhead {
            rate: self.playhead.rate,
            ..Playhead::default()
        };
        self.next_handle += 1;
        let handle = LoadHandle(self.next_handle);
        self.current = Some(handle);

        let tx = self.reports_tx.clone();
        let source = source.clone();
        let cache_root = self.cache_root.clone();
        thread::spawn(move || {
            let result = read_clip(&source, &cache_root);
            let _ = tx.send(WorkerReport { handle, result });
        });
        Ok(handle)
    }

    fn play(&mut self) {
        let Some(clip) = self.clip.clone() else {
            debug!("Clip not ready yet; playback will start when it arrives");
            self.play_when_ready = self.current.is_some();
            return;
        };
        if self.sink.is_none() || self.sink_drained() {
            if let Err(err) = self.rebuild_sink(&clip) {
                warn!("Failed to start playback: {err}");
                self.failure = Some(err);
                return;
            }
        }
        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.playhead.resume(Instant::now());
    }

    fn pause(&mut self) {
        self.play_when_ready = false;
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.playhead.pause(Instant::now());
    }

    fn seek(&mut self, position: Duration) {
        self.playhead.seek(Instant::now(), position);
        if self.sink_drained() {
            // Nothing left to seek in; `play` re-appends the clip.
            self.drop_sink();
            return;
        }
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.try_seek(position) {
                warn!("Seek failed: {err}");
            }
        }
    }

    fn poll_status(&mut self) -> OutputStatus {
        self.drain_reports();
        let now = Instant::now();

        let duration = self.clip.as_ref().and_then(|clip| clip.duration);
        let drained = self.playhead.started_at.is_some() && self.sink_drained();
        if drained {
            let end = self.playhead.position(now);
            let end = duration.map_or(end, |duration| duration.min(end));
            self.playhead.pause(now);
            self.playhead.base = end;
            if let Some(clip) = self.clip.as_mut() {
                clip.duration.get_or_insert(end);
            }
        }

        let duration = self.clip.as_ref().and_then(|clip| clip.duration);
        let mut position = self.playhead.position(now);
        if let Some(duration) = duration {
            position = position.min(duration);
        }
        let is_playing = self
            .sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty());

        OutputStatus {
            handle: self.current,
            is_playing,
            position,
            duration,
            failure: self.failure.clone(),
        }
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.playhead.set_rate(Instant::now(), rate);
        if let Some(sink) = &self.sink {
            sink.set_speed(rate);
        }
    }
}

fn read_clip(source: &AudioSource, cache_root: &std::path::Path) -> Result<Clip, String> {
    let path = match source {
        AudioSource::File(path) => path.clone(),
        AudioSource::Url(url) => {
            cache::fetch_remote_audio(cache_root, url).map_err(|err| format!("{err:#}"))?
        }
    };
    let bytes: Arc<[u8]> = fs::read(&path)
        .map_err(|err| format!("Reading {}: {err}", path.display()))?
        .into();
    let duration = measure_duration(&bytes)?;
    Ok(Clip {
        bytes,
        duration: Some(duration),
    })
}

/// Header duration when the container has one, otherwise decode and count.
fn measure_duration(bytes: &Arc<[u8]>) -> Result<Duration, String> {
    let decoder = Decoder::new(Cursor::new(Arc::clone(bytes)))
        .map_err(|err| format!("Decoding clip: {err}"))?;
    if let Some(duration) = decoder.total_duration() {
        return Ok(duration);
    }
    let channels = u64::from(decoder.channels().max(1));
    let sample_rate = u64::from(decoder.sample_rate().max(1));
    let samples = decoder.count() as u64;
    let frames = samples / channels;
    Ok(Duration::from_nanos(frames * 1_000_000_000 / sample_rate))
}
