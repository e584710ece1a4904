//! Audio output through rodio.
//!
//! [`AudioGraph`] owns the output device and a sink; [`RodioTransport`]
//! implements the core `Transport` trait on top of it. One graph exists per
//! loaded source, and dropping it releases the device.

use std::cell::Cell;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rodio::source::Source;
use rodio::{Decoder, OutputStream, Sink};

use wavenote_core::{SourceError, SourceResult, Transport, TransportError, TransportResult};

/// Sink positions advance per audio buffer, not per frame. Interpolation
/// past a stale reading is capped so a stalled device cannot run the
/// playhead away from reality.
const MAX_INTERPOLATION_SECONDS: f64 = 0.25;

pub struct AudioGraph {
    // Keeps the device open; audio stops when this drops.
    _stream: OutputStream,
    sink: Sink,
}

impl AudioGraph {
    /// Open the default output device and attach a fresh sink.
    pub fn acquire() -> TransportResult<Self> {
        let stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| TransportError::DeviceUnavailable(e.to_string()))?;
        let sink = Sink::connect_new(&stream.mixer());
        sink.pause();
        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

/// Transport over a rodio sink. Holds the source path so the decoder can
/// be re-appended after the sink drains at end of playback.
pub struct RodioTransport {
    graph: AudioGraph,
    path: PathBuf,
    duration_seconds: f64,
    playing: bool,
    // Last raw sink reading and when it changed, for interpolation.
    last_sample: Cell<(f64, Instant)>,
}

impl RodioTransport {
    /// Decode `path` onto the graph's sink, paused at the start.
    pub fn load(graph: AudioGraph, path: &Path) -> SourceResult<Self> {
        let file = File::open(path)?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| SourceError::Decode(e.to_string()))?;
        let duration_seconds = decoder
            .total_duration()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        graph.sink.append(decoder);
        graph.sink.pause();

        log::info!(
            "RodioTransport: loaded {:?} ({:.1}s reported)",
            path,
            duration_seconds
        );

        Ok(Self {
            graph,
            path: path.to_path_buf(),
            duration_seconds,
            playing: false,
            last_sample: Cell::new((0.0, Instant::now())),
        })
    }

    /// Duration reported by the decoder; 0.0 when the container does not
    /// carry one.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    fn raw_position(&self) -> f64 {
        self.graph.sink.get_pos().as_secs_f64()
    }

    /// Re-append the decoder if the sink drained at end of playback, so
    /// play and seek keep working after the source finishes.
    fn ensure_source(&mut self) -> TransportResult<()> {
        if !self.graph.sink.empty() {
            return Ok(());
        }
        let file = File::open(&self.path).map_err(|_| TransportError::NoSource)?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| {
            log::warn!("Failed to re-open {:?}: {}", self.path, e);
            TransportError::NoSource
        })?;
        self.graph.sink.append(decoder);
        if !self.playing {
            self.graph.sink.pause();
        }
        self.last_sample.set((0.0, Instant::now()));
        Ok(())
    }
}

impl Transport for RodioTransport {
    fn play(&mut self) -> TransportResult<()> {
        self.ensure_source()?;
        self.graph.sink.play();
        self.playing = true;
        self.last_sample.set((self.raw_position(), Instant::now()));
        Ok(())
    }

    fn pause(&mut self) {
        self.graph.sink.pause();
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) -> TransportResult<()> {
        self.ensure_source()?;
        let target = seconds.max(0.0);
        self.graph
            .sink
            .try_seek(Duration::from_secs_f64(target))
            .map_err(|e| TransportError::SeekFailed(target, e.to_string()))?;
        self.last_sample.set((target, Instant::now()));
        Ok(())
    }

    fn position_seconds(&self) -> f64 {
        let raw = self.raw_position();
        if !self.playing {
            return raw;
        }
        let (previous, changed_at) = self.last_sample.get();
        if raw != previous {
            self.last_sample.set((raw, Instant::now()));
            raw
        } else {
            raw + changed_at
                .elapsed()
                .as_secs_f64()
                .min(MAX_INTERPOLATION_SECONDS)
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.graph.sink.set_volume(volume.clamp(0.0, 1.0));
    }

    fn is_finished(&self) -> bool {
        self.playing && self.graph.sink.empty()
    }
}
