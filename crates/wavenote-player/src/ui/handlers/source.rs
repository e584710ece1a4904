//! Source lifecycle: drops, loader results, retry, and audio device
//! acquisition.
//!
//! A load opens the rodio transport immediately (for playback and the
//! container's reported duration) but only promotes it into a
//! [`PlaybackClock`] once the waveform result arrives, so the clock is born
//! with its final duration. If decoding fails while the transport is
//! healthy, a deterministic fallback waveform stands in and playback keeps
//! working; if the transport itself failed, the timeline shows a retryable
//! error.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use iced::Task;

use wavenote_core::{PlaybackClock, WaveformSamples};

use crate::audio::{AudioGraph, RodioTransport};
use crate::loader::LoadResult;
use crate::store::SidecarStore;
use crate::ui::app::{Message, WavenoteApp};

impl WavenoteApp {
    pub(crate) fn handle_source_dropped(&mut self, path: PathBuf) -> Task<Message> {
        log::info!("Loading source {:?}", path);
        self.generation += 1;
        self.source_path = Some(path.clone());
        self.status = format!(
            "Loading {}",
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
        );

        // Tear down the previous source before acquiring a fresh device;
        // output handles are exclusive on some backends.
        self.clock = None;
        self.pending_transport = None;
        self.clock_events.borrow_mut().clear();
        self.draft = None;
        self.timeline.begin_load();

        self.store = match SidecarStore::open(&path) {
            Ok(store) => {
                self.timeline.set_annotations(store.annotations());
                Some(store)
            }
            Err(e) => {
                log::warn!("Annotation sidecar unavailable: {:#}", e);
                self.timeline.set_annotations(Vec::new());
                None
            }
        };

        match open_transport(&path) {
            Ok(transport) => self.pending_transport = Some(transport),
            Err(e) => {
                // Waveform decode may still succeed; playback will retry
                // from the first user gesture.
                log::warn!("Transport unavailable for {:?}: {}", path, e);
                self.status = e;
            }
        }

        if let Err(e) = self
            .loader
            .load(self.generation, path, self.config.display.peaks_per_second)
        {
            self.timeline.fail_load(e);
        }
        Task::none()
    }

    pub(crate) fn handle_retry_load(&mut self) -> Task<Message> {
        match self.source_path.clone() {
            Some(path) => self.handle_source_dropped(path),
            None => Task::none(),
        }
    }

    pub(crate) fn handle_source_loaded(&mut self, result: LoadResult) -> Task<Message> {
        if result.generation != self.generation {
            log::debug!(
                "Dropping stale load result (generation {} != {})",
                result.generation,
                self.generation
            );
            return Task::none();
        }

        match result.result {
            Ok(loaded) => {
                let transport_duration = self
                    .pending_transport
                    .as_ref()
                    .map(|t| t.duration_seconds())
                    .unwrap_or(0.0);
                let duration = loaded.duration_seconds.max(transport_duration);
                self.install_clock(duration);
                self.timeline.finish_load(duration, loaded.waveform);
                self.status = match self.source_file_name() {
                    Some(name) => format!("Loaded {}", name),
                    None => String::from("Loaded"),
                };
            }
            Err(message) => {
                let transport_duration = self
                    .pending_transport
                    .as_ref()
                    .map(|t| t.duration_seconds())
                    .unwrap_or(0.0);
                if transport_duration > 0.0 {
                    // Playback works even though peak extraction failed;
                    // show a synthetic waveform seeded from the file name.
                    log::warn!(
                        "Waveform decode failed ({}); substituting fallback shape",
                        message
                    );
                    let name = self.source_file_name().unwrap_or_default();
                    let waveform = WaveformSamples::fallback(
                        WaveformSamples::fallback_seed(&name),
                        transport_duration,
                        self.config.display.peaks_per_second,
                    );
                    self.install_clock(transport_duration);
                    self.timeline
                        .finish_load(transport_duration, Arc::new(waveform));
                    self.status = String::from("Waveform unavailable; showing placeholder");
                } else {
                    self.timeline.fail_load(message);
                }
            }
        }
        self.drain_clock_events();
        Task::none()
    }

    /// Promote the pending transport into a playback clock. Without a
    /// transport the timeline waits for a user gesture to retry the device.
    pub(crate) fn install_clock(&mut self, duration_seconds: f64) {
        match self.pending_transport.take() {
            Some(transport) => {
                let mut clock = PlaybackClock::new(
                    transport,
                    duration_seconds,
                    self.config.playback.volume,
                    self.config.playback.muted,
                );
                let sink = Rc::clone(&self.clock_events);
                clock.subscribe(Box::new(move |event| {
                    sink.borrow_mut().push(event.clone());
                }));
                clock.announce_loaded();
                self.clock = Some(clock);
                self.timeline.set_awaiting_user_gesture(false);
            }
            None => {
                self.clock = None;
                self.timeline.set_awaiting_user_gesture(true);
            }
        }
    }

    /// Retry device acquisition from a user gesture when the source is
    /// loaded but no clock exists (device was unavailable at load time).
    pub(crate) fn ensure_clock(&mut self) {
        if self.clock.is_some() || self.timeline.is_loading() {
            return;
        }
        let Some(path) = self.source_path.clone() else {
            return;
        };
        let duration = self.timeline.viewport().duration();
        if duration <= 0.0 {
            return;
        }
        match open_transport(&path) {
            Ok(transport) => {
                log::info!("Audio device acquired on retry");
                self.pending_transport = Some(transport);
                self.install_clock(duration);
            }
            Err(e) => {
                log::warn!("Audio device still unavailable: {}", e);
                self.status = e;
            }
        }
    }
}

fn open_transport(path: &std::path::Path) -> Result<RodioTransport, String> {
    let graph = AudioGraph::acquire().map_err(|e| e.to_string())?;
    RodioTransport::load(graph, path).map_err(|e| e.to_string())
}
