//! Background waveform loader.
//!
//! Decoding a source and reducing it to peaks can take seconds for long
//! files, so it runs on a dedicated thread. The UI sends [`LoadRequest`]s
//! stamped with a generation counter and receives [`LoadResult`]s through a
//! channel bridged into the iced subscription system; results whose
//! generation no longer matches the app's are dropped on arrival.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use wavenote_core::{decode_file, WaveformSamples};

#[derive(Debug)]
pub struct LoadRequest {
    pub generation: u64,
    pub path: PathBuf,
    pub peaks_per_second: u32,
}

/// Decoded source ready for display. The waveform is shared with the
/// timeline state behind an `Arc`.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub duration_seconds: f64,
    pub waveform: Arc<WaveformSamples>,
}

#[derive(Debug, Clone)]
pub struct LoadResult {
    pub generation: u64,
    pub path: PathBuf,
    pub result: Result<LoadedSource, String>,
}

/// Handle to the loader thread. Dropping it closes the request channel,
/// which ends the thread.
pub struct WaveformLoader {
    request_tx: Sender<LoadRequest>,
    result_rx: Arc<Mutex<Receiver<LoadResult>>>,
    _handle: JoinHandle<()>,
}

impl WaveformLoader {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = channel::<LoadRequest>();
        let (result_tx, result_rx) = channel::<LoadResult>();

        let handle = thread::Builder::new()
            .name("waveform-loader".to_string())
            .spawn(move || loader_thread(request_rx, result_tx))
            .expect("Failed to spawn waveform loader thread");

        log::info!("WaveformLoader spawned");

        Self {
            request_tx,
            result_rx: Arc::new(Mutex::new(result_rx)),
            _handle: handle,
        }
    }

    /// Queue a decode. Non-blocking; the result arrives on the receiver.
    pub fn load(&self, generation: u64, path: PathBuf, peaks_per_second: u32) -> Result<(), String> {
        self.request_tx
            .send(LoadRequest {
                generation,
                path,
                peaks_per_second,
            })
            .map_err(|e| format!("Loader thread disconnected: {}", e))
    }

    /// Shared receiver for the subscription bridge. The subscription's
    /// identity follows this channel, so it stays stable across loads.
    pub fn result_receiver(&self) -> Arc<Mutex<Receiver<LoadResult>>> {
        Arc::clone(&self.result_rx)
    }
}

fn loader_thread(request_rx: Receiver<LoadRequest>, result_tx: Sender<LoadResult>) {
    log::info!("Waveform loader thread started");
    while let Ok(request) = request_rx.recv() {
        let result = handle_load(&request);
        let LoadRequest {
            generation, path, ..
        } = request;
        if result_tx
            .send(LoadResult {
                generation,
                path,
                result,
            })
            .is_err()
        {
            break;
        }
    }
    log::info!("Waveform loader thread shutting down");
}

fn handle_load(request: &LoadRequest) -> Result<LoadedSource, String> {
    log::debug!(
        "[PERF] Loader: starting generation {} for {:?}",
        request.generation,
        request.path
    );
    let total_start = Instant::now();

    let decode_start = Instant::now();
    let audio = decode_file(&request.path).map_err(|e| e.to_string())?;
    log::debug!(
        "[PERF] Loader: decode took {:?} ({} frames @ {} Hz)",
        decode_start.elapsed(),
        audio.frames(),
        audio.sample_rate
    );

    let peaks_start = Instant::now();
    let waveform = WaveformSamples::from_decoded(&audio, request.peaks_per_second);
    log::debug!(
        "[PERF] Loader: peak reduction took {:?} ({} peaks)",
        peaks_start.elapsed(),
        waveform.len()
    );

    log::debug!("[PERF] Loader: total load took {:?}", total_start.elapsed());

    Ok(LoadedSource {
        duration_seconds: audio.duration_seconds(),
        waveform: Arc::new(waveform),
    })
}
