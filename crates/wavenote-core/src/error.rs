//! Error types for source loading and the transport
//!
//! Waveform peak generation has no error type of its own: failures recover
//! locally by substituting a synthetic fallback waveform, logged but never
//! surfaced.

use thiserror::Error;

/// Errors raised while opening and decoding an audio source.
///
/// All variants are retryable: callers keep their current state and may
/// re-issue the load with the same path.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open audio source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized audio container: {0}")]
    Probe(String),

    #[error("Source contains no decodable audio track")]
    NoAudioTrack,

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Source reports no sample rate or produced no samples")]
    MissingParameters,
}

/// Errors from the audio output path (device acquisition and sink control).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Device acquisition failed or was refused. Non-fatal: the UI waits for
    /// a qualifying user gesture and tries again.
    #[error("No audio output device available: {0}")]
    DeviceUnavailable(String),

    #[error("Seek to {0:.3}s failed: {1}")]
    SeekFailed(f64, String),

    #[error("Transport has no loaded source")]
    NoSource,
}

pub type SourceResult<T> = Result<T, SourceError>;
pub type TransportResult<T> = Result<T, TransportError>;
