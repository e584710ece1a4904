//! Wavenote Core - domain model and audio plumbing for the annotation player

pub mod annotation;
pub mod decode;
pub mod error;
pub mod playback;
pub mod tempo;
pub mod waveform;

pub use annotation::{
    diff_snapshots, Annotation, AnnotationEvent, AnnotationId, AnnotationKind,
    AnnotationSnapshot, Priority, Status,
};
pub use decode::{decode_file, DecodedAudio};
pub use error::{SourceError, SourceResult, TransportError, TransportResult};
pub use playback::{PlaybackClock, PlaybackEvent, PlaybackSession, Transport};
pub use tempo::{GridMode, TapTempo, TempoGrid, BEATS_PER_BAR};
pub use waveform::{WaveformSamples, DEFAULT_PEAKS_PER_SECOND};
