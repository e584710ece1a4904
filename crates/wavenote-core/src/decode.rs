//! Audio decode for waveform peak generation
//!
//! Playback goes through the output sink's own decoder; this module decodes
//! a source once, up front, to report its duration and feed peak generation.
//! It never runs on the UI thread (see the player's loader).

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::SourceError;

/// Interleaved f32 samples plus the parameters needed to interpret them.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }
}

/// Decode an entire audio file to interleaved f32.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, SourceError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SourceError::Probe(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(SourceError::NoAudioTrack)?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SourceError::Decode(e.to_string()))?;

    let mut samples = Vec::<f32>::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream surfaces as an IO error in symphonia
            Err(Error::IoError(_)) => break,
            Err(Error::ResetRequired) => break,
            Err(e) => return Err(SourceError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                if sample_buf.is_none() {
                    let spec = *audio_buf.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count();
                    sample_buf = Some(SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec));
                }
                if let Some(buf) = &mut sample_buf {
                    buf.copy_interleaved_ref(audio_buf);
                    samples.extend_from_slice(buf.samples());
                }
            }
            // Malformed packets are skippable; the stream may still be fine
            Err(Error::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(SourceError::Decode(e.to_string())),
        }
    }

    if samples.is_empty() || sample_rate == 0 || channels == 0 {
        return Err(SourceError::MissingParameters);
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_duration_from_interleaved_stereo() {
        let audio = DecodedAudio {
            samples: vec![0.0; 48_000 * 2],
            sample_rate: 48_000,
            channels: 2,
        };
        assert_eq!(audio.frames(), 48_000);
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_parameters_yield_zero_duration() {
        let audio = DecodedAudio {
            samples: Vec::new(),
            sample_rate: 0,
            channels: 0,
        };
        assert_eq!(audio.frames(), 0);
        assert_eq!(audio.duration_seconds(), 0.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = decode_file(Path::new("/nonexistent/take-7.wav")).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
