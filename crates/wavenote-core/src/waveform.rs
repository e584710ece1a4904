//! Waveform peak data
//!
//! Peaks are normalized amplitude magnitudes (`0..1`) at a fixed number of
//! peaks per second of audio, independent of the source sample rate. Each
//! peak is the mean absolute amplitude of its block, folded across channels,
//! normalized so the loudest block sits at 1.0. The sequence is immutable
//! once computed for a source; a source change recomputes it from scratch.

use rayon::prelude::*;

use crate::decode::DecodedAudio;

/// Default peak resolution (peaks per second of audio)
pub const DEFAULT_PEAKS_PER_SECOND: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSamples {
    peaks: Vec<f32>,
    peaks_per_second: u32,
}

impl WaveformSamples {
    /// Wrap an already-computed peak sequence. Peaks are taken as-is;
    /// resolution is clamped to at least one peak per second.
    pub fn from_peaks(peaks: Vec<f32>, peaks_per_second: u32) -> Self {
        Self {
            peaks,
            peaks_per_second: peaks_per_second.max(1),
        }
    }

    /// Block-average a decoded source into normalized peaks.
    pub fn from_decoded(audio: &DecodedAudio, peaks_per_second: u32) -> Self {
        let frames = audio.frames();
        let rate = audio.sample_rate as u64;
        let pps = peaks_per_second.max(1) as u64;
        if frames == 0 || rate == 0 {
            return Self {
                peaks: Vec::new(),
                peaks_per_second: peaks_per_second.max(1),
            };
        }

        let channels = audio.channels;
        let peak_count = ((frames as u64 * pps + rate - 1) / rate) as usize;

        let mut peaks: Vec<f32> = (0..peak_count)
            .into_par_iter()
            .map(|i| {
                let start = (i as u64 * rate / pps) as usize;
                let end = (((i as u64 + 1) * rate / pps) as usize)
                    .min(frames)
                    .max(start + 1);

                let mut sum = 0.0f64;
                for frame in start..end {
                    for ch in 0..channels {
                        sum += audio.samples[frame * channels + ch].abs() as f64;
                    }
                }
                (sum / ((end - start) * channels) as f64) as f32
            })
            .collect();

        // Normalize so the loudest block hits 1.0; a silent source stays flat
        let max = peaks.iter().cloned().fold(0.0f32, f32::max);
        if max > 0.0 {
            for peak in &mut peaks {
                *peak /= max;
            }
        }

        Self {
            peaks,
            peaks_per_second: peaks_per_second.max(1),
        }
    }

    /// Synthetic stand-in used when decode fails, so scrubbing and
    /// annotation stay usable. Deterministic for a given seed: retrying the
    /// same source shows the same shape. Callers log the substitution.
    pub fn fallback(seed: u64, duration_seconds: f64, peaks_per_second: u32) -> Self {
        let pps = peaks_per_second.max(1);
        let count = (duration_seconds.max(0.0) * pps as f64).ceil() as usize;

        // xorshift64 over a nonzero state
        let mut state = seed | 1;
        let mut peaks = Vec::with_capacity(count);
        for i in 0..count {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let noise = (state >> 11) as f64 / (1u64 << 53) as f64;

            // Slow swells over the noise floor so the substitute reads as
            // program material rather than static
            let phase = i as f64 / pps as f64;
            let envelope = 0.55 + 0.30 * (phase * 0.8).sin() + 0.15 * (phase * 0.13).sin();
            let amp = envelope * (0.45 + 0.55 * noise);
            peaks.push(amp.clamp(0.05, 1.0) as f32);
        }

        Self {
            peaks,
            peaks_per_second: pps,
        }
    }

    /// Seed for [`fallback`](Self::fallback) derived from the source name
    /// (FNV-1a), so each source gets its own stable shape.
    pub fn fallback_seed(source_name: &str) -> u64 {
        let mut hash = 0xcbf2_9ce4_8422_2325u64;
        for byte in source_name.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn peaks_per_second(&self) -> u32 {
        self.peaks_per_second
    }

    pub fn duration_seconds(&self) -> f64 {
        self.peaks.len() as f64 / self.peaks_per_second as f64
    }

    /// Peak amplitude at an audio time; silence outside the sequence
    pub fn amplitude_at(&self, t: f64) -> f32 {
        if t < 0.0 {
            return 0.0;
        }
        let index = (t * self.peaks_per_second as f64).floor() as usize;
        self.peaks.get(index).copied().unwrap_or(0.0)
    }

    /// Resample the window `[start_seconds, end_seconds)` into `buckets`
    /// draw-ready amplitudes. Each bucket takes the max of the peaks it
    /// covers (skip-sampling when zoomed out keeps transients visible);
    /// spans outside the sequence contribute silence, so windows that
    /// overhang either end stay well-formed.
    pub fn resample(&self, start_seconds: f64, end_seconds: f64, buckets: usize) -> Vec<f32> {
        if buckets == 0 || end_seconds <= start_seconds {
            return Vec::new();
        }
        let pps = self.peaks_per_second as f64;
        let span = end_seconds - start_seconds;

        (0..buckets)
            .map(|b| {
                let t0 = start_seconds + span * b as f64 / buckets as f64;
                let t1 = start_seconds + span * (b + 1) as f64 / buckets as f64;
                let first = (t0 * pps).floor() as i64;
                let last = ((t1 * pps).ceil() as i64).max(first + 1);

                let mut max = 0.0f32;
                for i in first..last {
                    if i >= 0 {
                        if let Some(&peak) = self.peaks.get(i as usize) {
                            max = max.max(peak);
                        }
                    }
                }
                max
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 20 frames of stereo at 100Hz: first 10 frames at |0.5|, rest at 1.0
    fn two_block_audio() -> DecodedAudio {
        let mut samples = Vec::new();
        for i in 0..10 {
            let s = if i % 2 == 0 { 0.5 } else { -0.5 };
            samples.extend_from_slice(&[s, s]);
        }
        for _ in 0..10 {
            samples.extend_from_slice(&[1.0, 1.0]);
        }
        DecodedAudio {
            samples,
            sample_rate: 100,
            channels: 2,
        }
    }

    #[test]
    fn block_averaging_normalizes_to_unit_range() {
        let waveform = WaveformSamples::from_decoded(&two_block_audio(), 10);
        assert_eq!(waveform.len(), 2, "20 frames at 100Hz and 10pps is 2 peaks");
        assert!((waveform.amplitude_at(0.0) - 0.5).abs() < 1e-6);
        assert!((waveform.amplitude_at(0.15) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn loud_sources_still_land_in_unit_range() {
        let audio = DecodedAudio {
            samples: vec![2.0; 400],
            sample_rate: 100,
            channels: 2,
        };
        let waveform = WaveformSamples::from_decoded(&audio, 10);
        assert!(waveform.len() > 0);
        for i in 0..waveform.len() {
            let amp = waveform.amplitude_at(i as f64 / 10.0);
            assert!((0.0..=1.0).contains(&amp), "peak {} out of range: {}", i, amp);
        }
    }

    #[test]
    fn silent_source_stays_flat_without_dividing_by_zero() {
        let audio = DecodedAudio {
            samples: vec![0.0; 200],
            sample_rate: 100,
            channels: 1,
        };
        let waveform = WaveformSamples::from_decoded(&audio, 10);
        assert!(waveform.amplitude_at(0.5) == 0.0);
    }

    #[test]
    fn duration_follows_peak_resolution() {
        let waveform = WaveformSamples::from_decoded(&two_block_audio(), 10);
        assert!((waveform.duration_seconds() - 0.2).abs() < 1e-9);
        assert_eq!(waveform.peaks_per_second(), 10);
    }

    #[test]
    fn fallback_is_deterministic_per_seed() {
        let a = WaveformSamples::fallback(42, 3.0, 50);
        let b = WaveformSamples::fallback(42, 3.0, 50);
        assert_eq!(a, b, "same seed must reproduce the same shape");
        assert_eq!(a.len(), 150);
        for i in 0..a.len() {
            let amp = a.amplitude_at(i as f64 / 50.0);
            assert!((0.0..=1.0).contains(&amp));
        }
    }

    #[test]
    fn fallback_seed_is_stable_per_source_name() {
        assert_eq!(
            WaveformSamples::fallback_seed("mix-v3.wav"),
            WaveformSamples::fallback_seed("mix-v3.wav")
        );
        assert_ne!(
            WaveformSamples::fallback_seed("mix-v3.wav"),
            WaveformSamples::fallback_seed("mix-v4.wav")
        );
    }

    #[test]
    fn resample_pads_out_of_range_with_silence() {
        let waveform = WaveformSamples::from_decoded(&two_block_audio(), 10);
        // Window hangs off both ends of the 0.2s sequence
        let buckets = waveform.resample(-1.0, 1.0, 20);
        assert_eq!(buckets.len(), 20);
        assert_eq!(buckets[0], 0.0, "before the sequence is silence");
        assert_eq!(buckets[19], 0.0, "after the sequence is silence");
        assert!(buckets.iter().any(|&b| b > 0.0), "real peaks still show");
    }

    #[test]
    fn resample_degenerate_window_is_empty() {
        let waveform = WaveformSamples::from_decoded(&two_block_audio(), 10);
        assert!(waveform.resample(1.0, 1.0, 10).is_empty());
        assert!(waveform.resample(0.0, 1.0, 0).is_empty());
    }
}
