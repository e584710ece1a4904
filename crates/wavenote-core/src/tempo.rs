//! Tempo grid and tap-tempo
//!
//! The grid overlays beat (and bar) lines on the timeline without touching
//! waveform data. BPM comes from the user: typed, tapped, or persisted in
//! the config. Automatic tempo detection is a separate concern and lives
//! outside this crate.

use serde::{Deserialize, Serialize};

/// Slowest tempo the grid accepts
pub const MIN_BPM: f64 = 30.0;

/// Fastest tempo the grid accepts
pub const MAX_BPM: f64 = 300.0;

/// Taps older than this are dropped from the rolling buffer
pub const TAP_WINDOW_SECONDS: f64 = 2.0;

/// Beats per bar for bar-mode grid lines
pub const BEATS_PER_BAR: u32 = 4;

/// How the grid renders, if at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    #[default]
    None,
    Beats,
    Bars,
}

impl GridMode {
    /// Next mode in the UI cycle: none -> beats -> bars -> none
    pub fn cycle(self) -> GridMode {
        match self {
            GridMode::None => GridMode::Beats,
            GridMode::Beats => GridMode::Bars,
            GridMode::Bars => GridMode::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GridMode::None => "Off",
            GridMode::Beats => "Beats",
            GridMode::Bars => "Bars",
        }
    }
}

/// Tempo grid parameters.
///
/// `bpm` always stays within `[MIN_BPM, MAX_BPM]`; `offset_seconds` shifts
/// beat zero away from t=0 so the grid can be aligned to the music.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoGrid {
    pub bpm: f64,
    pub mode: GridMode,
    pub offset_seconds: f64,
}

impl Default for TempoGrid {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            mode: GridMode::None,
            offset_seconds: 0.0,
        }
    }
}

impl TempoGrid {
    /// Set the BPM, clamped into the valid range
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Fractional beat index at an audio time (ignores `offset_seconds`;
    /// grid walking applies the offset when placing lines)
    pub fn beat_at_time(&self, t: f64) -> f64 {
        t * self.bpm / 60.0
    }

    /// Audio time of a fractional beat index; exact inverse of
    /// [`beat_at_time`](Self::beat_at_time)
    pub fn time_at_beat(&self, beat: f64) -> f64 {
        beat * 60.0 / self.bpm
    }

    /// Move beat zero so a grid line lands exactly on `t`
    pub fn align_offset_to(&mut self, t: f64) {
        self.offset_seconds = t.rem_euclid(self.seconds_per_beat());
    }
}

/// Rolling tap buffer that averages recent inter-tap intervals into a BPM.
///
/// Timestamps are caller-supplied seconds from any monotonic origin, which
/// keeps the averaging testable without real sleeps.
#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    taps: Vec<f64>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tap at `at_seconds` and return the derived BPM, if the
    /// buffer holds at least two taps and the mean interval lands inside
    /// `[MIN_BPM, MAX_BPM]`. Out-of-range results are noise: they are
    /// rejected and the caller's current BPM stays as it was.
    pub fn tap(&mut self, at_seconds: f64) -> Option<f64> {
        self.taps.push(at_seconds);
        self.taps
            .retain(|&t| at_seconds - t <= TAP_WINDOW_SECONDS);

        if self.taps.len() < 2 {
            return None;
        }

        let intervals = self.taps.len() - 1;
        let span = self.taps[intervals] - self.taps[0];
        let mean_interval_ms = span / intervals as f64 * 1000.0;
        if mean_interval_ms <= 0.0 {
            return None;
        }

        let bpm = (60_000.0 / mean_interval_ms).round();
        if (MIN_BPM..=MAX_BPM).contains(&bpm) {
            Some(bpm)
        } else {
            log::debug!("Tap tempo rejected {:.0} BPM (out of range)", bpm);
            None
        }
    }

    /// Forget all buffered taps
    pub fn reset(&mut self) {
        self.taps.clear();
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_time_conversions_are_inverse() {
        let grid = TempoGrid {
            bpm: 174.0,
            ..TempoGrid::default()
        };
        for t in [0.0, 0.37, 12.5, 301.99] {
            let back = grid.time_at_beat(grid.beat_at_time(t));
            assert!(
                (back - t).abs() < 1e-9,
                "time {} came back as {}",
                t,
                back
            );
        }
    }

    #[test]
    fn set_bpm_clamps_to_valid_range() {
        let mut grid = TempoGrid::default();
        grid.set_bpm(10.0);
        assert_eq!(grid.bpm, MIN_BPM);
        grid.set_bpm(1000.0);
        assert_eq!(grid.bpm, MAX_BPM);
    }

    #[test]
    fn align_offset_lands_a_line_on_the_cursor() {
        let mut grid = TempoGrid {
            bpm: 120.0,
            ..TempoGrid::default()
        };
        grid.align_offset_to(10.3);
        // 120 BPM = 0.5s/beat; 10.3 is 0.3 past a beat boundary
        assert!((grid.offset_seconds - 0.3).abs() < 1e-9);
    }

    #[test]
    fn steady_half_second_taps_converge_to_120() {
        let mut taps = TapTempo::new();
        let mut bpm = None;
        for i in 0..4 {
            bpm = taps.tap(i as f64 * 0.5);
        }
        assert_eq!(bpm, Some(120.0), "500ms spacing is 120 BPM");
    }

    #[test]
    fn out_of_range_taps_are_rejected() {
        // 100ms spacing implies 600 BPM: rejected, caller keeps its BPM
        let mut taps = TapTempo::new();
        taps.tap(0.0);
        assert_eq!(taps.tap(0.1), None);

        // Single interval of 2.0s exactly hits MIN_BPM and is accepted;
        // anything slower has left the rolling window entirely
        let mut slow = TapTempo::new();
        slow.tap(0.0);
        assert_eq!(slow.tap(2.0), Some(30.0));
    }

    #[test]
    fn stale_taps_fall_out_of_the_window() {
        let mut taps = TapTempo::new();
        taps.tap(0.0);
        taps.tap(0.5);
        // 10 seconds later both earlier taps are stale; one fresh tap is
        // not enough to produce a tempo
        assert_eq!(taps.tap(10.0), None);
        assert_eq!(taps.tap_count(), 1);
    }
}
