//! Beat/bar grid lines for the visible window
//!
//! Walks integer beat indices across the window instead of accumulating
//! floating-point steps, so line positions stay exact at any scroll offset.
//! Very wide windows coarsen the step rather than emitting thousands of
//! lines.

use wavenote_core::{GridMode, TempoGrid, BEATS_PER_BAR};

use super::axis::TimeAxis;

/// Upper bound on lines emitted for one frame.
const MAX_GRID_LINES: usize = 200;

/// One vertical grid line ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub time_seconds: f64,
    pub pixel_x: f32,
    pub is_bar: bool,
}

/// Grid lines inside the window, in time order. Lines never precede the
/// grid offset (the musical downbeat).
pub fn grid_lines(tempo: &TempoGrid, axis: &TimeAxis) -> Vec<GridLine> {
    if tempo.mode == GridMode::None || axis.is_degenerate() {
        return Vec::new();
    }
    let seconds_per_beat = tempo.seconds_per_beat();
    if seconds_per_beat <= 0.0 {
        return Vec::new();
    }

    // Beats mode draws every beat; bars mode only every fourth.
    let mut step: i64 = match tempo.mode {
        GridMode::Beats => 1,
        GridMode::Bars => BEATS_PER_BAR as i64,
        GridMode::None => return Vec::new(),
    };

    let start = axis.visible_start();
    let end = axis.visible_end();
    while (end - start) / (seconds_per_beat * step as f64) > MAX_GRID_LINES as f64 {
        step *= 2;
    }

    let first_index = (((start - tempo.offset_seconds) / seconds_per_beat) / step as f64)
        .floor() as i64;
    let mut lines = Vec::new();
    let mut i = first_index.max(0);
    loop {
        let beat_index = i * step;
        let t = tempo.offset_seconds + beat_index as f64 * seconds_per_beat;
        if t > end {
            break;
        }
        if t >= start {
            lines.push(GridLine {
                time_seconds: t,
                pixel_x: axis.time_to_pixel(t),
                is_bar: beat_index % BEATS_PER_BAR as i64 == 0,
            });
        }
        i += 1;
    }
    lines
}
