//! Zoom and scroll state for the timeline window
//!
//! The viewport owns the zoom/scroll pair and every mutation re-clamps, so
//! the visible window can never leave `[0, duration]` no matter what order
//! gestures arrive in. Inertia lives alongside it as a tiny velocity decay
//! driven from the playback tick.

use super::axis::TimeAxis;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 64.0;

/// Per-frame multiplier applied to flick velocity while inertia runs.
pub const MOMENTUM_DECAY: f32 = 0.95;
/// Inertia stops once velocity magnitude falls below this (px per frame).
pub const MOMENTUM_EPSILON: f32 = 0.05;
/// Releases slower than this never start inertia at all.
pub const MOMENTUM_MIN_START_VELOCITY: f32 = 0.06;

/// When the playhead crosses this far into the window, auto-follow pins it
/// there and scrolls the window under it.
pub const AUTO_FOLLOW_TRAILING_FRACTION: f64 = 0.10;

/// Zoom level and scroll offset for one audio source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    duration_seconds: f64,
    zoom_level: f64,
    scroll_offset_seconds: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            zoom_level: MIN_ZOOM,
            scroll_offset_seconds: 0.0,
        }
    }
}

impl ViewportState {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds: duration_seconds.max(0.0),
            ..Self::default()
        }
    }

    /// Swaps in a new source duration, resetting to the fully zoomed-out view.
    pub fn reset_for_duration(&mut self, duration_seconds: f64) {
        *self = Self::new(duration_seconds);
    }

    pub fn duration(&self) -> f64 {
        self.duration_seconds
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset_seconds
    }

    pub fn visible_duration(&self) -> f64 {
        self.duration_seconds / self.zoom_level
    }

    fn max_scroll(&self) -> f64 {
        (self.duration_seconds - self.visible_duration()).max(0.0)
    }

    /// Axis for the current window at the given canvas width.
    pub fn axis(&self, viewport_width: f32) -> TimeAxis {
        TimeAxis::new(
            self.scroll_offset_seconds,
            self.visible_duration(),
            viewport_width,
        )
    }

    /// Scrolls by `delta_seconds`, clamped to the valid range. Returns
    /// whether the offset actually moved (false once pinned at an edge).
    pub fn pan_by(&mut self, delta_seconds: f64) -> bool {
        let before = self.scroll_offset_seconds;
        self.scroll_offset_seconds =
            (self.scroll_offset_seconds + delta_seconds).clamp(0.0, self.max_scroll());
        (self.scroll_offset_seconds - before).abs() > f64::EPSILON
    }

    /// Multiplies zoom by `factor` while keeping the time under `pixel_x`
    /// stationary on screen.
    pub fn zoom_at(&mut self, pixel_x: f32, factor: f64, viewport_width: f32) {
        let axis = self.axis(viewport_width);
        if axis.is_degenerate() || factor <= 0.0 {
            return;
        }
        let anchor = axis.pixel_to_time(pixel_x);
        let fraction = (pixel_x / viewport_width) as f64;
        self.zoom_level = (self.zoom_level * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.scroll_offset_seconds =
            (anchor - fraction * self.visible_duration()).clamp(0.0, self.max_scroll());
    }

    pub fn at_max_zoom(&self) -> bool {
        self.zoom_level >= MAX_ZOOM
    }

    /// Back to the whole-file view.
    pub fn zoom_to_fit(&mut self) {
        self.zoom_level = MIN_ZOOM;
        self.scroll_offset_seconds = 0.0;
    }

    /// Keeps the playhead on screen during playback by pinning it at the
    /// trailing edge of the window once it gets there. Scrolls forward only;
    /// callers must not invoke this while a gesture or inertia is active.
    pub fn follow_playhead(&mut self, current_time: f64) -> bool {
        let visible = self.visible_duration();
        if visible <= 0.0 {
            return false;
        }
        let pin = visible * (1.0 - AUTO_FOLLOW_TRAILING_FRACTION);
        if current_time < self.scroll_offset_seconds + pin {
            return false;
        }
        let target = (current_time - pin).clamp(0.0, self.max_scroll());
        if target > self.scroll_offset_seconds {
            self.scroll_offset_seconds = target;
            true
        } else {
            false
        }
    }

    /// Advances inertia by one frame: pan by the current velocity, decay it,
    /// stop when it falls under [`MOMENTUM_EPSILON`] or the window hits an
    /// edge. Returns whether inertia is still running.
    pub fn step_momentum(&mut self, inertia: &mut InertiaState, viewport_width: f32) -> bool {
        if !inertia.active {
            return false;
        }
        let seconds_per_pixel = self.axis(viewport_width).seconds_per_pixel();
        // Pointer moving right drags content right, i.e. scroll decreases.
        let moved = self.pan_by(-(inertia.velocity as f64) * seconds_per_pixel);
        inertia.velocity *= MOMENTUM_DECAY;
        if inertia.velocity.abs() < MOMENTUM_EPSILON || !moved {
            inertia.cancel();
        }
        inertia.active
    }
}

/// Momentum left over from a flick release.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InertiaState {
    active: bool,
    velocity: f32,
}

impl InertiaState {
    /// Arms inertia if the release was fast enough to matter.
    pub fn start(&mut self, velocity_px_per_frame: f32) {
        if velocity_px_per_frame.abs() >= MOMENTUM_MIN_START_VELOCITY {
            self.active = true;
            self.velocity = velocity_px_per_frame;
        }
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.velocity = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 800.0;

    #[test]
    fn visible_duration_shrinks_with_zoom() {
        let mut vp = ViewportState::new(200.0);
        assert_eq!(vp.visible_duration(), 200.0);
        vp.zoom_at(400.0, 4.0, WIDTH);
        assert!((vp.visible_duration() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_keeps_anchor_time_under_cursor() {
        let mut vp = ViewportState::new(200.0);
        vp.zoom_at(400.0, 4.0, WIDTH);
        vp.pan_by(30.0);
        let anchor_px = 600.0;
        let before = vp.axis(WIDTH).pixel_to_time(anchor_px);
        vp.zoom_at(anchor_px, 2.0, WIDTH);
        let after = vp.axis(WIDTH).pixel_to_time(anchor_px);
        assert!(
            (after - before).abs() < 1e-6,
            "anchor drifted from {} to {}",
            before,
            after
        );
    }

    #[test]
    fn zoom_out_near_edge_clamps_scroll_into_range() {
        let mut vp = ViewportState::new(100.0);
        vp.zoom_at(0.0, 8.0, WIDTH);
        // Park the window at the far right, then zoom out from the right edge.
        vp.pan_by(1000.0);
        vp.zoom_at(WIDTH, 0.25, WIDTH);
        assert!(vp.scroll_offset() >= 0.0);
        assert!(vp.scroll_offset() + vp.visible_duration() <= 100.0 + 1e-9);
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut vp = ViewportState::new(60.0);
        vp.zoom_at(100.0, 0.01, WIDTH);
        assert_eq!(vp.zoom_level(), MIN_ZOOM);
        vp.zoom_at(100.0, 1e6, WIDTH);
        assert_eq!(vp.zoom_level(), MAX_ZOOM);
        assert!(vp.at_max_zoom());
    }

    #[test]
    fn pan_clamps_and_reports_edge() {
        let mut vp = ViewportState::new(100.0);
        vp.zoom_at(0.0, 4.0, WIDTH);
        assert!(vp.pan_by(10.0));
        assert!(vp.pan_by(1e9));
        assert!((vp.scroll_offset() - 75.0).abs() < 1e-9);
        assert!(!vp.pan_by(5.0), "already pinned at the right edge");
        assert!(vp.pan_by(-1e9));
        assert_eq!(vp.scroll_offset(), 0.0);
        assert!(!vp.pan_by(-1.0));
    }

    #[test]
    fn scroll_stays_valid_through_mixed_gesture_sequence() {
        let mut vp = ViewportState::new(321.7);
        for (px, factor, pan) in [
            (10.0, 3.0, 40.0),
            (790.0, 5.0, -500.0),
            (400.0, 0.1, 9999.0),
            (0.0, 64.0, -3.0),
            (800.0, 0.5, 123.4),
        ] {
            vp.zoom_at(px, factor, WIDTH);
            vp.pan_by(pan);
            assert!(vp.scroll_offset() >= 0.0);
            assert!(
                vp.scroll_offset() + vp.visible_duration() <= vp.duration() + 1e-9,
                "window ran past the end after zoom {} pan {}",
                factor,
                pan
            );
        }
    }

    #[test]
    fn momentum_decays_below_epsilon_within_90_frames() {
        let mut vp = ViewportState::new(600.0);
        vp.zoom_at(0.0, 4.0, WIDTH);
        vp.pan_by(200.0);
        let mut inertia = InertiaState::default();
        inertia.start(5.0);
        assert!(inertia.is_active());
        for _ in 0..90 {
            vp.step_momentum(&mut inertia, WIDTH);
        }
        assert!(!inertia.is_active(), "inertia still running after 90 frames");
        assert!(inertia.velocity().abs() < MOMENTUM_EPSILON);
        let after = vp.scroll_offset();
        vp.step_momentum(&mut inertia, WIDTH);
        assert_eq!(vp.scroll_offset(), after, "pan moved after deactivation");
    }

    #[test]
    fn slow_release_never_starts_inertia() {
        let mut inertia = InertiaState::default();
        inertia.start(0.05);
        assert!(!inertia.is_active());
        inertia.start(-0.06);
        assert!(inertia.is_active());
        assert_eq!(inertia.velocity(), -0.06);
    }

    #[test]
    fn momentum_stops_at_viewport_edge() {
        let mut vp = ViewportState::new(100.0);
        vp.zoom_at(0.0, 4.0, WIDTH);
        // Scroll already at 0; positive velocity pans further left.
        let mut inertia = InertiaState::default();
        inertia.start(5.0);
        assert!(!vp.step_momentum(&mut inertia, WIDTH));
        assert!(!inertia.is_active());
        assert_eq!(vp.scroll_offset(), 0.0);
    }

    #[test]
    fn follow_playhead_pins_at_trailing_edge() {
        let mut vp = ViewportState::new(200.0);
        vp.zoom_at(0.0, 4.0, WIDTH);
        // Window [0, 50): playhead at 20 is well inside, no scroll.
        assert!(!vp.follow_playhead(20.0));
        assert_eq!(vp.scroll_offset(), 0.0);
        // Crossing the 90% line (45s) pins it there.
        assert!(vp.follow_playhead(46.0));
        assert!((vp.scroll_offset() - 1.0).abs() < 1e-9);
        let axis = vp.axis(WIDTH);
        assert!((axis.normalized_x(46.0) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn follow_playhead_never_scrolls_backwards_or_past_end() {
        let mut vp = ViewportState::new(200.0);
        vp.zoom_at(0.0, 4.0, WIDTH);
        vp.pan_by(150.0);
        // Playhead behind the window start: stay put.
        assert!(!vp.follow_playhead(100.0));
        assert!((vp.scroll_offset() - 150.0).abs() < 1e-9);
        // Approaching the end of the file: scroll stops at max.
        vp.follow_playhead(199.0);
        assert!((vp.scroll_offset() - 150.0).abs() < 1e-9);
        assert!(!vp.follow_playhead(200.0));
    }

    #[test]
    fn zoom_to_fit_resets_window() {
        let mut vp = ViewportState::new(90.0);
        vp.zoom_at(300.0, 16.0, WIDTH);
        vp.pan_by(50.0);
        vp.zoom_to_fit();
        assert_eq!(vp.zoom_level(), MIN_ZOOM);
        assert_eq!(vp.scroll_offset(), 0.0);
        assert_eq!(vp.visible_duration(), 90.0);
    }
}
