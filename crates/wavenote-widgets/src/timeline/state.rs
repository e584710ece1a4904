//! Timeline widget state
//!
//! `TimelineState` holds everything the canvas needs to paint one frame:
//! waveform peaks, the viewport window, annotations, tempo grid, playback
//! snapshot and transient UI flags. It lives at the application level
//! (iced 0.14 pattern) and the canvas consumes a reference.
//!
//! Geometry is retained in an `iced` canvas cache, so every mutator that
//! changes what a frame would look like clears the cache; nothing repaints
//! while the state is untouched.

use std::sync::Arc;

use iced::widget::canvas;

use wavenote_core::{Annotation, AnnotationId, PlaybackSession, TempoGrid, WaveformSamples};

use super::viewport::{InertiaState, ViewportState, MIN_ZOOM};

// =============================================================================
// Layout constants
// =============================================================================

/// Height of the full-track overview strip at the bottom of the widget
pub const OVERVIEW_STRIP_HEIGHT: f32 = 36.0;

/// Gap between the main timeline band and the overview strip
pub const BAND_GAP: f32 = 6.0;

/// Zoom level a double-tap jumps to from the fitted view
pub const DOUBLE_TAP_ZOOM: f64 = 8.0;

// =============================================================================
// Timeline state
// =============================================================================

/// All data behind one timeline widget.
///
/// Mutate only through the methods here; they keep the viewport clamped and
/// the render cache coherent.
pub struct TimelineState {
    cache: canvas::Cache,
    pub(crate) waveform: Option<Arc<WaveformSamples>>,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) viewport: ViewportState,
    pub(crate) inertia: InertiaState,
    /// Canvas width captured when the flick was released, used to convert
    /// px/frame velocity into seconds while coasting.
    momentum_width: f32,
    pub(crate) tempo: TempoGrid,
    pub(crate) current_time_seconds: f64,
    pub(crate) is_playing: bool,
    pub(crate) hovered: Option<AnnotationId>,
    pub(crate) selected: Option<AnnotationId>,
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
    /// Playback start was refused; waiting for a qualifying user gesture.
    pub(crate) awaiting_user_gesture: bool,
    gesture_active: bool,
    follow_playhead: bool,
    double_tap_zoom_level: f64,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineState {
    pub fn new() -> Self {
        Self {
            cache: canvas::Cache::new(),
            waveform: None,
            annotations: Vec::new(),
            viewport: ViewportState::default(),
            inertia: InertiaState::default(),
            momentum_width: 0.0,
            tempo: TempoGrid::default(),
            current_time_seconds: 0.0,
            is_playing: false,
            hovered: None,
            selected: None,
            loading: false,
            error: None,
            awaiting_user_gesture: false,
            gesture_active: false,
            follow_playhead: true,
            double_tap_zoom_level: DOUBLE_TAP_ZOOM,
        }
    }

    pub(crate) fn cache(&self) -> &canvas::Cache {
        &self.cache
    }

    /// Forces the next draw to regenerate geometry.
    pub fn request_redraw(&self) {
        self.cache.clear();
    }

    // -------------------------------------------------------------------
    // Source lifecycle
    // -------------------------------------------------------------------

    /// A new source was selected; show the loading placeholder and drop
    /// per-source UI state.
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
        self.waveform = None;
        self.hovered = None;
        self.selected = None;
        self.inertia.cancel();
        self.request_redraw();
    }

    /// Decode finished: install the peaks and reset the window to the
    /// whole file.
    pub fn finish_load(&mut self, duration_seconds: f64, waveform: Arc<WaveformSamples>) {
        self.loading = false;
        self.error = None;
        self.waveform = Some(waveform);
        self.viewport.reset_for_duration(duration_seconds);
        self.current_time_seconds = 0.0;
        self.is_playing = false;
        self.request_redraw();
    }

    /// Decode failed: surface a retryable error without touching whatever
    /// viewport and annotations are already on screen.
    pub fn fail_load(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
        self.request_redraw();
    }

    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        if self
            .hovered
            .is_some_and(|id| !annotations.iter().any(|a| a.id == id))
        {
            self.hovered = None;
        }
        if self
            .selected
            .is_some_and(|id| !annotations.iter().any(|a| a.id == id))
        {
            self.selected = None;
        }
        self.annotations = annotations;
        self.request_redraw();
    }

    // -------------------------------------------------------------------
    // Playback snapshot
    // -------------------------------------------------------------------

    /// Copies the clock snapshot in after a discrete transition (seek while
    /// paused, play/pause toggle).
    pub fn apply_session(&mut self, session: &PlaybackSession) {
        if self.current_time_seconds != session.current_time_seconds
            || self.is_playing != session.is_playing
        {
            self.current_time_seconds = session.current_time_seconds;
            self.is_playing = session.is_playing;
            self.request_redraw();
        }
    }

    /// Per-frame advance: refresh the playback snapshot, run one inertia
    /// step when coasting, otherwise let auto-follow chase the playhead.
    pub fn tick(&mut self, session: &PlaybackSession) {
        self.current_time_seconds = session.current_time_seconds;
        self.is_playing = session.is_playing;

        if self.inertia.is_active() {
            self.viewport
                .step_momentum(&mut self.inertia, self.momentum_width);
        } else if self.is_playing && self.follow_playhead && !self.gesture_active {
            self.viewport.follow_playhead(self.current_time_seconds);
        }
        self.request_redraw();
    }

    // -------------------------------------------------------------------
    // Gestures
    // -------------------------------------------------------------------

    /// Any pointer press: momentum dies, hover clears, auto-follow yields.
    pub fn begin_gesture(&mut self) {
        self.gesture_active = true;
        self.inertia.cancel();
        if self.hovered.take().is_some() {
            self.request_redraw();
        }
    }

    pub fn end_gesture(&mut self) {
        self.gesture_active = false;
    }

    pub fn pan_by(&mut self, delta_seconds: f64) {
        if self.viewport.pan_by(delta_seconds) {
            self.request_redraw();
        }
    }

    pub fn zoom_at(&mut self, pixel_x: f32, factor: f64, viewport_width: f32) {
        self.inertia.cancel();
        self.viewport.zoom_at(pixel_x, factor, viewport_width);
        self.request_redraw();
    }

    /// Double-tap toggles between the fitted view and a fixed zoom anchored
    /// at the tap.
    pub fn double_tap_zoom(&mut self, pixel_x: f32, viewport_width: f32) {
        self.inertia.cancel();
        if self.viewport.zoom_level() > MIN_ZOOM {
            self.viewport.zoom_to_fit();
        } else {
            self.viewport
                .zoom_at(pixel_x, self.double_tap_zoom_level, viewport_width);
        }
        self.request_redraw();
    }

    pub fn start_inertia(&mut self, velocity_px_per_frame: f32, viewport_width: f32) {
        self.momentum_width = viewport_width;
        self.inertia.start(velocity_px_per_frame);
    }

    pub fn is_inertia_active(&self) -> bool {
        self.inertia.is_active()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture_active
    }

    // -------------------------------------------------------------------
    // Selection / hover
    // -------------------------------------------------------------------

    pub fn set_hover(&mut self, id: Option<AnnotationId>) {
        if self.hovered != id {
            self.hovered = id;
            self.request_redraw();
        }
    }

    pub fn select(&mut self, id: Option<AnnotationId>) {
        if self.selected != id {
            self.selected = id;
            self.request_redraw();
        }
    }

    pub fn hovered(&self) -> Option<AnnotationId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    // -------------------------------------------------------------------
    // Tempo grid
    // -------------------------------------------------------------------

    pub fn set_bpm(&mut self, bpm: f64) {
        self.tempo.set_bpm(bpm);
        self.request_redraw();
    }

    /// Replaces the whole grid, e.g. when restoring persisted settings.
    pub fn set_tempo(&mut self, tempo: TempoGrid) {
        self.tempo = tempo;
        self.tempo.set_bpm(tempo.bpm);
        self.request_redraw();
    }

    pub fn cycle_grid_mode(&mut self) {
        self.tempo.mode = self.tempo.mode.cycle();
        self.request_redraw();
    }

    /// Aligns the grid downbeat to the given time (usually the playhead).
    pub fn align_grid_to(&mut self, t: f64) {
        self.tempo.align_offset_to(t);
        self.request_redraw();
    }

    pub fn tempo(&self) -> &TempoGrid {
        &self.tempo
    }

    // -------------------------------------------------------------------
    // Misc flags
    // -------------------------------------------------------------------

    /// Disables auto-follow while keeping manual navigation untouched.
    pub fn set_follow_playhead(&mut self, follow: bool) {
        self.follow_playhead = follow;
    }

    /// Zoom level a double-tap jumps to; clamped away from the fitted view
    /// so the toggle always has somewhere to go.
    pub fn set_double_tap_zoom_level(&mut self, level: f64) {
        self.double_tap_zoom_level = level.max(MIN_ZOOM * 2.0);
    }

    pub fn set_awaiting_user_gesture(&mut self, awaiting: bool) {
        if self.awaiting_user_gesture != awaiting {
            self.awaiting_user_gesture = awaiting;
            self.request_redraw();
        }
    }

    pub fn awaiting_user_gesture(&self) -> bool {
        self.awaiting_user_gesture
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn current_time(&self) -> f64 {
        self.current_time_seconds
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavenote_core::{AnnotationKind, Priority, Status};

    fn session(time: f64, playing: bool) -> PlaybackSession {
        PlaybackSession {
            duration_seconds: 200.0,
            current_time_seconds: time,
            is_playing: playing,
            volume: 1.0,
            is_muted: false,
        }
    }

    fn loaded_state() -> TimelineState {
        let mut state = TimelineState::new();
        state.finish_load(200.0, Arc::new(WaveformSamples::from_peaks(vec![0.5; 200], 1)));
        state
    }

    #[test]
    fn begin_gesture_cancels_momentum_and_hover() {
        let mut state = loaded_state();
        state.start_inertia(5.0, 800.0);
        state.set_hover(Some(AnnotationId(3)));
        state.begin_gesture();
        assert!(!state.is_inertia_active());
        assert_eq!(state.hovered(), None);
        assert!(state.is_gesture_active());
        state.end_gesture();
        assert!(!state.is_gesture_active());
    }

    #[test]
    fn wheel_zoom_cancels_momentum() {
        let mut state = loaded_state();
        state.start_inertia(5.0, 800.0);
        state.zoom_at(400.0, 2.0, 800.0);
        assert!(!state.is_inertia_active());
    }

    #[test]
    fn ticks_decay_momentum_to_rest() {
        let mut state = loaded_state();
        state.zoom_at(0.0, 4.0, 800.0);
        state.pan_by(60.0);
        state.start_inertia(5.0, 800.0);
        for _ in 0..90 {
            state.tick(&session(0.0, false));
        }
        assert!(!state.is_inertia_active());
    }

    #[test]
    fn auto_follow_waits_for_gesture_to_end() {
        let mut state = loaded_state();
        state.zoom_at(0.0, 4.0, 800.0);
        state.begin_gesture();
        state.tick(&session(49.0, true));
        assert_eq!(state.viewport().scroll_offset(), 0.0);

        state.end_gesture();
        state.tick(&session(49.0, true));
        assert!(state.viewport().scroll_offset() > 0.0);
    }

    #[test]
    fn auto_follow_yields_to_inertia() {
        let mut state = loaded_state();
        state.zoom_at(0.0, 4.0, 800.0);
        // Flick left so inertia pushes the window right.
        state.start_inertia(-20.0, 800.0);
        state.tick(&session(49.0, true));
        // One inertia step: 20 px/frame at 50s/800px = 1.25s. Auto-follow
        // pinning at the 90% line would have jumped straight to 4.0s.
        let after = state.viewport().scroll_offset();
        assert!((after - 1.25).abs() < 1e-9, "scroll was {}", after);
    }

    #[test]
    fn double_tap_toggles_between_fit_and_zoomed() {
        let mut state = loaded_state();
        state.double_tap_zoom(400.0, 800.0);
        assert_eq!(state.viewport().zoom_level(), DOUBLE_TAP_ZOOM);
        state.double_tap_zoom(100.0, 800.0);
        assert_eq!(state.viewport().zoom_level(), MIN_ZOOM);
        assert_eq!(state.viewport().scroll_offset(), 0.0);
    }

    #[test]
    fn failed_load_keeps_existing_view_state() {
        let mut state = loaded_state();
        state.zoom_at(400.0, 4.0, 800.0);
        let window = *state.viewport();
        state.fail_load("decode failed".into());
        assert_eq!(state.error(), Some("decode failed"));
        assert!(state.waveform.is_some());
        assert_eq!(*state.viewport(), window);
    }

    #[test]
    fn stale_selection_clears_when_annotations_change() {
        let mut state = loaded_state();
        let note = Annotation {
            id: AnnotationId(1),
            timestamp_seconds: 10.0,
            text: "drop".into(),
            kind: AnnotationKind::Marker,
            priority: Priority::High,
            status: Status::Pending,
            parent_id: None,
        };
        state.set_annotations(vec![note.clone()]);
        state.select(Some(AnnotationId(1)));
        state.set_hover(Some(AnnotationId(1)));

        state.set_annotations(Vec::new());
        assert_eq!(state.selected(), None);
        assert_eq!(state.hovered(), None);

        state.set_annotations(vec![note]);
        state.select(Some(AnnotationId(1)));
        state.set_annotations(vec![Annotation {
            id: AnnotationId(1),
            timestamp_seconds: 12.0,
            text: "drop moved".into(),
            kind: AnnotationKind::Marker,
            priority: Priority::High,
            status: Status::Pending,
            parent_id: None,
        }]);
        assert_eq!(state.selected(), Some(AnnotationId(1)));
    }
}
