//! Waveform timeline widget
//!
//! One canvas, two horizontal bands: the zoomable timeline on top and a
//! full-source overview strip at the bottom. The canvas is a pure view over
//! [`TimelineState`]; pointer input is classified by [`GestureRouter`] and
//! surfaced to the application as [`TimelineEvent`]s, so all mutation goes
//! through whatever owns the state. Mapping between audio time and pixels is
//! a single bijection ([`TimeAxis`]) shared by drawing and hit-testing.

mod annotations;
mod axis;
mod canvas;
mod gesture;
mod state;
mod tempo_grid;
mod viewport;

pub use annotations::{
    hit_test, project, tooltip_left, GlyphMetrics, ScreenAnnotation, TOOLTIP_HEIGHT,
    TOOLTIP_WIDTH,
};
pub use axis::TimeAxis;
pub use canvas::{band_at, strip_time, TimelineCanvas, WHEEL_ZOOM_STEP};
pub use gesture::{
    Band, DragOutcome, GestureRouter, CLICK_THRESHOLD_PX, DOUBLE_TAP_SLOP_PX,
    DOUBLE_TAP_WINDOW_MS, PHANTOM_CLICK_WINDOW_MS,
};
pub use state::{TimelineState, BAND_GAP, DOUBLE_TAP_ZOOM, OVERVIEW_STRIP_HEIGHT};
pub use tempo_grid::{grid_lines, GridLine};
pub use viewport::{
    InertiaState, ViewportState, AUTO_FOLLOW_TRAILING_FRACTION, MAX_ZOOM, MIN_ZOOM,
    MOMENTUM_DECAY, MOMENTUM_EPSILON,
};

use wavenote_core::AnnotationId;

/// What the timeline canvas wants the application to do.
///
/// The canvas never touches [`TimelineState`] itself; every classified
/// gesture becomes one of these, mapped into the application's message type
/// by the `on_event` callback.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// Pointer went down somewhere on the widget. Cancels momentum and
    /// hover, and pauses auto-follow for the duration of the gesture.
    GestureBegan,
    /// Gesture ended without producing anything else (slow drag release,
    /// suppressed phantom click, pointer lost).
    GestureEnded,
    /// Horizontal drag over the timeline band, already converted to
    /// seconds at the current zoom.
    PanBy(f64),
    /// Wheel zoom anchored at the pointer.
    ZoomAt {
        pixel_x: f32,
        factor: f64,
        viewport_width: f32,
    },
    /// Second tap of a touch double-tap on the timeline band.
    DoubleTapZoom { pixel_x: f32, viewport_width: f32 },
    /// Drag over the timeline band released fast enough to coast.
    Flick {
        velocity_px_per_frame: f32,
        viewport_width: f32,
    },
    /// Click on empty timeline, resolved to audio time.
    Seek(f64),
    /// Click landed on an annotation glyph.
    AnnotationClicked(AnnotationId),
    /// Press or scrub on the overview strip; absolute target time.
    StripSeek(f64),
    /// Idle pointer moved over (or off) an annotation glyph.
    HoverChanged(Option<AnnotationId>),
}
