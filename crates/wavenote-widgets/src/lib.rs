//! Shared UI widgets for wavenote
//!
//! This crate provides the iced timeline widget the annotation player is
//! built around: waveform display with an overview strip, zoom/pan/momentum
//! navigation, annotation glyphs and a tempo grid.
//!
//! ## Architecture (iced 0.14 patterns)
//!
//! - **State structs**: Pure data owned by the application
//!   ([`TimelineState`], [`ViewportState`])
//! - **Canvas Programs**: [`TimelineCanvas`] renders the state and translates
//!   raw events into [`TimelineEvent`]s via a callback closure
//! - **Subscription helpers**: bridge background-worker mpsc channels into
//!   iced subscriptions

pub mod subscription;
pub mod theme;
pub mod timeline;

pub use subscription::mpsc_subscription;

pub use timeline::{
    band_at, grid_lines, hit_test, project, strip_time, Band, DragOutcome, GestureRouter,
    GridLine, InertiaState, ScreenAnnotation, TimeAxis, TimelineCanvas, TimelineEvent,
    TimelineState, ViewportState,
};

pub use timeline::{
    BAND_GAP, DOUBLE_TAP_WINDOW_MS, DOUBLE_TAP_ZOOM, MAX_ZOOM, MIN_ZOOM, OVERVIEW_STRIP_HEIGHT,
    WHEEL_ZOOM_STEP,
};
