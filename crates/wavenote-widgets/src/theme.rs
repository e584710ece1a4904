//! Shared theme constants for the timeline widgets
//!
//! Colors and visual metrics used by the timeline canvas. Annotation glyphs
//! are color-coded by kind so clusters stay readable at a glance.

use iced::Color;
use wavenote_core::AnnotationKind;

/// Timeline background
pub const BACKGROUND: Color = Color::from_rgb(0.08, 0.08, 0.10);

/// Overview strip background (slightly lifted from the main band)
pub const STRIP_BACKGROUND: Color = Color::from_rgb(0.11, 0.11, 0.14);

/// Waveform bars ahead of the playhead
pub const BAR_UNPLAYED: Color = Color::from_rgb(0.32, 0.36, 0.46);

/// Waveform bars behind the playhead
pub const BAR_PLAYED: Color = Color::from_rgb(0.25, 0.65, 0.95);

/// Playhead line and dot
pub const PLAYHEAD: Color = Color::from_rgb(1.0, 1.0, 1.0);

/// Soft glow behind the playhead line
pub const PLAYHEAD_GLOW: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.22);

/// Beat grid lines
pub const GRID_BEAT: Color = Color::from_rgba(0.4, 0.4, 0.45, 0.5);

/// Bar grid lines (every fourth beat, emphasized)
pub const GRID_BAR: Color = Color::from_rgba(0.85, 0.35, 0.35, 0.7);

/// Visible-window rectangle in the overview strip
pub const STRIP_WINDOW: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.14);

/// Tooltip background and border
pub const TOOLTIP_BACKGROUND: Color = Color::from_rgba(0.05, 0.05, 0.07, 0.95);
pub const TOOLTIP_BORDER: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.25);

/// Text on dark chrome
pub const TEXT_PRIMARY: Color = Color::from_rgb(0.92, 0.92, 0.95);
pub const TEXT_DIM: Color = Color::from_rgb(0.6, 0.6, 0.65);

/// Selected-annotation outline
pub const SELECTION: Color = Color::from_rgb(1.0, 1.0, 1.0);

/// Inline error messages drawn over the canvas
pub const ERROR_TEXT: Color = Color::from_rgb(0.9, 0.45, 0.4);

/// Annotation glyph color by kind
pub fn annotation_color(kind: AnnotationKind) -> Color {
    match kind {
        AnnotationKind::Comment => Color::from_rgb(0.35, 0.65, 1.0),  // Blue
        AnnotationKind::Marker => Color::from_rgb(1.0, 0.75, 0.2),    // Amber
        AnnotationKind::Voice => Color::from_rgb(0.75, 0.45, 0.95),   // Purple
        AnnotationKind::Section => Color::from_rgb(0.3, 0.85, 0.55),  // Green
        AnnotationKind::Issue => Color::from_rgb(0.95, 0.35, 0.35),   // Red
        AnnotationKind::Approval => Color::from_rgb(0.45, 0.9, 0.85), // Teal
    }
}
