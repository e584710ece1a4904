//! Projection of annotations into screen space, plus glyph hit-testing
//!
//! The projector turns the annotation set into the per-frame list of visible
//! markers: root annotations inside the window, normalized x, timestamp
//! order. Hit-testing walks the same list in the same order and returns the
//! first glyph containing the pointer, so when markers cluster the earliest
//! one wins both visually and interactively. Glyph geometry lives in one
//! place ([`GlyphMetrics`]) so drawing and hit zones can never disagree.

use iced::{Point, Rectangle, Size};

use wavenote_core::{Annotation, AnnotationId, AnnotationKind, Priority, Status};

use super::axis::TimeAxis;

pub const TOOLTIP_WIDTH: f32 = 220.0;
pub const TOOLTIP_HEIGHT: f32 = 56.0;

const BUBBLE_WIDTH: f32 = 18.0;
const BUBBLE_HEIGHT: f32 = 14.0;
const BUBBLE_TOP: f32 = 6.0;
const LINE_HIT_HALF_WIDTH: f32 = 3.0;
/// Glyphs shrink on narrow viewports but never below this factor.
const MIN_GLYPH_SCALE: f32 = 0.6;
const REFERENCE_VIEWPORT_WIDTH: f32 = 800.0;

/// A root annotation mapped into the current window.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenAnnotation {
    pub id: AnnotationId,
    pub timestamp_seconds: f64,
    /// Horizontal position as a fraction of the viewport, 0 = left edge.
    pub screen_x: f64,
    pub kind: AnnotationKind,
    pub priority: Priority,
    pub status: Status,
    pub reply_count: usize,
}

impl ScreenAnnotation {
    pub fn pixel_x(&self, viewport_width: f32) -> f32 {
        (self.screen_x * viewport_width as f64) as f32
    }
}

/// Bubble and line dimensions for the current viewport width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub scale: f32,
    pub bubble_width: f32,
    pub bubble_height: f32,
    pub bubble_top: f32,
}

impl GlyphMetrics {
    pub fn for_viewport(viewport_width: f32) -> Self {
        let scale = (viewport_width / REFERENCE_VIEWPORT_WIDTH).clamp(MIN_GLYPH_SCALE, 1.0);
        Self {
            scale,
            bubble_width: BUBBLE_WIDTH * scale,
            bubble_height: BUBBLE_HEIGHT * scale,
            bubble_top: BUBBLE_TOP * scale,
        }
    }

    /// Bubble box centered on the annotation's pixel column.
    pub fn bubble_rect(&self, pixel_x: f32) -> Rectangle {
        Rectangle::new(
            Point::new(pixel_x - self.bubble_width / 2.0, self.bubble_top),
            Size::new(self.bubble_width, self.bubble_height),
        )
    }

    /// Hit zone of the thin vertical line under the bubble.
    pub fn line_hit_rect(&self, pixel_x: f32, band_height: f32) -> Rectangle {
        let top = self.bubble_top + self.bubble_height;
        Rectangle::new(
            Point::new(pixel_x - LINE_HIT_HALF_WIDTH, top),
            Size::new(LINE_HIT_HALF_WIDTH * 2.0, (band_height - top).max(0.0)),
        )
    }
}

/// Maps root annotations inside the visible window to screen space, sorted
/// by timestamp ascending.
pub fn project(annotations: &[Annotation], axis: &TimeAxis) -> Vec<ScreenAnnotation> {
    if axis.is_degenerate() {
        return Vec::new();
    }
    let start = axis.visible_start();
    let end = axis.visible_end();
    let mut visible: Vec<ScreenAnnotation> = annotations
        .iter()
        .filter(|a| a.is_root())
        .filter(|a| a.timestamp_seconds >= start && a.timestamp_seconds <= end)
        .map(|a| ScreenAnnotation {
            id: a.id,
            timestamp_seconds: a.timestamp_seconds,
            screen_x: axis.normalized_x(a.timestamp_seconds),
            kind: a.kind,
            priority: a.priority,
            status: a.status,
            reply_count: annotations
                .iter()
                .filter(|r| r.parent_id == Some(a.id))
                .count(),
        })
        .collect();
    visible.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
    visible
}

/// First visible glyph (bubble or line) containing the pointer, in
/// projection order.
pub fn hit_test(
    visible: &[ScreenAnnotation],
    pointer: Point,
    viewport_width: f32,
    band_height: f32,
) -> Option<AnnotationId> {
    let metrics = GlyphMetrics::for_viewport(viewport_width);
    visible.iter().find_map(|a| {
        let px = a.pixel_x(viewport_width);
        if metrics.bubble_rect(px).contains(pointer)
            || metrics.line_hit_rect(px, band_height).contains(pointer)
        {
            Some(a.id)
        } else {
            None
        }
    })
}

/// Left edge of a tooltip centered on `pixel_x`, clamped fully on screen.
pub fn tooltip_left(pixel_x: f32, viewport_width: f32) -> f32 {
    (pixel_x - TOOLTIP_WIDTH / 2.0).clamp(0.0, (viewport_width - TOOLTIP_WIDTH).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(id: u64, t: f64) -> Annotation {
        Annotation {
            id: AnnotationId(id),
            timestamp_seconds: t,
            text: format!("note {}", id),
            kind: AnnotationKind::Comment,
            priority: Priority::Medium,
            status: Status::Pending,
            parent_id: None,
        }
    }

    fn reply(id: u64, t: f64, parent: u64) -> Annotation {
        Annotation {
            parent_id: Some(AnnotationId(parent)),
            ..annotation(id, t)
        }
    }

    fn window_axis() -> TimeAxis {
        // 200s source at zoom 4, scrolled to 75s: window [75, 125].
        TimeAxis::new(75.0, 50.0, 800.0)
    }

    #[test]
    fn annotation_at_100s_projects_to_center() {
        let axis = window_axis();
        let visible = project(&[annotation(1, 100.0)], &axis);
        assert_eq!(visible.len(), 1);
        assert!((visible[0].screen_x - 0.5).abs() < 1e-12);
        assert!((visible[0].pixel_x(axis.width()) - 400.0).abs() < 1e-3);
    }

    #[test]
    fn window_filter_is_inclusive_of_both_edges() {
        let axis = window_axis();
        let set = [
            annotation(1, 74.999),
            annotation(2, 75.0),
            annotation(3, 125.0),
            annotation(4, 125.001),
        ];
        let visible = project(&set, &axis);
        let ids: Vec<u64> = visible.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn replies_never_project() {
        let axis = window_axis();
        let set = [annotation(1, 100.0), reply(2, 101.0, 1), reply(3, 102.0, 1)];
        let visible = project(&set, &axis);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, AnnotationId(1));
        assert_eq!(visible[0].reply_count, 2);
    }

    #[test]
    fn projection_sorts_by_timestamp() {
        let axis = window_axis();
        let set = [
            annotation(5, 120.0),
            annotation(2, 80.0),
            annotation(9, 100.0),
        ];
        let times: Vec<f64> = project(&set, &axis)
            .iter()
            .map(|a| a.timestamp_seconds)
            .collect();
        assert_eq!(times, vec![80.0, 100.0, 120.0]);
    }

    #[test]
    fn degenerate_axis_projects_nothing() {
        let axis = TimeAxis::new(0.0, 0.0, 800.0);
        assert!(project(&[annotation(1, 0.0)], &axis).is_empty());
    }

    #[test]
    fn hit_test_returns_first_match_when_glyphs_overlap() {
        // Two annotations 0.05s apart in a 20s window land 2px apart, so
        // their bubbles overlap almost entirely.
        let axis = TimeAxis::new(0.0, 20.0, 800.0);
        let set = [annotation(7, 10.0), annotation(8, 10.05)];
        let visible = project(&set, &axis);
        let hit = hit_test(&visible, Point::new(401.0, 10.0), 800.0, 300.0);
        assert_eq!(hit, Some(AnnotationId(7)));
    }

    #[test]
    fn hit_test_covers_the_line_below_the_bubble() {
        let axis = window_axis();
        let visible = project(&[annotation(1, 100.0)], &axis);
        assert_eq!(
            hit_test(&visible, Point::new(399.0, 150.0), 800.0, 300.0),
            Some(AnnotationId(1))
        );
        assert_eq!(
            hit_test(&visible, Point::new(390.0, 150.0), 800.0, 300.0),
            None,
            "line hit zone is only a few px wide"
        );
    }

    #[test]
    fn hit_test_misses_empty_space() {
        let axis = window_axis();
        let visible = project(&[annotation(1, 100.0)], &axis);
        assert_eq!(hit_test(&visible, Point::new(100.0, 10.0), 800.0, 300.0), None);
    }

    #[test]
    fn glyphs_shrink_on_narrow_viewports() {
        assert_eq!(GlyphMetrics::for_viewport(800.0).scale, 1.0);
        assert_eq!(GlyphMetrics::for_viewport(1600.0).scale, 1.0);
        assert_eq!(GlyphMetrics::for_viewport(400.0).scale, MIN_GLYPH_SCALE);
        let mid = GlyphMetrics::for_viewport(640.0);
        assert!((mid.scale - 0.8).abs() < 1e-6);
        assert!((mid.bubble_width - BUBBLE_WIDTH * 0.8).abs() < 1e-4);
    }

    #[test]
    fn tooltip_clamps_inside_viewport() {
        // Centered case.
        assert!((tooltip_left(400.0, 800.0) - 290.0).abs() < 1e-4);
        // Near the left edge it pins at 0 instead of going negative.
        assert_eq!(tooltip_left(30.0, 800.0), 0.0);
        // Near the right edge it pins so the box stays inside.
        assert_eq!(tooltip_left(790.0, 800.0), 800.0 - TOOLTIP_WIDTH);
        // Viewport narrower than the tooltip still yields a sane origin.
        assert_eq!(tooltip_left(100.0, 200.0), 0.0);
    }
}
