//! Canvas Program for the timeline widget
//!
//! Implements the iced canvas `Program` trait over a borrowed
//! [`TimelineState`]. Input is classified by the [`GestureRouter`] living as
//! the widget's `State` and published as [`TimelineEvent`]s through the
//! `on_event` callback; drawing replays the retained cache, which the state
//! clears whenever a frame would change.
//!
//! Layer order is fixed: background, tempo grid, waveform bars (unplayed
//! then played), playhead, annotation lines, annotation bubbles, tooltip,
//! then the overview strip and status overlays.

use std::time::Instant;

use iced::alignment::{Horizontal, Vertical};
use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Program, Stroke, Text};
use iced::{mouse, touch, Point, Rectangle, Size, Theme};

use wavenote_core::{Annotation, Status};

use crate::theme;

use super::annotations::{self, GlyphMetrics, ScreenAnnotation, TOOLTIP_HEIGHT, TOOLTIP_WIDTH};
use super::axis::TimeAxis;
use super::gesture::{Band, DragOutcome, GestureRouter};
use super::state::{TimelineState, BAND_GAP, OVERVIEW_STRIP_HEIGHT};
use super::tempo_grid::grid_lines;
use super::TimelineEvent;

/// Zoom factor applied per wheel line; scroll up zooms in.
pub const WHEEL_ZOOM_STEP: f64 = 1.10;

/// Pixels per wheel "line" when the platform reports pixel deltas.
const WHEEL_PIXELS_PER_LINE: f32 = 40.0;

const BAR_WIDTH: f32 = 2.0;
const BAR_STRIDE: f32 = 3.0;
const STRIP_BAR_STRIDE: f32 = 2.0;
/// Fraction of the band height a full-scale peak occupies.
const WAVEFORM_VERTICAL_FILL: f32 = 0.9;
const PLAYHEAD_DOT_RADIUS: f32 = 3.0;

/// Height of the main timeline band for a given widget height.
pub(crate) fn timeline_band_height(widget_height: f32) -> f32 {
    (widget_height - OVERVIEW_STRIP_HEIGHT - BAND_GAP).max(0.0)
}

/// Band under a widget-local y coordinate. Presses in the gap resolve to
/// the nearest band.
pub fn band_at(y: f32, widget_height: f32) -> Band {
    if y >= timeline_band_height(widget_height) + BAND_GAP / 2.0 {
        Band::Overview
    } else {
        Band::Timeline
    }
}

/// Absolute time for an x position on the overview strip, clamped into the
/// source.
pub fn strip_time(x: f32, width: f32, duration_seconds: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (x / width).clamp(0.0, 1.0) as f64 * duration_seconds.max(0.0)
}

/// Canvas program for the timeline.
///
/// Takes a callback closure `on_event` mapping [`TimelineEvent`]s into the
/// application's message type, following the iced 0.14 pattern of a view
/// borrowing application-owned state.
pub struct TimelineCanvas<'a, Message, F>
where
    F: Fn(TimelineEvent) -> Message,
{
    pub state: &'a TimelineState,
    pub on_event: F,
}

impl<'a, Message, F> TimelineCanvas<'a, Message, F>
where
    F: Fn(TimelineEvent) -> Message,
{
    fn publish(&self, event: TimelineEvent) -> Option<canvas::Action<Message>> {
        Some(canvas::Action::publish((self.on_event)(event)))
    }

    fn begin(
        &self,
        router: &mut GestureRouter,
        at: Point,
        bounds: Rectangle,
        finger: Option<touch::Finger>,
        now: Instant,
    ) -> Option<canvas::Action<Message>> {
        let band = band_at(at.y, bounds.height);
        match finger {
            Some(finger) => router.begin_touch(finger, at, band, now),
            None => router.begin(at, band, now),
        }
        self.publish(TimelineEvent::GestureBegan)
    }

    /// Pointer motion during a live drag. Timeline drags pan once past the
    /// click threshold; overview drags scrub continuously.
    fn drag_motion(
        &self,
        router: &mut GestureRouter,
        to: Point,
        bounds: Rectangle,
        now: Instant,
    ) -> Option<canvas::Action<Message>> {
        let (delta_x, band) = router.motion(to, now)?;
        match band {
            Band::Timeline => {
                // Pans wait out the click threshold so a stationary press
                // stays a clean click.
                if !router.is_past_threshold() {
                    return None;
                }
                let axis = self.state.viewport().axis(bounds.width);
                if axis.is_degenerate() || delta_x == 0.0 {
                    return None;
                }
                // Pointer moving right drags the content right, so the
                // window scrolls left.
                self.publish(TimelineEvent::PanBy(
                    -delta_x as f64 * axis.seconds_per_pixel(),
                ))
            }
            // Strip scrubs follow the pointer from the first motion; the
            // click threshold does not apply here.
            Band::Overview => self.publish(TimelineEvent::StripSeek(strip_time(
                to.x,
                bounds.width,
                self.state.viewport().duration(),
            ))),
        }
    }

    /// Release: classify the whole press/release pair and publish exactly
    /// one event. `allow_double_tap` is set for touch releases only.
    fn finish_drag(
        &self,
        router: &mut GestureRouter,
        at: Point,
        bounds: Rectangle,
        allow_double_tap: bool,
        now: Instant,
    ) -> Option<canvas::Action<Message>> {
        let band = router.dragging_band();
        match router.finish(at, now) {
            DragOutcome::Click { at } => {
                let band = band.unwrap_or_else(|| band_at(at.y, bounds.height));
                if allow_double_tap
                    && band == Band::Timeline
                    && router.register_tap(at, now)
                {
                    return self.publish(TimelineEvent::DoubleTapZoom {
                        pixel_x: at.x,
                        viewport_width: bounds.width,
                    });
                }
                match band {
                    Band::Overview => self.publish(TimelineEvent::StripSeek(strip_time(
                        at.x,
                        bounds.width,
                        self.state.viewport().duration(),
                    ))),
                    Band::Timeline => self.resolve_timeline_click(at, bounds),
                }
            }
            DragOutcome::Flick {
                velocity_px_per_frame,
            } => match band {
                Some(Band::Timeline) => self.publish(TimelineEvent::Flick {
                    velocity_px_per_frame,
                    viewport_width: bounds.width,
                }),
                _ => self.publish(TimelineEvent::GestureEnded),
            },
            DragOutcome::Ended => self.publish(TimelineEvent::GestureEnded),
        }
    }

    /// Annotation glyphs win over the waveform beneath them; empty space
    /// seeks.
    fn resolve_timeline_click(
        &self,
        at: Point,
        bounds: Rectangle,
    ) -> Option<canvas::Action<Message>> {
        let axis = self.state.viewport().axis(bounds.width);
        let visible = annotations::project(self.state.annotations(), &axis);
        let band_height = timeline_band_height(bounds.height);
        if let Some(id) = annotations::hit_test(&visible, at, bounds.width, band_height) {
            self.publish(TimelineEvent::AnnotationClicked(id))
        } else if axis.is_degenerate() {
            self.publish(TimelineEvent::GestureEnded)
        } else {
            self.publish(TimelineEvent::Seek(axis.pixel_to_time(at.x)))
        }
    }

    /// Idle motion: hover tracking over annotation glyphs.
    fn hover(&self, at: Point, bounds: Rectangle) -> Option<canvas::Action<Message>> {
        let band_height = timeline_band_height(bounds.height);
        let hovered = if at.y <= band_height {
            let axis = self.state.viewport().axis(bounds.width);
            let visible = annotations::project(self.state.annotations(), &axis);
            annotations::hit_test(&visible, at, bounds.width, band_height)
        } else {
            None
        };
        if hovered == self.state.hovered() {
            return None;
        }
        self.publish(TimelineEvent::HoverChanged(hovered))
    }
}

impl<'a, Message, F> Program<Message> for TimelineCanvas<'a, Message, F>
where
    Message: Clone,
    F: Fn(TimelineEvent) -> Message,
{
    type State = GestureRouter;

    fn update(
        &self,
        router: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let now = Instant::now();
        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                self.begin(router, position, bounds, None, now)
            }
            Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if router.is_touch_gesture() {
                    return None;
                }
                if router.is_dragging() {
                    // Drags keep tracking outside the widget so a fast pan
                    // that overshoots the edge is not lost.
                    let global = cursor.position()?;
                    let local = Point::new(global.x - bounds.x, global.y - bounds.y);
                    self.drag_motion(router, local, bounds, now)
                } else {
                    let position = cursor.position_in(bounds)?;
                    self.hover(position, bounds)
                }
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if router.is_touch_gesture() || !router.is_dragging() {
                    return None;
                }
                match cursor.position() {
                    Some(global) => {
                        let local = Point::new(global.x - bounds.x, global.y - bounds.y);
                        self.finish_drag(router, local, bounds, false, now)
                    }
                    None => {
                        router.abort();
                        self.publish(TimelineEvent::GestureEnded)
                    }
                }
            }
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                let position = cursor.position_in(bounds)?;
                if band_at(position.y, bounds.height) != Band::Timeline {
                    return None;
                }
                let lines = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => *y,
                    mouse::ScrollDelta::Pixels { y, .. } => *y / WHEEL_PIXELS_PER_LINE,
                };
                if lines == 0.0 {
                    return None;
                }
                self.publish(TimelineEvent::ZoomAt {
                    pixel_x: position.x,
                    factor: WHEEL_ZOOM_STEP.powf(lines as f64),
                    viewport_width: bounds.width,
                })
            }
            Event::Touch(touch::Event::FingerPressed { id, position }) => {
                // Extra fingers do not start a second gesture.
                if router.is_touch_gesture() || !bounds.contains(*position) {
                    return None;
                }
                let local = Point::new(position.x - bounds.x, position.y - bounds.y);
                self.begin(router, local, bounds, Some(*id), now)
            }
            Event::Touch(touch::Event::FingerMoved { id, position }) => {
                if !router.is_active_finger(*id) {
                    return None;
                }
                let local = Point::new(position.x - bounds.x, position.y - bounds.y);
                self.drag_motion(router, local, bounds, now)
            }
            Event::Touch(touch::Event::FingerLifted { id, position }) => {
                if !router.is_active_finger(*id) {
                    return None;
                }
                let local = Point::new(position.x - bounds.x, position.y - bounds.y);
                self.finish_drag(router, local, bounds, true, now)
            }
            Event::Touch(touch::Event::FingerLost { id, .. }) => {
                if !router.is_active_finger(*id) {
                    return None;
                }
                router.abort();
                self.publish(TimelineEvent::GestureEnded)
            }
            _ => None,
        }
    }

    fn mouse_interaction(
        &self,
        router: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if router.is_dragging() && router.is_past_threshold() {
            return mouse::Interaction::Grabbing;
        }
        let Some(position) = cursor.position_in(bounds) else {
            return mouse::Interaction::default();
        };
        match band_at(position.y, bounds.height) {
            Band::Overview => mouse::Interaction::Pointer,
            Band::Timeline => {
                if self.state.hovered().is_some() {
                    mouse::Interaction::Pointer
                } else {
                    mouse::Interaction::Grab
                }
            }
        }
    }

    fn draw(
        &self,
        _router: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geometry = self.state.cache().draw(renderer, bounds.size(), |frame| {
            let width = frame.size().width;
            let height = frame.size().height;
            let band_height = timeline_band_height(height);

            frame.fill_rectangle(
                Point::ORIGIN,
                Size::new(width, band_height),
                theme::BACKGROUND,
            );

            let axis = self.state.viewport().axis(width);
            if !axis.is_degenerate() {
                draw_tempo_grid(frame, self.state, &axis, band_height);

                let played_x = axis
                    .time_to_pixel(self.state.current_time())
                    .clamp(0.0, width);
                if let Some(waveform) = self.state.waveform.as_deref() {
                    draw_waveform_bars(frame, waveform, &axis, band_height, played_x);
                    draw_playhead(frame, played_x, band_height, width);
                }
            }

            let visible = annotations::project(&self.state.annotations, &axis);
            draw_annotations(
                frame,
                &visible,
                width,
                band_height,
                self.state.selected(),
                self.state.hovered(),
            );

            if let Some(id) = self.state.hovered() {
                let full = self.state.annotations.iter().find(|a| a.id == id);
                let screen = visible.iter().find(|s| s.id == id);
                if let (Some(full), Some(screen)) = (full, screen) {
                    draw_tooltip(frame, full, screen, width);
                }
            }

            draw_overview_strip(frame, self.state, width, height);
            draw_status(frame, self.state, width, band_height);
        });
        vec![geometry]
    }
}

// =============================================================================
// Drawing helpers
// =============================================================================

fn draw_tempo_grid(frame: &mut Frame, state: &TimelineState, axis: &TimeAxis, band_height: f32) {
    for line in grid_lines(state.tempo(), axis) {
        let (color, line_width) = if line.is_bar {
            (theme::GRID_BAR, 1.5)
        } else {
            (theme::GRID_BEAT, 1.0)
        };
        frame.fill_rectangle(
            Point::new(line.pixel_x - line_width / 2.0, 0.0),
            Size::new(line_width, band_height),
            color,
        );
    }
}

/// Vertical amplitude bars, split into played and unplayed at the playhead.
fn draw_waveform_bars(
    frame: &mut Frame,
    waveform: &wavenote_core::WaveformSamples,
    axis: &TimeAxis,
    band_height: f32,
    played_x: f32,
) {
    let buckets = (axis.width() / BAR_STRIDE).floor() as usize;
    if buckets == 0 || band_height <= 0.0 {
        return;
    }
    let amplitudes = waveform.resample(axis.visible_start(), axis.visible_end(), buckets);
    for (i, amplitude) in amplitudes.iter().enumerate() {
        let x = i as f32 * BAR_STRIDE;
        let bar_height = (amplitude * band_height * WAVEFORM_VERTICAL_FILL).max(1.0);
        let color = if x + BAR_WIDTH / 2.0 <= played_x {
            theme::BAR_PLAYED
        } else {
            theme::BAR_UNPLAYED
        };
        frame.fill_rectangle(
            Point::new(x, (band_height - bar_height) / 2.0),
            Size::new(BAR_WIDTH, bar_height),
            color,
        );
    }
}

fn draw_playhead(frame: &mut Frame, x: f32, band_height: f32, width: f32) {
    if !(0.0..=width).contains(&x) {
        return;
    }
    frame.fill_rectangle(
        Point::new(x - 2.5, 0.0),
        Size::new(5.0, band_height),
        theme::PLAYHEAD_GLOW,
    );
    frame.fill_rectangle(
        Point::new(x - 0.75, 0.0),
        Size::new(1.5, band_height),
        theme::PLAYHEAD,
    );
    frame.fill(
        &Path::circle(Point::new(x, PLAYHEAD_DOT_RADIUS + 1.0), PLAYHEAD_DOT_RADIUS),
        theme::PLAYHEAD,
    );
}

fn draw_annotations(
    frame: &mut Frame,
    visible: &[ScreenAnnotation],
    width: f32,
    band_height: f32,
    selected: Option<wavenote_core::AnnotationId>,
    hovered: Option<wavenote_core::AnnotationId>,
) {
    let metrics = GlyphMetrics::for_viewport(width);

    // Lines first so bubbles from neighbors draw over them.
    for screen in visible {
        let pixel_x = screen.pixel_x(width);
        let bubble = metrics.bubble_rect(pixel_x);
        let line_top = bubble.y + bubble.height;
        frame.fill_rectangle(
            Point::new(pixel_x - 0.75, line_top),
            Size::new(1.5, (band_height - line_top).max(0.0)),
            glyph_color(screen),
        );
    }

    for screen in visible {
        let pixel_x = screen.pixel_x(width);
        let bubble = metrics.bubble_rect(pixel_x);
        let rounded = Path::rounded_rectangle(
            bubble.position(),
            bubble.size(),
            (3.0 * metrics.scale).into(),
        );
        frame.fill(&rounded, glyph_color(screen));

        if selected == Some(screen.id) {
            frame.stroke(
                &rounded,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(theme::SELECTION),
            );
        } else if hovered == Some(screen.id) {
            frame.stroke(
                &rounded,
                Stroke::default()
                    .with_width(1.0)
                    .with_color(theme::TOOLTIP_BORDER),
            );
        }

        if screen.reply_count > 0 {
            frame.fill_text(Text {
                content: screen.reply_count.to_string(),
                position: Point::new(pixel_x, bubble.y + bubble.height / 2.0),
                size: (9.0 * metrics.scale).into(),
                color: theme::TEXT_PRIMARY,
                align_x: Horizontal::Center.into(),
                align_y: Vertical::Center.into(),
                ..Text::default()
            });
        }
    }
}

fn glyph_color(screen: &ScreenAnnotation) -> iced::Color {
    let mut color = theme::annotation_color(screen.kind);
    // Settled annotations fade so open ones stand out.
    if matches!(screen.status, Status::Resolved | Status::Approved) {
        color.a *= 0.55;
    }
    color
}

fn draw_tooltip(frame: &mut Frame, annotation: &Annotation, screen: &ScreenAnnotation, width: f32) {
    let pixel_x = screen.pixel_x(width);
    let left = annotations::tooltip_left(pixel_x, width);
    let metrics = GlyphMetrics::for_viewport(width);
    let top = metrics.bubble_top + metrics.bubble_height + 6.0;

    let outline = Path::rounded_rectangle(
        Point::new(left, top),
        Size::new(TOOLTIP_WIDTH, TOOLTIP_HEIGHT),
        4.0.into(),
    );
    frame.fill(&outline, theme::TOOLTIP_BACKGROUND);
    frame.stroke(
        &outline,
        Stroke::default()
            .with_width(1.0)
            .with_color(theme::TOOLTIP_BORDER),
    );

    frame.fill_text(Text {
        content: format!(
            "{} \u{00b7} {} \u{00b7} {}",
            annotation.kind.label(),
            annotation.priority.label(),
            format_timestamp(annotation.timestamp_seconds),
        ),
        position: Point::new(left + 8.0, top + 6.0),
        size: 11.0.into(),
        color: theme::TEXT_DIM,
        align_x: Horizontal::Left.into(),
        align_y: Vertical::Top.into(),
        ..Text::default()
    });
    frame.fill_text(Text {
        content: truncate(&annotation.text, 56),
        position: Point::new(left + 8.0, top + 22.0),
        size: 12.0.into(),
        color: theme::TEXT_PRIMARY,
        align_x: Horizontal::Left.into(),
        align_y: Vertical::Top.into(),
        ..Text::default()
    });
    if screen.reply_count > 0 {
        frame.fill_text(Text {
            content: format!("{} replies", screen.reply_count),
            position: Point::new(left + 8.0, top + 39.0),
            size: 10.0.into(),
            color: theme::TEXT_DIM,
            align_x: Horizontal::Left.into(),
            align_y: Vertical::Top.into(),
            ..Text::default()
        });
    }
}

/// Full-source strip at the bottom: miniature waveform, annotation ticks,
/// the visible-window rectangle and the playhead.
fn draw_overview_strip(frame: &mut Frame, state: &TimelineState, width: f32, height: f32) {
    let top = timeline_band_height(height) + BAND_GAP;
    frame.fill_rectangle(
        Point::new(0.0, top),
        Size::new(width, OVERVIEW_STRIP_HEIGHT),
        theme::STRIP_BACKGROUND,
    );

    let duration = state.viewport().duration();
    if duration <= 0.0 || width <= 0.0 {
        return;
    }
    let full = TimeAxis::new(0.0, duration, width);

    if let Some(waveform) = state.waveform.as_deref() {
        let buckets = (width / STRIP_BAR_STRIDE).floor() as usize;
        let amplitudes = waveform.resample(0.0, duration, buckets);
        for (i, amplitude) in amplitudes.iter().enumerate() {
            let bar_height = (amplitude * (OVERVIEW_STRIP_HEIGHT - 4.0)).max(1.0);
            frame.fill_rectangle(
                Point::new(
                    i as f32 * STRIP_BAR_STRIDE,
                    top + (OVERVIEW_STRIP_HEIGHT - bar_height) / 2.0,
                ),
                Size::new(1.0, bar_height),
                theme::BAR_UNPLAYED,
            );
        }
    }

    for annotation in state.annotations.iter().filter(|a| a.is_root()) {
        let x = full.time_to_pixel(annotation.timestamp_seconds);
        let mut color = theme::annotation_color(annotation.kind);
        color.a *= 0.8;
        frame.fill_rectangle(
            Point::new(x - 0.5, top),
            Size::new(1.0, OVERVIEW_STRIP_HEIGHT),
            color,
        );
    }

    let window_left = full.time_to_pixel(state.viewport().scroll_offset());
    let window_right =
        full.time_to_pixel(state.viewport().scroll_offset() + state.viewport().visible_duration());
    let window_width = (window_right - window_left).max(2.0);
    frame.fill_rectangle(
        Point::new(window_left, top),
        Size::new(window_width, OVERVIEW_STRIP_HEIGHT),
        theme::STRIP_WINDOW,
    );
    frame.stroke(
        &Path::rectangle(
            Point::new(window_left, top),
            Size::new(window_width, OVERVIEW_STRIP_HEIGHT),
        ),
        Stroke::default()
            .with_width(1.0)
            .with_color(theme::TOOLTIP_BORDER),
    );

    let playhead_x = full.time_to_pixel(state.current_time());
    frame.fill_rectangle(
        Point::new(playhead_x - 0.5, top),
        Size::new(1.0, OVERVIEW_STRIP_HEIGHT),
        theme::BAR_PLAYED,
    );
}

fn draw_status(frame: &mut Frame, state: &TimelineState, width: f32, band_height: f32) {
    let center = Point::new(width / 2.0, band_height / 2.0);
    let centered = |content: String, position: Point, size: f32, color: iced::Color| Text {
        content,
        position,
        size: size.into(),
        color,
        align_x: Horizontal::Center.into(),
        align_y: Vertical::Center.into(),
        ..Text::default()
    };

    if state.is_loading() {
        frame.fill_text(centered(
            "Loading waveform\u{2026}".into(),
            center,
            14.0,
            theme::TEXT_DIM,
        ));
    } else if let Some(message) = state.error() {
        frame.fill_text(centered(
            message.to_string(),
            Point::new(center.x, center.y - 10.0),
            13.0,
            theme::ERROR_TEXT,
        ));
        frame.fill_text(centered(
            "Drop an audio file or retry".into(),
            Point::new(center.x, center.y + 12.0),
            11.0,
            theme::TEXT_DIM,
        ));
    } else if state.waveform.is_none() {
        frame.fill_text(centered(
            "Drop an audio file to begin".into(),
            center,
            14.0,
            theme::TEXT_DIM,
        ));
    } else if state.awaiting_user_gesture() {
        frame.fill_text(centered(
            "Click anywhere to start playback".into(),
            Point::new(center.x, 20.0),
            12.0,
            theme::TEXT_PRIMARY,
        ));
    }
}

fn format_timestamp(t: f64) -> String {
    let t = t.max(0.0);
    let minutes = (t / 60.0).floor() as u64;
    format!("{}:{:04.1}", minutes, t - minutes as f64 * 60.0)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut shortened: String = text.chars().take(max_chars).collect();
        shortened.push('\u{2026}');
        shortened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_split_at_the_gap() {
        // 300px widget: timeline band is 258px, strip starts at 264.
        assert_eq!(band_at(0.0, 300.0), Band::Timeline);
        assert_eq!(band_at(257.0, 300.0), Band::Timeline);
        assert_eq!(band_at(262.0, 300.0), Band::Overview);
        assert_eq!(band_at(299.0, 300.0), Band::Overview);
    }

    #[test]
    fn tiny_widgets_still_have_a_timeline_band() {
        assert_eq!(timeline_band_height(10.0), 0.0);
        assert_eq!(band_at(-5.0, 10.0), Band::Timeline);
    }

    fn loaded_state(duration: f64) -> TimelineState {
        use std::sync::Arc;
        use wavenote_core::WaveformSamples;

        let mut state = TimelineState::new();
        state.finish_load(
            duration,
            Arc::new(WaveformSamples::from_peaks(vec![0.5; duration as usize], 1)),
        );
        state
    }

    fn press_and_move(
        state: &TimelineState,
        press_at: Point,
        move_to: Point,
    ) -> (bool, bool) {
        let canvas = TimelineCanvas {
            state,
            on_event: |event: TimelineEvent| event,
        };
        let mut router = GestureRouter::default();
        let bounds = Rectangle::new(Point::ORIGIN, Size::new(800.0, 300.0));

        let press = Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left));
        let pressed = canvas
            .update(&mut router, &press, bounds, mouse::Cursor::Available(press_at))
            .is_some();

        let moved = Event::Mouse(mouse::Event::CursorMoved { position: move_to });
        let dragged = canvas
            .update(&mut router, &moved, bounds, mouse::Cursor::Available(move_to))
            .is_some();
        (pressed, dragged)
    }

    #[test]
    fn strip_drags_scrub_from_the_first_motion() {
        // 2px of motion is inside the click threshold, but the overview
        // strip tracks the pointer immediately.
        let state = loaded_state(200.0);
        let (pressed, dragged) =
            press_and_move(&state, Point::new(100.0, 290.0), Point::new(102.0, 290.0));
        assert!(pressed, "press publishes the gesture start");
        assert!(dragged, "a sub-threshold strip drag already scrubs");
    }

    #[test]
    fn sub_threshold_timeline_drags_do_not_pan() {
        let state = loaded_state(200.0);
        let (pressed, dragged) =
            press_and_move(&state, Point::new(100.0, 100.0), Point::new(102.0, 100.0));
        assert!(pressed);
        assert!(!dragged, "a press that may still be a click must not pan");
    }

    #[test]
    fn strip_time_clamps_into_the_source() {
        assert_eq!(strip_time(-50.0, 800.0, 200.0), 0.0);
        assert_eq!(strip_time(400.0, 800.0, 200.0), 100.0);
        assert_eq!(strip_time(900.0, 800.0, 200.0), 200.0);
        assert_eq!(strip_time(10.0, 0.0, 200.0), 0.0);
    }

    #[test]
    fn timestamps_format_as_minutes_and_tenths() {
        assert_eq!(format_timestamp(0.0), "0:00.0");
        assert_eq!(format_timestamp(67.35), "1:07.3");
        assert_eq!(format_timestamp(-3.0), "0:00.0");
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ab\u{e9}cdef", 3), "ab\u{e9}\u{2026}");
    }
}
