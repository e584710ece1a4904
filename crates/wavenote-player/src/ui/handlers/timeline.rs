//! Timeline canvas events: gestures, zoom, seeks, and annotation hits.

use iced::Task;

use wavenote_widgets::TimelineEvent;

use crate::ui::app::{Message, WavenoteApp};

impl WavenoteApp {
    pub(crate) fn handle_timeline_event(&mut self, event: TimelineEvent) -> Task<Message> {
        match event {
            TimelineEvent::GestureBegan => self.timeline.begin_gesture(),
            TimelineEvent::GestureEnded => self.timeline.end_gesture(),
            TimelineEvent::PanBy(delta_seconds) => self.timeline.pan_by(delta_seconds),
            TimelineEvent::ZoomAt {
                pixel_x,
                factor,
                viewport_width,
            } => self.timeline.zoom_at(pixel_x, factor, viewport_width),
            TimelineEvent::DoubleTapZoom {
                pixel_x,
                viewport_width,
            } => {
                self.timeline.end_gesture();
                self.timeline.double_tap_zoom(pixel_x, viewport_width);
            }
            TimelineEvent::Flick {
                velocity_px_per_frame,
                viewport_width,
            } => {
                self.timeline.end_gesture();
                self.timeline.start_inertia(velocity_px_per_frame, viewport_width);
            }
            TimelineEvent::Seek(t) => {
                self.timeline.end_gesture();
                self.seek_to(t);
            }
            TimelineEvent::StripSeek(t) => {
                // Overview scrubs seek continuously while the drag is live.
                self.seek_to(t);
            }
            TimelineEvent::AnnotationClicked(id) => {
                self.timeline.end_gesture();
                self.timeline.select(Some(id));
                let timestamp = self
                    .store
                    .as_ref()
                    .and_then(|s| s.find(id))
                    .map(|a| a.timestamp_seconds);
                if let Some(t) = timestamp {
                    self.seek_to(t);
                }
            }
            TimelineEvent::HoverChanged(id) => self.timeline.set_hover(id),
        }
        Task::none()
    }

    /// Seek the clock, treating a release that lands during momentum as a
    /// stray (it only stops the scroll, never jumps the playhead).
    pub(crate) fn seek_to(&mut self, t: f64) {
        if self.timeline.is_inertia_active() {
            return;
        }
        self.ensure_clock();
        if let Some(clock) = &mut self.clock {
            if let Err(e) = clock.seek(t) {
                log::warn!("Seek failed: {}", e);
                self.status = e.to_string();
            }
            // A seek is a qualifying gesture: if a previous play was
            // refused, try again now.
            if self.timeline.awaiting_user_gesture() && clock.play().is_ok() {
                self.timeline.set_awaiting_user_gesture(false);
            }
        }
        self.drain_clock_events();
    }
}
