//! Press/drag/release classification for the timeline canvas
//!
//! One state machine decides whether a pointer sequence was a click (seek),
//! a drag (pan), or a flick (drag that ends with enough velocity to coast).
//! Mouse and touch feed the same transitions; only double-tap is touch-only.
//! The canvas `Program` keeps a `GestureRouter` as its widget state and asks
//! it what each raw event meant.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use iced::touch::Finger;
use iced::Point;

/// Releases closer to the press than this are clicks, not drags.
pub const CLICK_THRESHOLD_PX: f32 = 4.0;
/// Clicks landing within this window after a drag release are synthetic
/// echoes of the release and get swallowed.
pub const PHANTOM_CLICK_WINDOW_MS: u64 = 150;
/// Second tap must land within this window to count as a double-tap.
pub const DOUBLE_TAP_WINDOW_MS: u64 = 350;
/// And within this radius of the first tap.
pub const DOUBLE_TAP_SLOP_PX: f32 = 30.0;
/// Only motion samples this recent contribute to release velocity.
const VELOCITY_WINDOW_MS: u64 = 120;
/// Velocity is reported in px per frame at the nominal tick rate.
const FRAMES_PER_SECOND: f32 = 60.0;

/// Which horizontal band of the canvas a gesture started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Timeline,
    Overview,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Phase {
    #[default]
    Idle,
    Dragging {
        origin: Point,
        last: Point,
        band: Band,
        moved_past_threshold: bool,
    },
}

/// What a completed press/release pair turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// Stationary press and release: treat as a click at the press point.
    Click { at: Point },
    /// Drag that ended moving fast enough to coast.
    Flick { velocity_px_per_frame: f32 },
    /// Drag that ended slowly, or a suppressed phantom click.
    Ended,
}

/// Gesture state for one canvas instance. Lives as the widget's
/// `canvas::Program::State`, so it must be `Default`.
#[derive(Debug, Default)]
pub struct GestureRouter {
    phase: Phase,
    suppress_clicks_until: Option<Instant>,
    last_tap: Option<(Instant, Point)>,
    velocity: VelocityTracker,
    /// Finger driving the current gesture; extra fingers are ignored.
    active_finger: Option<Finger>,
}

impl GestureRouter {
    /// Begins tracking a press.
    pub fn begin(&mut self, at: Point, band: Band, now: Instant) {
        self.phase = Phase::Dragging {
            origin: at,
            last: at,
            band,
            moved_past_threshold: false,
        };
        self.active_finger = None;
        self.velocity.reset();
        self.velocity.push(now, at.x);
    }

    /// Begins a touch gesture, remembering which finger owns it.
    pub fn begin_touch(&mut self, finger: Finger, at: Point, band: Band, now: Instant) {
        self.begin(at, band, now);
        self.active_finger = Some(finger);
    }

    pub fn is_active_finger(&self, finger: Finger) -> bool {
        self.active_finger == Some(finger)
    }

    /// True while a touch (rather than mouse) gesture is in flight.
    pub fn is_touch_gesture(&self) -> bool {
        self.active_finger.is_some()
    }

    /// Feeds pointer motion. Returns the horizontal delta since the previous
    /// sample and the band the drag started in while a drag is live; `None`
    /// while idle (hover motion).
    pub fn motion(&mut self, to: Point, now: Instant) -> Option<(f32, Band)> {
        match &mut self.phase {
            Phase::Idle => None,
            Phase::Dragging {
                origin,
                last,
                band,
                moved_past_threshold,
            } => {
                let delta_x = to.x - last.x;
                let dx = to.x - origin.x;
                let dy = to.y - origin.y;
                if dx.hypot(dy) > CLICK_THRESHOLD_PX {
                    *moved_past_threshold = true;
                }
                *last = to;
                let band = *band;
                self.velocity.push(now, to.x);
                Some((delta_x, band))
            }
        }
    }

    /// Ends the gesture and classifies it. A release with no matching press
    /// reports `Ended`.
    pub fn finish(&mut self, at: Point, now: Instant) -> DragOutcome {
        let Phase::Dragging {
            origin,
            moved_past_threshold,
            ..
        } = self.phase
        else {
            return DragOutcome::Ended;
        };
        self.phase = Phase::Idle;
        self.active_finger = None;

        let dx = at.x - origin.x;
        let dy = at.y - origin.y;
        let was_click = !moved_past_threshold && dx.hypot(dy) <= CLICK_THRESHOLD_PX;

        if was_click {
            if self
                .suppress_clicks_until
                .is_some_and(|until| now < until)
            {
                return DragOutcome::Ended;
            }
            return DragOutcome::Click { at: origin };
        }

        self.suppress_clicks_until =
            Some(now + Duration::from_millis(PHANTOM_CLICK_WINDOW_MS));
        let velocity = self.velocity.sample(now);
        if velocity != 0.0 {
            DragOutcome::Flick {
                velocity_px_per_frame: velocity,
            }
        } else {
            DragOutcome::Ended
        }
    }

    /// Abandons a drag without classifying it (pointer lost, source swapped).
    pub fn abort(&mut self) {
        self.phase = Phase::Idle;
        self.active_finger = None;
        self.velocity.reset();
    }

    /// True once the current drag has left the click threshold. Pans only
    /// start past this point, so a stationary press stays a clean click.
    pub fn is_past_threshold(&self) -> bool {
        matches!(
            self.phase,
            Phase::Dragging {
                moved_past_threshold: true,
                ..
            }
        )
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn dragging_band(&self) -> Option<Band> {
        match self.phase {
            Phase::Dragging { band, .. } => Some(band),
            Phase::Idle => None,
        }
    }

    /// Touch only: records a tap and reports whether it completed a
    /// double-tap on roughly the same spot.
    pub fn register_tap(&mut self, at: Point, now: Instant) -> bool {
        if let Some((when, where_)) = self.last_tap {
            let dx = at.x - where_.x;
            let dy = at.y - where_.y;
            if now.duration_since(when) <= Duration::from_millis(DOUBLE_TAP_WINDOW_MS)
                && dx.hypot(dy) <= DOUBLE_TAP_SLOP_PX
            {
                self.last_tap = None;
                return true;
            }
        }
        self.last_tap = Some((now, at));
        false
    }
}

/// Rolling window of recent pointer x positions used to measure release
/// velocity.
#[derive(Debug, Default)]
struct VelocityTracker {
    samples: VecDeque<(Instant, f32)>,
}

impl VelocityTracker {
    fn reset(&mut self) {
        self.samples.clear();
    }

    fn push(&mut self, at: Instant, x: f32) {
        self.samples.push_back((at, x));
        let horizon = Duration::from_millis(VELOCITY_WINDOW_MS);
        while let Some(&(oldest, _)) = self.samples.front() {
            if at.duration_since(oldest) > horizon && self.samples.len() > 2 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Velocity in px per frame over the recent window; 0 when the pointer
    /// was effectively stationary or too few samples exist.
    fn sample(&self, now: Instant) -> f32 {
        let horizon = Duration::from_millis(VELOCITY_WINDOW_MS);
        let mut recent = self
            .samples
            .iter()
            .filter(|(at, _)| now.duration_since(*at) <= horizon);
        let Some(&(first_at, first_x)) = recent.next() else {
            return 0.0;
        };
        let Some(&(last_at, last_x)) = recent.last().or(Some(&(first_at, first_x))) else {
            return 0.0;
        };
        let dt = last_at.duration_since(first_at).as_secs_f32();
        if dt <= f32::EPSILON {
            return 0.0;
        }
        (last_x - first_x) / dt / FRAMES_PER_SECOND
    }
}
