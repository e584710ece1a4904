//! Time axis: the bijection between audio time and pixels
//!
//! Everything on the timeline composes on top of these two conversions, so
//! they are kept pure: a [`TimeAxis`] is a throwaway value built from the
//! viewport snapshot plus the canvas width delivered with each event or draw.
//! Degenerate inputs (zero duration, zero width) collapse to a mapping that
//! pins everything at pixel 0 instead of dividing by zero.

/// Pure time-to-pixel mapping for one event or frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    scroll_offset_seconds: f64,
    visible_duration_seconds: f64,
    viewport_width_pixels: f32,
}

impl TimeAxis {
    pub fn new(
        scroll_offset_seconds: f64,
        visible_duration_seconds: f64,
        viewport_width_pixels: f32,
    ) -> Self {
        Self {
            scroll_offset_seconds,
            visible_duration_seconds,
            viewport_width_pixels,
        }
    }

    /// True when no meaningful mapping exists (empty source or zero-width
    /// canvas). Conversions still return values, all pinned at zero.
    pub fn is_degenerate(&self) -> bool {
        self.visible_duration_seconds <= 0.0 || self.viewport_width_pixels <= 0.0
    }

    pub fn visible_start(&self) -> f64 {
        self.scroll_offset_seconds
    }

    pub fn visible_end(&self) -> f64 {
        self.scroll_offset_seconds + self.visible_duration_seconds
    }

    pub fn visible_duration(&self) -> f64 {
        self.visible_duration_seconds
    }

    pub fn width(&self) -> f32 {
        self.viewport_width_pixels
    }

    /// Fraction of the visible window at time `t` (0 at the left edge,
    /// 1 at the right; unclamped outside)
    pub fn normalized_x(&self, t: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (t - self.scroll_offset_seconds) / self.visible_duration_seconds
    }

    pub fn time_to_pixel(&self, t: f64) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        (self.normalized_x(t) * self.viewport_width_pixels as f64) as f32
    }

    pub fn pixel_to_time(&self, x: f32) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.scroll_offset_seconds
            + (x as f64 / self.viewport_width_pixels as f64) * self.visible_duration_seconds
    }

    /// Seconds of audio represented by one pixel
    pub fn seconds_per_pixel(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.visible_duration_seconds / self.viewport_width_pixels as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_identity_within_tolerance() {
        let axis = TimeAxis::new(75.0, 50.0, 800.0);
        for x in [0.0f32, 1.0, 137.5, 400.0, 799.0, 800.0] {
            let back = axis.time_to_pixel(axis.pixel_to_time(x));
            assert!(
                (back - x).abs() < 1e-3,
                "pixel {} round-tripped to {}",
                x,
                back
            );
        }
    }

    #[test]
    fn inverse_round_trip_holds_for_times() {
        let axis = TimeAxis::new(12.25, 7.5, 1024.0);
        for t in [12.25, 13.0, 15.9999, 19.75] {
            let back = axis.pixel_to_time(axis.time_to_pixel(t));
            assert!((back - t).abs() < 1e-6, "time {} round-tripped to {}", t, back);
        }
    }

    #[test]
    fn window_75_to_125_maps_t100_to_center() {
        // duration=200s at zoom 4 gives a 50s window; scrolled to 75s the
        // window is [75, 125] and t=100 sits exactly halfway
        let axis = TimeAxis::new(75.0, 50.0, 800.0);
        assert!((axis.normalized_x(100.0) - 0.5).abs() < 1e-12);
        assert!((axis.time_to_pixel(100.0) - 400.0).abs() < 1e-3);
        assert!((axis.pixel_to_time(400.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_duration_pins_everything_at_zero() {
        let axis = TimeAxis::new(0.0, 0.0, 800.0);
        assert!(axis.is_degenerate());
        assert_eq!(axis.time_to_pixel(10.0), 0.0);
        assert_eq!(axis.pixel_to_time(400.0), 0.0);
        assert_eq!(axis.seconds_per_pixel(), 0.0);
    }

    #[test]
    fn degenerate_width_pins_everything_at_zero() {
        let axis = TimeAxis::new(5.0, 10.0, 0.0);
        assert!(axis.is_degenerate());
        assert_eq!(axis.time_to_pixel(7.0), 0.0);
        assert_eq!(axis.pixel_to_time(0.0), 0.0);
    }

    #[test]
    fn times_outside_the_window_map_off_canvas() {
        let axis = TimeAxis::new(10.0, 10.0, 100.0);
        assert!(axis.time_to_pixel(5.0) < 0.0);
        assert!(axis.time_to_pixel(25.0) > 100.0);
    }
}
