//! View state: scroll-driven declination with damping, plus a slow RA drift.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::projector::ViewOrientation;

/// Tunables for the view controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    /// Declination when the scroll offset is zero, radians.
    pub base_declination: f32,
    /// Radians of declination per pixel of scroll.
    pub scroll_rate: f32,
    /// Fraction of the remaining distance covered each tick, `(0, 1]`.
    pub damping: f32,
    /// Right-ascension drift, radians per second.
    pub drift_rate: f32,
    /// Target declination is clamped to `±max_declination`.
    pub max_declination: f32,
    /// Initial right ascension of the view center, radians.
    pub initial_right_ascension: f32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            base_declination: 0.35,
            scroll_rate: 0.0012,
            damping: 0.08,
            drift_rate: 0.004,
            max_declination: 85.0_f32.to_radians(),
            initial_right_ascension: 1.45,
        }
    }
}

/// Normalize an angle into `[-π, π]`.
#[inline]
pub fn normalize_signed(angle: f32) -> f32 {
    let a = (angle + PI).rem_euclid(TAU) - PI;
    if a < -PI { a + TAU } else { a }
}

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn wrap_positive(angle: f32) -> f32 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if a >= TAU { 0.0 } else { a }
}

/// Current and target orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub declination: f32,
    pub target_declination: f32,
    pub right_ascension: f32,
}

impl ViewState {
    /// The orientation consumed by the projector.
    pub fn orientation(&self) -> ViewOrientation {
        ViewOrientation::new(self.right_ascension, self.declination)
    }
}

/// Sole writer of [`ViewState`].
#[derive(Clone, Debug)]
pub struct ViewController {
    params: ViewParams,
    state: ViewState,
    scroll_offset: f32,
}

impl ViewController {
    pub fn new(params: ViewParams) -> Self {
        let dec = params
            .base_declination
            .clamp(-params.max_declination, params.max_declination);
        Self {
            params,
            state: ViewState {
                declination: dec,
                target_declination: dec,
                right_ascension: wrap_positive(params.initial_right_ascension),
            },
            scroll_offset: 0.0,
        }
    }

    pub fn params(&self) -> &ViewParams {
        &self.params
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn orientation(&self) -> ViewOrientation {
        self.state.orientation()
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Set the page scroll offset in signed pixels and retarget declination.
    pub fn set_scroll_offset(&mut self, offset: f32) {
        if !offset.is_finite() {
            return;
        }
        self.scroll_offset = offset;
        let limit = self.params.max_declination;
        self.state.target_declination =
            (self.params.base_declination + offset * self.params.scroll_rate).clamp(-limit, limit);
    }

    /// Advance by `dt_ms` milliseconds.
    ///
    /// Declination moves a fixed fraction of the shortest angular path toward
    /// its target. Right ascension drifts regardless of scroll.
    pub fn tick(&mut self, dt_ms: f32) {
        let diff = normalize_signed(self.state.target_declination - self.state.declination);
        let limit = self.params.max_declination;
        self.state.declination =
            (self.state.declination + diff * self.params.damping).clamp(-limit, limit);

        let dt_s = dt_ms.max(0.0) / 1000.0;
        self.state.right_ascension =
            wrap_positive(self.state.right_ascension + self.params.drift_rate * dt_s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_signed_range() {
        for i in -100..=100 {
            let a = i as f32 * 0.37;
            let n = normalize_signed(a);
            assert!((-PI..=PI).contains(&n), "{a} normalized to {n}");
            assert!(((a - n) / TAU - ((a - n) / TAU).round()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_right_ascension_stays_wrapped() {
        let mut controller = ViewController::new(ViewParams {
            drift_rate: 3.0,
            ..Default::default()
        });
        for i in 0..50_000 {
            controller.tick(16.0 + (i % 7) as f32);
            let ra = controller.state().right_ascension;
            assert!((0.0..TAU).contains(&ra), "tick {i}: RA {ra} escaped [0, 2π)");
        }
    }

    #[test]
    fn test_wrap_positive_handles_negative_and_tiny() {
        assert!((wrap_positive(-0.5) - (TAU - 0.5)).abs() < 1e-5);
        assert_eq!(wrap_positive(-1.0e-9), 0.0);
        assert_eq!(wrap_positive(TAU), 0.0);
    }

    #[test]
    fn test_declination_converges_to_target() {
        let mut controller = ViewController::new(ViewParams::default());
        controller.set_scroll_offset(400.0);
        let target = controller.state().target_declination;
        for _ in 0..500 {
            controller.tick(16.0);
        }
        let err = (controller.state().declination - target).abs();
        assert!(err < 1e-4, "declination still {err} rad from target");
    }

    #[test]
    fn test_damping_is_single_pole() {
        let params = ViewParams {
            base_declination: 0.0,
            damping: 0.25,
            ..Default::default()
        };
        let mut controller = ViewController::new(params);
        controller.set_scroll_offset(0.2 / params.scroll_rate);
        controller.tick(16.0);
        let dec = controller.state().declination;
        assert!((dec - 0.05).abs() < 1e-5, "first step should cover 25%: {dec}");
    }

    #[test]
    fn test_target_is_clamped() {
        let mut controller = ViewController::new(ViewParams::default());
        controller.set_scroll_offset(1.0e7);
        let limit = controller.params().max_declination;
        assert_eq!(controller.state().target_declination, limit);
        controller.set_scroll_offset(-1.0e7);
        assert_eq!(controller.state().target_declination, -limit);
    }

    #[test]
    fn test_non_finite_scroll_ignored() {
        let mut controller = ViewController::new(ViewParams::default());
        controller.set_scroll_offset(120.0);
        let before = *controller.state();
        controller.set_scroll_offset(f32::NAN);
        assert_eq!(*controller.state(), before);
    }

    #[test]
    fn test_drift_happens_at_rest() {
        let mut controller = ViewController::new(ViewParams::default());
        let start = controller.state().right_ascension;
        controller.tick(1000.0);
        let moved = normalize_signed(controller.state().right_ascension - start);
        assert!((moved - ViewParams::default().drift_rate).abs() < 1e-5);
    }
}
