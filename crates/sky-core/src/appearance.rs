//! Magnitude and spectral-class mapping to on-screen size, brightness and color.

use serde::{Deserialize, Serialize};

use crate::catalog::SpectralClass;
use crate::theme::Rgb;

/// Maps apparent magnitude into configured size and brightness ranges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeScale {
    /// Magnitude treated as maximally bright; anything brighter is clamped.
    pub bright: f32,
    /// Magnitude treated as faintest visible; anything fainter is clamped.
    pub faint: f32,
    /// Star radius range in pixels, `(faint, bright)`.
    pub size: (f32, f32),
    /// Base opacity range, `(faint, bright)`.
    pub brightness: (f32, f32),
}

impl Default for MagnitudeScale {
    fn default() -> Self {
        Self {
            bright: -1.5,
            faint: 6.5,
            size: (0.5, 3.2),
            brightness: (0.25, 1.0),
        }
    }
}

impl MagnitudeScale {
    /// Normalized brightness in `[0, 1]`: 1 at `bright`, 0 at `faint`.
    pub fn normalize(&self, magnitude: f32) -> f32 {
        let span = self.faint - self.bright;
        if span <= f32::EPSILON {
            return 1.0;
        }
        let m = magnitude.clamp(self.bright, self.faint);
        (self.faint - m) / span
    }

    /// On-screen radius in pixels for a star of the given magnitude.
    pub fn size(&self, magnitude: f32) -> f32 {
        let t = self.normalize(magnitude);
        self.size.0 + (self.size.1 - self.size.0) * t
    }

    /// Base opacity for a star of the given magnitude.
    pub fn brightness(&self, magnitude: f32) -> f32 {
        let t = self.normalize(magnitude);
        self.brightness.0 + (self.brightness.1 - self.brightness.0) * t
    }
}

/// Fixed color for each spectral class, blue-white through red-orange.
pub fn spectral_color(class: SpectralClass) -> Rgb {
    match class {
        SpectralClass::O => [0.61, 0.69, 1.00],
        SpectralClass::B => [0.67, 0.75, 1.00],
        SpectralClass::A => [0.80, 0.85, 1.00],
        SpectralClass::F => [0.97, 0.97, 1.00],
        SpectralClass::G => [1.00, 0.94, 0.86],
        SpectralClass::K => [1.00, 0.80, 0.60],
        SpectralClass::M => [1.00, 0.68, 0.45],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_clamps_to_window() {
        let scale = MagnitudeScale::default();
        assert_eq!(scale.normalize(-5.0), 1.0);
        assert_eq!(scale.normalize(12.0), 0.0);
        let mid = scale.normalize((scale.bright + scale.faint) / 2.0);
        assert!((mid - 0.5).abs() < 1e-6, "midpoint normalized to {mid}");
    }

    #[test]
    fn test_brighter_stars_are_larger() {
        let scale = MagnitudeScale::default();
        assert!(scale.size(0.0) > scale.size(4.0));
        assert!(scale.brightness(0.0) > scale.brightness(4.0));
    }

    #[test]
    fn test_size_stays_in_configured_range() {
        let scale = MagnitudeScale::default();
        for m in [-10.0, -1.5, 0.0, 3.0, 6.5, 20.0] {
            let s = scale.size(m);
            assert!(
                (scale.size.0..=scale.size.1).contains(&s),
                "magnitude {m} gave size {s}"
            );
        }
    }

    #[test]
    fn test_degenerate_window_is_full_brightness() {
        let scale = MagnitudeScale {
            bright: 2.0,
            faint: 2.0,
            ..Default::default()
        };
        assert_eq!(scale.normalize(5.0), 1.0);
    }

    #[test]
    fn test_spectral_palette_runs_blue_to_red() {
        let hot = spectral_color(SpectralClass::O);
        let cool = spectral_color(SpectralClass::M);
        assert!(hot[2] > hot[0], "O stars should lean blue");
        assert!(cool[0] > cool[2], "M stars should lean red");
    }
}
