//! Theme palettes supplied by the surrounding application.

use serde::{Deserialize, Serialize};

/// Linear RGB triple in `[0, 1]`.
pub type Rgb = [f32; 3];

/// Colors the backdrop is tinted with.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThemePalette {
    /// Three particle colors used for filler stars and procedural objects.
    pub particles: [Rgb; 3],
    /// Glow color for constellation lines and star halos.
    pub glow: Rgb,
    /// Clear color behind everything.
    pub background: Rgb,
}

/// Built-in palettes. The set is closed; new looks are added as variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemePreset {
    #[default]
    Night,
    Dusk,
    Aurora,
}

impl ThemePreset {
    /// The palette for this preset.
    pub fn palette(self) -> ThemePalette {
        match self {
            ThemePreset::Night => ThemePalette {
                particles: [[0.80, 0.86, 1.00], [0.62, 0.70, 0.95], [0.95, 0.90, 0.82]],
                glow: [0.55, 0.70, 1.00],
                background: [0.012, 0.016, 0.040],
            },
            ThemePreset::Dusk => ThemePalette {
                particles: [[1.00, 0.78, 0.66], [0.86, 0.62, 0.82], [0.70, 0.72, 1.00]],
                glow: [1.00, 0.62, 0.52],
                background: [0.050, 0.024, 0.060],
            },
            ThemePreset::Aurora => ThemePalette {
                particles: [[0.60, 1.00, 0.84], [0.52, 0.80, 1.00], [0.86, 0.70, 1.00]],
                glow: [0.40, 1.00, 0.72],
                background: [0.008, 0.030, 0.036],
            },
        }
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        ThemePreset::default().palette()
    }
}

/// Linear interpolation between two colors.
pub fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_valid_channels() {
        for preset in [ThemePreset::Night, ThemePreset::Dusk, ThemePreset::Aurora] {
            let p = preset.palette();
            let all = p
                .particles
                .iter()
                .chain(std::iter::once(&p.glow))
                .chain(std::iter::once(&p.background));
            for color in all {
                for &c in color {
                    assert!((0.0..=1.0).contains(&c), "{preset:?} channel {c} out of range");
                }
            }
        }
    }

    #[test]
    fn test_background_is_dark() {
        for preset in [ThemePreset::Night, ThemePreset::Dusk, ThemePreset::Aurora] {
            let bg = preset.palette().background;
            assert!(bg.iter().all(|&c| c < 0.1), "{preset:?} background too bright");
        }
    }

    #[test]
    fn test_mix_endpoints() {
        let a = [0.0, 0.5, 1.0];
        let b = [1.0, 0.5, 0.0];
        assert_eq!(mix(a, b, 0.0), a);
        assert_eq!(mix(a, b, 1.0), b);
        assert_eq!(mix(a, b, 2.0), b);
    }
}
