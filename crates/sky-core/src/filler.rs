//! Deterministic bulk generator for unlabeled filler stars.
//!
//! Uses [`FillerLcg`] exclusively, so a fixed seed and count always reproduce
//! the same field regardless of anything else the scene draws.

use std::f32::consts::TAU;

use rand::Rng;

use crate::rng::FillerLcg;

/// Faintest magnitude a filler star can have.
pub const FILLER_MAG_FAINT: f32 = 6.5;
/// Brightest magnitude a filler star can have.
pub const FILLER_MAG_BRIGHT: f32 = 3.0;

/// One generated filler star before runtime attributes are derived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillerStar {
    pub ra: f32,
    pub dec: f32,
    pub magnitude: f32,
    /// Index into the theme's three particle colors.
    pub palette_slot: u8,
    /// Twinkle angular speed, radians per second.
    pub twinkle_speed: f32,
    /// Twinkle phase offset, radians.
    pub twinkle_phase: f32,
}

/// Generate `count` filler stars from `seed`.
///
/// Right ascension is uniform; declination is `asin(2u - 1)` so density is
/// uniform over the sphere rather than bunched at the poles. Magnitudes skew
/// faint: most stars sit near [`FILLER_MAG_FAINT`].
pub fn generate_filler(seed: u32, count: usize) -> Vec<FillerStar> {
    let mut rng = FillerLcg::new(seed);
    let mut stars = Vec::with_capacity(count);

    for _ in 0..count {
        let ra = rng.next_unit() * TAU;
        let dec = (2.0 * rng.next_unit() - 1.0).clamp(-1.0, 1.0).asin();
        let u = rng.next_unit();
        let magnitude = FILLER_MAG_FAINT - (FILLER_MAG_FAINT - FILLER_MAG_BRIGHT) * u.powi(4);
        let palette_slot = rng.random_range(0..3u8);
        let twinkle_speed = rng.next_range(0.4, 2.2);
        let twinkle_phase = rng.next_unit() * TAU;

        stars.push(FillerStar {
            ra,
            dec,
            magnitude,
            palette_slot,
            twinkle_speed,
            twinkle_phase,
        });
    }

    stars
}

/// Number of filler stars for a viewport, from a per-megapixel density.
pub fn filler_count(width: u32, height: u32, per_megapixel: f32, min: usize, max: usize) -> usize {
    let megapixels = width as f64 * height as f64 / 1.0e6;
    let wanted = (megapixels * per_megapixel.max(0.0) as f64).round() as usize;
    wanted.clamp(min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_same_seed_same_field() {
        let a = generate_filler(1234, 3000);
        let b = generate_filler(1234, 3000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_field() {
        let a = generate_filler(1, 1000);
        let b = generate_filler(2, 1000);
        let differing = a.iter().zip(&b).filter(|(x, y)| x.ra != y.ra).count();
        assert!(differing > 990, "only {differing}/1000 stars differ");
    }

    #[test]
    fn test_prefix_is_stable_when_count_grows() {
        let small = generate_filler(77, 100);
        let large = generate_filler(77, 500);
        assert_eq!(small[..], large[..100]);
    }

    #[test]
    fn test_max_state_seed_keeps_ra_below_tau() {
        let star = generate_filler(653_637_408, 1)[0];
        assert!(star.ra < TAU, "RA {} wrapped to TAU", star.ra);
    }

    #[test]
    fn test_coordinates_in_range() {
        for star in generate_filler(9, 5000) {
            assert!((0.0..TAU).contains(&star.ra), "RA {}", star.ra);
            assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&star.dec), "Dec {}", star.dec);
            assert!((FILLER_MAG_BRIGHT..=FILLER_MAG_FAINT).contains(&star.magnitude));
            assert!(star.palette_slot < 3);
        }
    }

    #[test]
    fn test_uniform_sphere_density() {
        // Equal-area bands: |sin(dec)| in [0, 0.5) and [0.5, 1) cover the same
        // solid angle, so counts should match.
        let stars = generate_filler(2024, 20_000);
        let low = stars.iter().filter(|s| s.dec.sin().abs() < 0.5).count();
        let high = stars.len() - low;
        let ratio = low as f32 / high as f32;
        assert!(
            (0.9..1.1).contains(&ratio),
            "equal-area bands unbalanced: {low} vs {high}"
        );
    }

    #[test]
    fn test_magnitudes_skew_faint() {
        let stars = generate_filler(5, 5000);
        let faint = stars.iter().filter(|s| s.magnitude > 6.0).count();
        let bright = stars.iter().filter(|s| s.magnitude < 4.0).count();
        assert!(faint > bright * 3, "faint {faint} vs bright {bright}");
    }

    #[test]
    fn test_filler_count_scales_and_clamps() {
        assert_eq!(filler_count(1000, 1000, 1500.0, 200, 6000), 1500);
        assert_eq!(filler_count(10, 10, 1500.0, 200, 6000), 200);
        assert_eq!(filler_count(8000, 8000, 1500.0, 200, 6000), 6000);
    }
}
