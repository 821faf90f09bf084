//! Runtime star records derived once at scene build.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::appearance::{MagnitudeScale, spectral_color};
use crate::catalog::CatalogStar;
use crate::filler::FillerStar;
use crate::theme::{ThemePalette, mix};

/// Lowest fraction of base opacity a star dips to while twinkling.
pub const TWINKLE_FLOOR: f32 = 0.55;

/// Coarse importance class. Fixed for a star's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LayerTier {
    /// Generated background population.
    Filler = 0,
    /// Catalog star outside any constellation figure.
    Medium = 1,
    /// Catalog star that is an endpoint of at least one figure line.
    Named = 2,
}

/// A star as the renderers see it.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeStar {
    pub ra: f32,
    pub dec: f32,
    /// Radius in pixels.
    pub size: f32,
    pub color: [f32; 3],
    pub base_opacity: f32,
    pub twinkle_speed: f32,
    pub twinkle_phase: f32,
    tier: LayerTier,
    /// Index into the catalog for catalog stars.
    pub catalog_index: Option<usize>,

    /// Absolute screen position in pixels, refreshed per frame.
    pub screen: Vec2,
    /// Whether the star was in front of the horizon at the last projection.
    pub visible: bool,
    /// Live opacity after twinkle, refreshed per frame.
    pub opacity: f32,
}

impl RuntimeStar {
    pub fn tier(&self) -> LayerTier {
        self.tier
    }
}

/// Twinkle-modulated opacity at `time_s` seconds.
///
/// Mirrored in the GPU star shader.
#[inline]
pub fn twinkle_opacity(base: f32, speed: f32, phase: f32, time_s: f32) -> f32 {
    let wave = 0.5 + 0.5 * (time_s * speed + phase).sin();
    base * (TWINKLE_FLOOR + (1.0 - TWINKLE_FLOOR) * wave)
}

/// Runtime stars plus the name index used to resolve figure links.
#[derive(Clone, Debug, Default)]
pub struct StarTable {
    pub stars: Vec<RuntimeStar>,
    pub index_by_name: FxHashMap<&'static str, usize>,
}

/// Build runtime stars: catalog entries first (in catalog order), then filler.
///
/// `linked` holds the catalog names that take part in any figure line;
/// those stars get [`LayerTier::Named`].
pub fn build_star_table(
    catalog: &'static [CatalogStar],
    linked: &FxHashSet<&'static str>,
    filler: &[FillerStar],
    scale: &MagnitudeScale,
    palette: &ThemePalette,
    twinkle_seed: u64,
) -> StarTable {
    let mut stars = Vec::with_capacity(catalog.len() + filler.len());
    let mut index_by_name = FxHashMap::default();
    let mut rng = ChaCha8Rng::seed_from_u64(twinkle_seed);

    for (i, entry) in catalog.iter().enumerate() {
        let tier = if linked.contains(entry.name) {
            LayerTier::Named
        } else {
            LayerTier::Medium
        };
        let base = entry.spectral.map(spectral_color).unwrap_or(palette.particles[0]);
        // Pull catalog colors slightly toward the theme so they sit in the same key.
        let color = mix(base, palette.glow, 0.12);
        let twinkle_speed = rng.random_range(0.3..1.2);
        let twinkle_phase = rng.random::<f32>() * TAU;

        index_by_name.insert(entry.name, stars.len());
        stars.push(RuntimeStar {
            ra: entry.ra,
            dec: entry.dec,
            size: scale.size(entry.magnitude) * if tier == LayerTier::Named { 1.15 } else { 1.0 },
            color,
            base_opacity: scale.brightness(entry.magnitude),
            twinkle_speed,
            twinkle_phase,
            tier,
            catalog_index: Some(i),
            screen: Vec2::ZERO,
            visible: false,
            opacity: 0.0,
        });
    }

    for f in filler {
        let slot = (f.palette_slot as usize).min(palette.particles.len() - 1);
        stars.push(RuntimeStar {
            ra: f.ra,
            dec: f.dec,
            size: scale.size(f.magnitude),
            color: palette.particles[slot],
            base_opacity: scale.brightness(f.magnitude),
            twinkle_speed: f.twinkle_speed,
            twinkle_phase: f.twinkle_phase,
            tier: LayerTier::Filler,
            catalog_index: None,
            screen: Vec2::ZERO,
            visible: false,
            opacity: 0.0,
        });
    }

    StarTable {
        stars,
        index_by_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BRIGHT_STARS;
    use crate::filler::generate_filler;

    fn table(filler: usize) -> StarTable {
        build_star_table(
            BRIGHT_STARS,
            &FxHashSet::from_iter(["Vega", "Zeta Lyrae"]),
            &generate_filler(3, filler),
            &MagnitudeScale::default(),
            &ThemePalette::default(),
            11,
        )
    }

    #[test]
    fn test_catalog_first_then_filler() {
        let t = table(50);
        assert_eq!(t.stars.len(), BRIGHT_STARS.len() + 50);
        for (i, s) in t.stars.iter().enumerate() {
            if i < BRIGHT_STARS.len() {
                assert_eq!(s.catalog_index, Some(i));
                assert_ne!(s.tier(), LayerTier::Filler);
            } else {
                assert_eq!(s.tier(), LayerTier::Filler);
            }
        }
    }

    #[test]
    fn test_tiers_follow_link_predicate() {
        let t = table(0);
        let vega = t.index_by_name["Vega"];
        let sirius = t.index_by_name["Sirius"];
        assert_eq!(t.stars[vega].tier(), LayerTier::Named);
        assert_eq!(t.stars[sirius].tier(), LayerTier::Medium);
    }

    #[test]
    fn test_twinkle_stays_within_floor_and_base() {
        for i in 0..1000 {
            let t = i as f32 * 0.037;
            let o = twinkle_opacity(0.8, 1.3, 0.4, t);
            assert!(o >= 0.8 * TWINKLE_FLOOR - 1e-6 && o <= 0.8 + 1e-6, "opacity {o}");
        }
    }

    #[test]
    fn test_twinkle_seed_is_reproducible() {
        let a = table(10);
        let b = table(10);
        assert_eq!(a.stars, b.stars);
    }
}
