//! Backend-neutral draw lists derived from a scene.
//!
//! Both renderers turn nebulae, galaxies and lit constellation lines into the
//! same primitives here, so the two backends only differ in how they rasterize.

use std::f32::consts::TAU;

use glam::Vec2;
use sky_core::{GalaxyShape, Rgb, SkyScene};

/// Spiral winding used by both the CPU arm sampler and the glow shader.
pub const SPIRAL_WINDING: f32 = 3.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlowKind {
    Lobe,
    Elliptical,
    Spiral { arms: u32 },
}

impl GlowKind {
    /// `(kind, arms)` as encoded for the glow shader.
    pub fn shader_code(self) -> (f32, f32) {
        match self {
            GlowKind::Lobe => (0.0, 0.0),
            GlowKind::Elliptical => (1.0, 0.0),
            GlowKind::Spiral { arms } => (2.0, arms as f32),
        }
    }
}

/// One rotated elliptical gradient in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowSprite {
    pub center: Vec2,
    pub radii: Vec2,
    /// Radians.
    pub rotation: f32,
    pub color: Rgb,
    pub opacity: f32,
    pub kind: GlowKind,
}

/// Background-layer sprites: nebula lobes first, then galaxies.
pub fn glow_sprites(scene: &SkyScene) -> Vec<GlowSprite> {
    let mut sprites = Vec::new();

    for nebula in scene.nebulae().iter().filter(|n| n.is_visible()) {
        for lobe in &nebula.lobes {
            sprites.push(GlowSprite {
                center: nebula.screen + lobe.offset * nebula.screen_radius,
                radii: Vec2::new(lobe.radius_x, lobe.radius_y) * nebula.screen_radius,
                rotation: lobe.rotation,
                color: nebula.color,
                opacity: nebula.opacity * lobe.intensity,
                kind: GlowKind::Lobe,
            });
        }
    }

    for galaxy in scene.galaxies().iter().filter(|g| g.is_visible()) {
        let kind = match galaxy.shape {
            GalaxyShape::Spiral { arms } => GlowKind::Spiral { arms },
            GalaxyShape::Elliptical => GlowKind::Elliptical,
        };
        sprites.push(GlowSprite {
            center: galaxy.screen,
            radii: Vec2::new(galaxy.screen_radius, galaxy.screen_radius * galaxy.tilt),
            rotation: galaxy.rotation,
            color: galaxy.color,
            opacity: galaxy.opacity,
            kind,
        });
    }

    sprites.retain(|s| s.opacity > 0.0 && s.radii.min_element() > 0.0);
    sprites
}

/// Points along each spiral arm in the sprite's unit space, with relative weight.
pub fn spiral_arm_samples(arms: u32, per_arm: usize) -> Vec<(Vec2, f32)> {
    let mut samples = Vec::with_capacity(arms as usize * per_arm);
    for k in 0..arms {
        let base = k as f32 * TAU / arms as f32;
        for i in 0..per_arm {
            let r = 0.12 + 0.85 * i as f32 / per_arm.max(1) as f32;
            let angle = base + SPIRAL_WINDING * (r + 0.08).ln();
            samples.push((Vec2::from_angle(angle) * r, 1.0 - r * 0.8));
        }
    }
    samples
}

/// A constellation line with non-zero reveal opacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LitSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub opacity: f32,
}

pub fn lit_segments(scene: &SkyScene) -> impl Iterator<Item = LitSegment> + '_ {
    let stars = scene.stars();
    scene
        .connections()
        .iter()
        .zip(scene.line_opacities())
        .filter(|&(_, &opacity)| opacity > 0.0)
        .map(move |(edge, &opacity)| LitSegment {
            from: stars[edge.a()].screen,
            to: stars[edge.b()].screen,
            opacity,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_core::{HostProjection, SkySettings, ThemePalette};

    fn scene() -> SkyScene {
        let mut settings = SkySettings::default();
        settings.catalog.nebula_count = 40;
        settings.catalog.galaxy_count = 40;
        let mut scene = SkyScene::new(settings, ThemePalette::default(), 640, 480).unwrap();
        scene.update(16.0, HostProjection::All);
        scene
    }

    #[test]
    fn test_sprites_only_for_visible_objects() {
        let scene = scene();
        let sprites = glow_sprites(&scene);
        let stats = scene.stats();
        assert!(stats.visible_nebulae + stats.visible_galaxies > 0, "nothing in view");
        let galaxy_sprites = sprites
            .iter()
            .filter(|s| !matches!(s.kind, GlowKind::Lobe))
            .count();
        assert_eq!(galaxy_sprites, stats.visible_galaxies);
        for s in &sprites {
            assert!(s.opacity > 0.0 && s.opacity <= 1.0, "opacity {}", s.opacity);
        }
    }

    #[test]
    fn test_no_segments_without_pointer() {
        assert_eq!(lit_segments(&scene()).count(), 0);
    }

    #[test]
    fn test_spiral_samples_stay_in_unit_disc() {
        let samples = spiral_arm_samples(3, 16);
        assert_eq!(samples.len(), 48);
        for (p, w) in samples {
            assert!(p.length() < 1.0, "{p:?}");
            assert!(w > 0.0);
        }
    }

    #[test]
    fn test_shader_codes() {
        assert_eq!(GlowKind::Lobe.shader_code(), (0.0, 0.0));
        assert_eq!(GlowKind::Spiral { arms: 3 }.shader_code(), (2.0, 3.0));
    }
}
