//! Seeded nebulae and galaxies pinned to celestial coordinates.
//!
//! Every object draws from its own [`ObjectRng`] derived from the scene seed
//! and the object's index, so objects never share randomness and rebuilding
//! with a different object count leaves the earlier objects unchanged.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use noise::{NoiseFn, Simplex};
use rand::Rng;

use crate::projector::{ViewOrientation, celestial_to_unit, project_faded};
use crate::rng::ObjectRng;
use crate::theme::{Rgb, ThemePalette, mix};

/// Salt separating galaxy streams from nebula streams under one scene seed.
const GALAXY_STREAM_SALT: u64 = 0x6A09_E667_F3BC_C908;

/// Probability that a galaxy is a spiral.
pub const SPIRAL_PROBABILITY: f32 = 0.65;

/// One elliptical gradient component of a nebula.
///
/// Offsets and radii are in units of the owning nebula's radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lobe {
    pub offset: Vec2,
    pub radius_x: f32,
    pub radius_y: f32,
    /// Ellipse rotation, radians.
    pub rotation: f32,
    /// Relative brightness in `[0, 1]`.
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Nebula {
    pub ra: f32,
    pub dec: f32,
    /// Angular radius in sphere units at the view center.
    pub angular_radius: f32,
    pub lobes: Vec<Lobe>,
    pub color: Rgb,
    pub base_opacity: f32,

    /// Absolute screen position, refreshed per frame.
    pub screen: Vec2,
    /// Pixel radius including stereographic magnification.
    pub screen_radius: f32,
    /// `base_opacity * horizon_fade`.
    pub opacity: f32,
}

impl Nebula {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalaxyShape {
    Spiral { arms: u32 },
    Elliptical,
}

impl GalaxyShape {
    /// Arm count; 0 for elliptical galaxies.
    pub fn arms(self) -> u32 {
        match self {
            GalaxyShape::Spiral { arms } => arms,
            GalaxyShape::Elliptical => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Galaxy {
    pub ra: f32,
    pub dec: f32,
    pub shape: GalaxyShape,
    /// Minor-to-major axis ratio, `[0.3, 1.0]`.
    pub tilt: f32,
    /// Major-axis rotation, radians.
    pub rotation: f32,
    pub angular_radius: f32,
    pub color: Rgb,
    pub base_opacity: f32,

    pub screen: Vec2,
    pub screen_radius: f32,
    pub opacity: f32,
}

impl Galaxy {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Projection inputs shared by every large-area object in one frame.
#[derive(Clone, Copy, Debug)]
pub struct FadeProjector {
    pub view: ViewOrientation,
    pub center: Vec2,
    pub scale: f32,
    pub cutoff: f32,
    pub window: f32,
}

impl FadeProjector {
    /// Returns `(screen, radius_px, fade)` for an object of the given angular radius.
    fn place(&self, ra: f32, dec: f32, angular_radius: f32) -> (Vec2, f32, f32) {
        let p = project_faded(ra, dec, &self.view, self.scale, self.cutoff, self.window);
        (
            self.center + p.offset,
            angular_radius * self.scale * p.magnification,
            p.fade,
        )
    }

    pub fn nebula(&self, nebula: &mut Nebula) {
        let (screen, radius, fade) = self.place(nebula.ra, nebula.dec, nebula.angular_radius);
        nebula.screen = screen;
        nebula.screen_radius = radius;
        nebula.opacity = nebula.base_opacity * fade;
    }

    pub fn galaxy(&self, galaxy: &mut Galaxy) {
        let (screen, radius, fade) = self.place(galaxy.ra, galaxy.dec, galaxy.angular_radius);
        galaxy.screen = screen;
        galaxy.screen_radius = radius;
        galaxy.opacity = galaxy.base_opacity * fade;
    }
}

/// Uniform point on the sphere: `(ra, dec)`.
fn sphere_point(rng: &mut ObjectRng) -> (f32, f32) {
    let ra = rng.next_unit() * TAU;
    let dec = (2.0 * rng.next_unit() - 1.0).clamp(-1.0, 1.0).asin();
    (ra, dec)
}

fn theme_color(rng: &mut ObjectRng, palette: &ThemePalette) -> Rgb {
    let slot = rng.random_range(0..palette.particles.len());
    mix(palette.particles[slot], palette.glow, rng.next_range(0.1, 0.5))
}

/// Build one nebula from its own stream.
pub fn generate_nebula(scene_seed: u64, index: u32, palette: &ThemePalette) -> Nebula {
    let mut rng = ObjectRng::for_object(scene_seed, index);
    let (ra, dec) = sphere_point(&mut rng);
    let angular_radius = rng.next_range(0.12, 0.32);
    let color = theme_color(&mut rng, palette);
    let base_opacity = rng.next_range(0.05, 0.14);

    // Wisps: lobe intensity is modulated by a noise field keyed to this object.
    let field = Simplex::new(rng.state());
    let lobe_count = 2 + (rng.step() % 3) as usize;
    let mut lobes = Vec::with_capacity(lobe_count);
    for _ in 0..lobe_count {
        let angle = rng.next_unit() * TAU;
        let distance = rng.next_range(0.0, 0.6);
        let radius_x = rng.next_range(0.35, 0.8);
        let radius_y = radius_x * rng.next_range(0.45, 1.0);
        let rotation = rng.next_unit() * PI;
        let raw = rng.next_range(0.55, 1.0);

        let offset = Vec2::from_angle(angle) * distance;
        let dir = celestial_to_unit(ra + offset.x * angular_radius, dec + offset.y * angular_radius);
        let n = field.get([dir.x as f64 * 3.0, dir.y as f64 * 3.0, dir.z as f64 * 3.0]) as f32;
        let intensity = (raw * (0.75 + 0.25 * n)).clamp(0.05, 1.0);

        lobes.push(Lobe {
            offset,
            radius_x,
            radius_y,
            rotation,
            intensity,
        });
    }

    Nebula {
        ra,
        dec,
        angular_radius,
        lobes,
        color,
        base_opacity,
        screen: Vec2::ZERO,
        screen_radius: 0.0,
        opacity: 0.0,
    }
}

/// Build one galaxy from its own stream.
pub fn generate_galaxy(scene_seed: u64, index: u32, palette: &ThemePalette) -> Galaxy {
    let mut rng = ObjectRng::for_object(scene_seed ^ GALAXY_STREAM_SALT, index);
    let (ra, dec) = sphere_point(&mut rng);
    let shape = if rng.chance(SPIRAL_PROBABILITY) {
        GalaxyShape::Spiral {
            arms: 2 + rng.step() % 3,
        }
    } else {
        GalaxyShape::Elliptical
    };
    let tilt = rng.next_range(0.3, 1.0);
    let rotation = rng.next_unit() * PI;
    let angular_radius = rng.next_range(0.04, 0.10);
    let color = theme_color(&mut rng, palette);
    let base_opacity = rng.next_range(0.18, 0.35);

    Galaxy {
        ra,
        dec,
        shape,
        tilt,
        rotation,
        angular_radius,
        color,
        base_opacity,
        screen: Vec2::ZERO,
        screen_radius: 0.0,
        opacity: 0.0,
    }
}

pub fn generate_nebulae(count: usize, scene_seed: u64, palette: &ThemePalette) -> Vec<Nebula> {
    (0..count as u32)
        .map(|i| generate_nebula(scene_seed, i, palette))
        .collect()
}

pub fn generate_galaxies(count: usize, scene_seed: u64, palette: &ThemePalette) -> Vec<Galaxy> {
    (0..count as u32)
        .map(|i| generate_galaxy(scene_seed, i, palette))
        .collect()
}
