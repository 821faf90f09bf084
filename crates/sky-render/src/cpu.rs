//! Software renderer on `tiny_skia`.
//!
//! Every star is projected on the host. Nebulae and galaxies are painted into
//! a cached pixmap that is only repainted when the background cache moves to
//! a new generation, then blitted under the stars each frame.

use sky_core::{HostProjection, LayerTier, Rgb, RuntimeStar, SkyScene};
use tiny_skia::{
    BlendMode, Color, FillRule, GradientStop, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint,
    Point, RadialGradient, Shader, SpreadMode, Stroke, Transform,
};

use crate::sprites::{GlowKind, GlowSprite, LitSegment, glow_sprites, lit_segments, spiral_arm_samples};

/// Halo radius as a multiple of the star radius.
const HALO_EXTENT: f32 = 2.5;
const ARM_SAMPLES: usize = 14;
const ARM_DAB_RADIUS: f32 = 0.09;

// Radial falloff tables, (position, weight). Sampled from the glow shader curves.
const LOBE_FALLOFF: &[(f32, f32)] = &[(0.0, 1.0), (0.25, 0.71), (0.5, 0.25), (0.75, 0.025), (1.0, 0.0)];
const ELLIPTICAL_FALLOFF: &[(f32, f32)] =
    &[(0.0, 1.0), (0.25, 0.82), (0.5, 0.19), (0.75, 0.014), (1.0, 0.0)];
const SPIRAL_CORE_FALLOFF: &[(f32, f32)] = &[(0.0, 1.0), (0.25, 0.42), (0.5, 0.03), (1.0, 0.0)];
const HALO_FALLOFF: &[(f32, f32)] = &[(0.0, 0.35), (0.4, 0.12), (1.0, 0.0)];

fn rgba(color: Rgb, alpha: f32) -> Color {
    let [r, g, b] = color.map(|c| c.clamp(0.0, 1.0));
    Color::from_rgba(r, g, b, alpha.clamp(0.0, 1.0)).unwrap_or(Color::TRANSPARENT)
}

/// A radial gradient in unit space, or `None` if tiny-skia rejects the stops.
fn unit_gradient(color: Rgb, opacity: f32, falloff: &[(f32, f32)]) -> Option<Shader<'static>> {
    let stops = falloff
        .iter()
        .map(|&(pos, weight)| GradientStop::new(pos, rgba(color, opacity * weight)))
        .collect();
    RadialGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(0.0, 0.0),
        1.0,
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
}

/// Paint for a radial falloff. Falls back to a flat translucent fill.
fn falloff_paint(color: Rgb, opacity: f32, falloff: &[(f32, f32)], blend: BlendMode) -> Paint<'static> {
    let mut paint = Paint {
        anti_alias: true,
        blend_mode: blend,
        ..Paint::default()
    };
    match unit_gradient(color, opacity, falloff) {
        Some(shader) => paint.shader = shader,
        None => paint.set_color(rgba(color, opacity * 0.5)),
    }
    paint
}

fn sprite_transform(sprite: &GlowSprite) -> Transform {
    Transform::from_translate(sprite.center.x, sprite.center.y)
        .pre_rotate(sprite.rotation.to_degrees())
        .pre_scale(sprite.radii.x, sprite.radii.y)
}

fn paint_glow(pixmap: &mut Pixmap, sprite: &GlowSprite) {
    let Some(disc) = PathBuilder::from_circle(0.0, 0.0, 1.0) else {
        return;
    };
    let transform = sprite_transform(sprite);
    let falloff = match sprite.kind {
        GlowKind::Lobe => LOBE_FALLOFF,
        GlowKind::Elliptical => ELLIPTICAL_FALLOFF,
        GlowKind::Spiral { .. } => SPIRAL_CORE_FALLOFF,
    };
    let paint = falloff_paint(sprite.color, sprite.opacity, falloff, BlendMode::Plus);
    pixmap.fill_path(&disc, &paint, FillRule::Winding, transform, None);

    if let GlowKind::Spiral { arms } = sprite.kind {
        for (p, weight) in spiral_arm_samples(arms, ARM_SAMPLES) {
            let Some(dab) = PathBuilder::from_circle(p.x, p.y, ARM_DAB_RADIUS) else {
                continue;
            };
            let mut paint = Paint {
                anti_alias: true,
                blend_mode: BlendMode::Plus,
                ..Paint::default()
            };
            paint.set_color(rgba(sprite.color, sprite.opacity * weight * 0.35));
            pixmap.fill_path(&dab, &paint, FillRule::Winding, transform, None);
        }
    }
}

fn paint_star(pixmap: &mut Pixmap, star: &RuntimeStar, glow: Rgb) {
    let radius = star.size.max(0.3);
    let reach = radius * HALO_EXTENT;
    let (x, y) = (star.screen.x, star.screen.y);
    if x < -reach || y < -reach || x > pixmap.width() as f32 + reach || y > pixmap.height() as f32 + reach {
        return;
    }

    if star.tier() != LayerTier::Filler
        && let Some(halo) = PathBuilder::from_circle(0.0, 0.0, 1.0)
    {
        let tint = sky_core::theme::mix(star.color, glow, 0.35);
        let paint = falloff_paint(tint, star.opacity, HALO_FALLOFF, BlendMode::Plus);
        let transform = Transform::from_translate(x, y).pre_scale(reach, reach);
        pixmap.fill_path(&halo, &paint, FillRule::Winding, transform, None);
    }

    let Some(core) = PathBuilder::from_circle(x, y, radius) else {
        return;
    };
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    paint.set_color(rgba(star.color, star.opacity));
    pixmap.fill_path(&core, &paint, FillRule::Winding, Transform::identity(), None);
}

fn paint_line(pixmap: &mut Pixmap, segment: &LitSegment, color: Rgb, width: f32) {
    let mut pb = PathBuilder::new();
    pb.move_to(segment.from.x, segment.from.y);
    pb.line_to(segment.to.x, segment.to.y);
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    paint.set_color(rgba(color, segment.opacity));
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Paint the background layer for the scene's current large-object placement.
pub fn paint_background(scene: &SkyScene) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(scene.width(), scene.height())?;
    pixmap.fill(rgba(scene.palette().background, 1.0));
    for sprite in glow_sprites(scene) {
        paint_glow(&mut pixmap, &sprite);
    }
    Some(pixmap)
}

#[derive(Debug)]
pub struct CpuBackend {
    line_width: f32,
    background: Option<Pixmap>,
    /// Scene epoch and background generation the cached layer was painted for.
    drawn_layer: Option<(u64, u64)>,
}

impl CpuBackend {
    pub fn new(line_width: f32) -> Self {
        Self {
            line_width,
            background: None,
            drawn_layer: None,
        }
    }

    /// Host projection this backend needs from [`SkyScene::update`].
    pub fn host_projection(&self) -> HostProjection {
        HostProjection::All
    }

    /// Key of the cached background layer, if one is painted.
    pub fn cached_layer(&self) -> Option<(u64, u64)> {
        self.drawn_layer
    }

    fn refresh_background(&mut self, scene: &SkyScene) -> bool {
        let key = (scene.epoch(), scene.background().generation());
        let size_matches = self
            .background
            .as_ref()
            .is_some_and(|bg| bg.width() == scene.width() && bg.height() == scene.height());
        if size_matches && self.drawn_layer == Some(key) {
            return true;
        }
        match paint_background(scene) {
            Some(pixmap) => {
                self.background = Some(pixmap);
                self.drawn_layer = Some(key);
                log::trace!("Background layer repainted for {key:?}");
                true
            }
            None => false,
        }
    }

    /// Draw `scene` into `target`. Returns false when the frame was skipped,
    /// which happens when the target size does not match the scene.
    pub fn render(&mut self, scene: &SkyScene, target: &mut Pixmap) -> bool {
        if target.width() != scene.width() || target.height() != scene.height() {
            log::trace!(
                "Skipping frame: target {}x{} vs scene {}x{}",
                target.width(),
                target.height(),
                scene.width(),
                scene.height()
            );
            return false;
        }
        if !self.refresh_background(scene) {
            return false;
        }
        if let Some(background) = &self.background {
            target.draw_pixmap(
                0,
                0,
                background.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }

        let glow = scene.palette().glow;
        for star in scene.stars().iter().filter(|s| s.visible && s.opacity > 0.0) {
            paint_star(target, star, glow);
        }
        for segment in lit_segments(scene) {
            paint_line(target, &segment, glow, self.line_width);
        }
        true
    }

    pub fn release(&mut self) {
        self.background = None;
        self.drawn_layer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_core::{SkySettings, ThemePalette};

    fn scene(w: u32, h: u32) -> SkyScene {
        let mut scene = SkyScene::new(SkySettings::default(), ThemePalette::default(), w, h).unwrap();
        scene.update(16.0, HostProjection::All);
        scene
    }

    fn luminance(pixmap: &Pixmap, x: u32, y: u32) -> u32 {
        let p = pixmap.pixel(x, y).expect("pixel in bounds");
        p.red() as u32 + p.green() as u32 + p.blue() as u32
    }

    #[test]
    fn test_size_mismatch_skips_frame() {
        let scene = scene(200, 100);
        let mut backend = CpuBackend::new(1.2);
        let mut target = Pixmap::new(100, 100).unwrap();
        assert!(!backend.render(&scene, &mut target));
        assert!(backend.cached_layer().is_none());
    }

    #[test]
    fn test_background_layer_is_cached_between_frames() {
        let mut scene = scene(160, 120);
        let mut backend = CpuBackend::new(1.2);
        let mut target = Pixmap::new(160, 120).unwrap();
        assert!(backend.render(&scene, &mut target));
        let first = backend.cached_layer();
        assert!(first.is_some());

        scene.update(16.0, HostProjection::All);
        assert!(backend.render(&scene, &mut target));
        assert_eq!(backend.cached_layer(), first, "small drift must not repaint");
    }

    #[test]
    fn test_named_star_brightens_its_pixel() {
        let scene = scene(800, 600);
        let mut backend = CpuBackend::new(1.2);
        let mut target = Pixmap::new(800, 600).unwrap();
        assert!(backend.render(&scene, &mut target));

        let background = paint_background(&scene).unwrap();
        let star = scene
            .stars()
            .iter()
            .filter(|s| s.tier() == LayerTier::Named && s.visible)
            .find(|s| s.screen.x >= 1.0 && s.screen.y >= 1.0 && s.screen.x < 799.0 && s.screen.y < 599.0);
        let Some(star) = star else {
            return;
        };
        let (x, y) = (star.screen.x as u32, star.screen.y as u32);
        assert!(
            luminance(&target, x, y) > luminance(&background, x, y),
            "star at ({x}, {y}) left no mark"
        );
    }

    #[test]
    fn test_lit_line_is_drawn() {
        let mut scene = scene(800, 600);
        let edge = scene
            .connections()
            .iter()
            .copied()
            .find(|e| {
                let (a, b) = (&scene.stars()[e.a()], &scene.stars()[e.b()]);
                a.visible && b.visible && a.screen.distance(b.screen) > 20.0
                    && [a.screen, b.screen]
                        .iter()
                        .all(|p| p.x > 0.0 && p.y > 0.0 && p.x < 800.0 && p.y < 600.0)
            });
        let Some(edge) = edge else {
            return;
        };
        let a = scene.stars()[edge.a()].screen;
        let b = scene.stars()[edge.b()].screen;
        let mid = (a + b) * 0.5;
        scene.set_pointer_position(Some(a));
        scene.update(0.0, HostProjection::All);

        let mut lit = Pixmap::new(800, 600).unwrap();
        CpuBackend::new(2.0).render(&scene, &mut lit);
        scene.set_pointer_position(None);
        scene.update(0.0, HostProjection::All);
        let mut dark = Pixmap::new(800, 600).unwrap();
        CpuBackend::new(2.0).render(&scene, &mut dark);

        let (x, y) = (mid.x as u32, mid.y as u32);
        assert!(luminance(&lit, x, y) > luminance(&dark, x, y));
    }

    #[test]
    fn test_release_drops_cache() {
        let scene = scene(64, 64);
        let mut backend = CpuBackend::new(1.0);
        let mut target = Pixmap::new(64, 64).unwrap();
        backend.render(&scene, &mut target);
        backend.release();
        assert!(backend.cached_layer().is_none());
    }
}
