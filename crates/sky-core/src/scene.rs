//! The scene: every runtime object plus the per-frame update that both
//! renderers read from.
//!
//! Writes happen only in [`SkyScene::update`] and the input setters; renderers
//! take `&SkyScene`.

use glam::Vec2;
use thiserror::Error;

use crate::background::BackgroundCache;
use crate::catalog::BRIGHT_STARS;
use crate::constellation::{Connection, build_connections, linked_names};
use crate::filler::{filler_count, generate_filler};
use crate::procedural::{FadeProjector, Galaxy, Nebula, generate_galaxies, generate_nebulae};
use crate::projector::{ViewOrientation, project};
use crate::reveal::RevealController;
use crate::settings::SkySettings;
use crate::star::{LayerTier, RuntimeStar, StarTable, build_star_table, twinkle_opacity};
use crate::theme::ThemePalette;
use crate::view::ViewController;

/// Projection scale per pixel of viewport diagonal at zoom 1.
pub const SCALE_PER_DIAGONAL: f32 = 0.45;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Viewport {width}x{height} has no area")]
    EmptyViewport { width: u32, height: u32 },

    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}

/// Which stars the host projects in [`SkyScene::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostProjection {
    /// Every star; used when the host also draws them.
    All,
    /// Only [`LayerTier::Named`] stars, the connection endpoints. The rest are
    /// projected on the device.
    LinkedOnly,
}

/// Per-scene counters for logs and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub filler_stars: usize,
    pub medium_stars: usize,
    pub named_stars: usize,
    pub connections: usize,
    pub visible_stars: usize,
    pub lit_connections: usize,
    pub visible_nebulae: usize,
    pub visible_galaxies: usize,
    pub background_generation: u64,
}

pub struct SkyScene {
    settings: SkySettings,
    palette: ThemePalette,
    width: u32,
    height: u32,
    scale: f32,

    stars: StarTable,
    connections: Vec<Connection>,
    line_opacity: Vec<f32>,
    nebulae: Vec<Nebula>,
    galaxies: Vec<Galaxy>,

    view: ViewController,
    reveal: RevealController,
    background: BackgroundCache,

    time_ms: f64,
    epoch: u64,
}

impl SkyScene {
    /// Build a scene for a `width` x `height` viewport.
    pub fn new(
        settings: SkySettings,
        palette: ThemePalette,
        width: u32,
        height: u32,
    ) -> Result<Self, SceneError> {
        if let Some((field, reason)) = settings.invalid_field() {
            return Err(SceneError::InvalidSetting { field, reason });
        }
        check_viewport(width, height)?;

        let mut scene = Self {
            settings,
            palette,
            width,
            height,
            scale: 0.0,
            stars: StarTable::default(),
            connections: Vec::new(),
            line_opacity: Vec::new(),
            nebulae: Vec::new(),
            galaxies: Vec::new(),
            view: ViewController::new(settings.view),
            reveal: RevealController::new(settings.reveal),
            background: BackgroundCache::new(settings.background),
            time_ms: 0.0,
            epoch: 0,
        };
        scene.rebuild();
        Ok(scene)
    }

    /// Rebuild for a new viewport size. Returns `Ok(false)` when the size is
    /// unchanged. On error the previous scene stays intact.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, SceneError> {
        check_viewport(width, height)?;
        if (width, height) == (self.width, self.height) {
            return Ok(false);
        }
        self.width = width;
        self.height = height;
        self.rebuild();
        Ok(true)
    }

    /// Swap the palette and rebuild colors.
    pub fn set_palette(&mut self, palette: ThemePalette) {
        if palette != self.palette {
            self.palette = palette;
            self.rebuild();
        }
    }

    /// Regenerate every runtime object. View state, pointer and clock survive.
    fn rebuild(&mut self) {
        let cat = &self.settings.catalog;
        self.scale = SCALE_PER_DIAGONAL
            * (self.width as f32).hypot(self.height as f32)
            * self.settings.projection.zoom;

        let count = filler_count(
            self.width,
            self.height,
            cat.filler_density,
            cat.filler_min,
            cat.filler_max,
        );
        let filler = generate_filler(cat.filler_seed, count);
        let linked = linked_names(BRIGHT_STARS);
        self.stars = build_star_table(
            BRIGHT_STARS,
            &linked,
            &filler,
            &cat.magnitude,
            &self.palette,
            cat.twinkle_seed,
        );
        self.connections = build_connections(BRIGHT_STARS, &self.stars.index_by_name);
        self.line_opacity = vec![0.0; self.connections.len()];
        self.nebulae = generate_nebulae(cat.nebula_count, cat.content_seed, &self.palette);
        self.galaxies = generate_galaxies(cat.galaxy_count, cat.content_seed, &self.palette);
        self.background.invalidate();
        self.epoch += 1;

        let stats = self.stats();
        log::info!(
            "Sky scene built for {}x{}: {} filler, {} medium, {} named stars, {} lines, {} nebulae, {} galaxies",
            self.width,
            self.height,
            stats.filler_stars,
            stats.medium_stars,
            stats.named_stars,
            stats.connections,
            self.nebulae.len(),
            self.galaxies.len(),
        );
    }

    /// Page scroll offset in signed pixels.
    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.view.set_scroll_offset(offset);
    }

    /// Pointer position in pixels, or `None` when the pointer left.
    pub fn set_pointer_position(&mut self, pointer: Option<Vec2>) {
        self.reveal.set_pointer(pointer);
    }

    /// Advance by `dt_ms` and refresh everything renderers read.
    pub fn update(&mut self, dt_ms: f32, mode: HostProjection) {
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        self.time_ms += dt_ms as f64;
        self.view.tick(dt_ms);

        let view = self.view.orientation();
        let center = self.center();
        let time_s = self.time_seconds();
        let epsilon = self.settings.projection.horizon_epsilon;

        for star in &mut self.stars.stars {
            if mode == HostProjection::LinkedOnly && star.tier() != LayerTier::Named {
                continue;
            }
            let p = project(star.ra, star.dec, &view, self.scale, epsilon);
            star.screen = center + p.offset;
            star.visible = p.visible;
            star.opacity = if p.visible {
                twinkle_opacity(star.base_opacity, star.twinkle_speed, star.twinkle_phase, time_s)
            } else {
                0.0
            };
        }

        let stars = &self.stars.stars;
        for (edge, opacity) in self.connections.iter().zip(&mut self.line_opacity) {
            let a = &stars[edge.a()];
            let b = &stars[edge.b()];
            *opacity = self.reveal.line_opacity(a.screen, a.visible, b.screen, b.visible);
        }

        if self.background.observe(view) {
            self.project_large_objects(self.background.rendered_view());
        }
    }

    /// Place nebulae and galaxies for the cached background layer.
    fn project_large_objects(&mut self, view: ViewOrientation) {
        let projector = FadeProjector {
            view,
            center: self.center(),
            scale: self.scale,
            cutoff: self.settings.projection.horizon_epsilon,
            window: self.settings.projection.fade_window,
        };
        for nebula in &mut self.nebulae {
            projector.nebula(nebula);
        }
        for galaxy in &mut self.galaxies {
            projector.galaxy(galaxy);
        }
        log::debug!(
            "Background layer #{} at ra={:.4} dec={:.4}",
            self.background.generation(),
            view.ra,
            view.dec
        );
    }

    pub fn settings(&self) -> &SkySettings {
        &self.settings
    }

    pub fn palette(&self) -> &ThemePalette {
        &self.palette
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * 0.5
    }

    /// Pixels per stereographic unit.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn stars(&self) -> &[RuntimeStar] {
        &self.stars.stars
    }

    /// Runtime index of a catalog star by name.
    pub fn star_index(&self, name: &str) -> Option<usize> {
        self.stars.index_by_name.get(name).copied()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Reveal opacity per connection, parallel to [`Self::connections`].
    pub fn line_opacities(&self) -> &[f32] {
        &self.line_opacity
    }

    pub fn nebulae(&self) -> &[Nebula] {
        &self.nebulae
    }

    pub fn galaxies(&self) -> &[Galaxy] {
        &self.galaxies
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn orientation(&self) -> ViewOrientation {
        self.view.orientation()
    }

    pub fn reveal(&self) -> &RevealController {
        &self.reveal
    }

    pub fn background(&self) -> &BackgroundCache {
        &self.background
    }

    /// Bumped on every rebuild; renderers re-upload static data on change.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn time_seconds(&self) -> f32 {
        (self.time_ms / 1000.0) as f32
    }

    pub fn stats(&self) -> SceneStats {
        let mut stats = SceneStats {
            connections: self.connections.len(),
            background_generation: self.background.generation(),
            ..Default::default()
        };
        for star in &self.stars.stars {
            match star.tier() {
                LayerTier::Filler => stats.filler_stars += 1,
                LayerTier::Medium => stats.medium_stars += 1,
                LayerTier::Named => stats.named_stars += 1,
            }
            if star.visible {
                stats.visible_stars += 1;
            }
        }
        stats.lit_connections = self.line_opacity.iter().filter(|&&o| o > 0.0).count();
        stats.visible_nebulae = self.nebulae.iter().filter(|n| n.is_visible()).count();
        stats.visible_galaxies = self.galaxies.iter().filter(|g| g.is_visible()).count();
        stats
    }
}

fn check_viewport(width: u32, height: u32) -> Result<(), SceneError> {
    if width == 0 || height == 0 {
        return Err(SceneError::EmptyViewport { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find;
    use crate::view::ViewParams;

    fn scene_looking_at(name: &str) -> SkyScene {
        let star = find(name).expect("catalog star");
        let settings = SkySettings {
            view: ViewParams {
                base_declination: star.dec,
                initial_right_ascension: star.ra,
                drift_rate: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        SkyScene::new(settings, ThemePalette::default(), 800, 600).expect("scene")
    }

    #[test]
    fn test_zero_viewport_rejected() {
        let err = SkyScene::new(SkySettings::default(), ThemePalette::default(), 0, 600);
        assert!(matches!(err, Err(SceneError::EmptyViewport { .. })));
    }

    #[test]
    fn test_star_at_view_center_lands_on_viewport_center() {
        let mut scene = scene_looking_at("Vega");
        scene.update(0.0, HostProjection::All);
        let vega = &scene.stars()[scene.star_index("Vega").unwrap()];
        assert!(vega.visible);
        assert!(
            (vega.screen - Vec2::new(400.0, 300.0)).length() < 0.05,
            "Vega at {:?}",
            vega.screen
        );
    }

    #[test]
    fn test_connection_indices_reference_live_stars() {
        let mut scene = scene_looking_at("Betelgeuse");
        scene.resize(1920, 1080).unwrap();
        let n = scene.stars().len();
        for edge in scene.connections() {
            assert!(edge.b() < n);
            assert_eq!(scene.stars()[edge.a()].tier(), LayerTier::Named);
            assert_eq!(scene.stars()[edge.b()].tier(), LayerTier::Named);
        }
    }

    #[test]
    fn test_resize_rebuilds_and_keeps_view() {
        let mut scene = scene_looking_at("Rigel");
        scene.set_scroll_offset(300.0);
        scene.update(16.0, HostProjection::All);
        let view_before = *scene.view().state();
        let epoch = scene.epoch();

        assert!(!scene.resize(800, 600).unwrap(), "same size should not rebuild");
        assert!(scene.resize(1600, 1200).unwrap());
        assert_eq!(scene.epoch(), epoch + 1);
        assert_eq!(*scene.view().state(), view_before);
        assert!(scene.stats().filler_stars > 0);
    }

    #[test]
    fn test_failed_resize_keeps_scene() {
        let mut scene = scene_looking_at("Rigel");
        let before = scene.stars().len();
        assert!(scene.resize(0, 10).is_err());
        assert_eq!(scene.stars().len(), before);
        assert_eq!((scene.width(), scene.height()), (800, 600));
    }

    #[test]
    fn test_pointer_on_endpoint_lights_line() {
        let mut scene = scene_looking_at("Betelgeuse");
        scene.update(0.0, HostProjection::All);
        let idx = scene.star_index("Betelgeuse").unwrap();
        let at = scene.stars()[idx].screen;

        scene.set_pointer_position(Some(at));
        scene.update(0.0, HostProjection::All);
        let max = scene.settings().reveal.max_opacity;
        let lit = scene
            .connections()
            .iter()
            .zip(scene.line_opacities())
            .filter(|(e, _)| e.a() == idx || e.b() == idx)
            .map(|(_, &o)| o)
            .fold(0.0_f32, f32::max);
        assert!((lit - max).abs() < 1e-3, "line opacity {lit}, expected {max}");

        scene.set_pointer_position(None);
        scene.update(0.0, HostProjection::All);
        assert!(scene.line_opacities().iter().all(|&o| o == 0.0));
    }

    #[test]
    fn test_linked_only_leaves_filler_untouched() {
        let mut scene = scene_looking_at("Deneb");
        scene.update(16.0, HostProjection::LinkedOnly);
        for star in scene.stars() {
            match star.tier() {
                LayerTier::Named => {}
                _ => assert_eq!(star.screen, Vec2::ZERO),
            }
        }
        assert!(scene.stats().visible_stars > 0);
    }

    #[test]
    fn test_background_regenerates_only_after_rotation() {
        let mut scene = scene_looking_at("Sirius");
        scene.update(16.0, HostProjection::All);
        let first = scene.background().generation();
        for _ in 0..10 {
            scene.update(16.0, HostProjection::All);
        }
        assert_eq!(scene.background().generation(), first, "still view redrew");

        scene.set_scroll_offset(5000.0);
        for _ in 0..60 {
            scene.update(16.0, HostProjection::All);
        }
        assert!(scene.background().generation() > first);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = SkySettings::default();
        settings.projection.zoom = -1.0;
        let err = SkyScene::new(settings, ThemePalette::default(), 10, 10);
        assert!(matches!(err, Err(SceneError::InvalidSetting { field: "projection.zoom", .. })));
    }

    #[test]
    fn test_negative_max_declination_is_an_error_not_a_panic() {
        let mut settings = SkySettings::default();
        settings.view.max_declination = -0.1;
        let err = SkyScene::new(settings, ThemePalette::default(), 10, 10);
        assert!(matches!(
            err,
            Err(SceneError::InvalidSetting { field: "view.max_declination", .. })
        ));

        let mut settings = SkySettings::default();
        settings.catalog.magnitude.faint = f32::NAN;
        let err = SkyScene::new(settings, ThemePalette::default(), 10, 10);
        assert!(matches!(
            err,
            Err(SceneError::InvalidSetting { field: "catalog.magnitude", .. })
        ));
    }

    #[test]
    fn test_runtime_star_ra_stays_below_tau() {
        let mut settings = SkySettings::default();
        settings.catalog.filler_seed = 653_637_408;
        let scene = SkyScene::new(settings, ThemePalette::default(), 800, 600).expect("scene");
        let outside: Vec<f32> = scene
            .stars()
            .iter()
            .map(|s| s.ra)
            .filter(|ra| !(0.0..std::f32::consts::TAU).contains(ra))
            .collect();
        assert!(outside.is_empty(), "RA outside [0, 2pi): {outside:?}");
    }
}
