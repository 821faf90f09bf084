//! Scene construction knobs, grouped the way the config file groups them.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::appearance::MagnitudeScale;
use crate::background::BackgroundSettings;
use crate::projector::{DEFAULT_FADE_WINDOW, DEFAULT_HORIZON_EPSILON};
use crate::reveal::RevealSettings;
use crate::view::ViewParams;

/// Star population and procedural content.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub filler_seed: u32,
    /// Filler stars per megapixel of viewport.
    pub filler_density: f32,
    pub filler_min: usize,
    pub filler_max: usize,
    pub nebula_count: usize,
    pub galaxy_count: usize,
    /// Seed for nebula and galaxy streams.
    pub content_seed: u64,
    /// Seed for catalog-star twinkle parameters.
    pub twinkle_seed: u64,
    pub magnitude: MagnitudeScale,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            filler_seed: 0x5EED_0001,
            filler_density: 1800.0,
            filler_min: 300,
            filler_max: 6000,
            nebula_count: 5,
            galaxy_count: 7,
            content_seed: 2024,
            twinkle_seed: 7,
            magnitude: MagnitudeScale::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    /// Multiplier on the viewport-derived projection scale.
    pub zoom: f32,
    /// Hard horizon cutoff on the rotated principal axis.
    pub horizon_epsilon: f32,
    /// Smooth-fade window for nebulae and galaxies.
    pub fade_window: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            horizon_epsilon: DEFAULT_HORIZON_EPSILON,
            fade_window: DEFAULT_FADE_WINDOW,
        }
    }
}

/// Everything a [`crate::scene::SkyScene`] needs apart from the palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkySettings {
    pub catalog: CatalogSettings,
    pub view: ViewParams,
    pub projection: ProjectionSettings,
    pub reveal: RevealSettings,
    pub background: BackgroundSettings,
}

impl SkySettings {
    /// First out-of-range value found, as `(field, reason)`.
    pub fn invalid_field(&self) -> Option<(&'static str, String)> {
        let damping = self.view.damping;
        if !(damping > 0.0 && damping <= 1.0) {
            return Some(("view.damping", format!("{damping} not in (0, 1]")));
        }
        let zoom = self.projection.zoom;
        if !(zoom.is_finite() && zoom > 0.0) {
            return Some(("projection.zoom", format!("{zoom} must be positive")));
        }
        if self.catalog.filler_min > self.catalog.filler_max {
            return Some((
                "catalog.filler_min",
                format!(
                    "{} exceeds filler_max {}",
                    self.catalog.filler_min, self.catalog.filler_max
                ),
            ));
        }
        let max_dec = self.view.max_declination;
        if !(max_dec > 0.0 && max_dec <= FRAC_PI_2) {
            return Some(("view.max_declination", format!("{max_dec} not in (0, pi/2]")));
        }
        let view_values = [
            ("view.base_declination", self.view.base_declination),
            ("view.scroll_rate", self.view.scroll_rate),
            ("view.drift_rate", self.view.drift_rate),
            ("view.initial_right_ascension", self.view.initial_right_ascension),
        ];
        if let Some((field, value)) = view_values.into_iter().find(|(_, v)| !v.is_finite()) {
            return Some((field, format!("{value} is not finite")));
        }
        let magnitude = &self.catalog.magnitude;
        let window = [
            magnitude.bright,
            magnitude.faint,
            magnitude.size.0,
            magnitude.size.1,
            magnitude.brightness.0,
            magnitude.brightness.1,
        ];
        if window.iter().any(|v| !v.is_finite()) {
            return Some(("catalog.magnitude", "contains a non-finite value".to_string()));
        }
        if magnitude.faint < magnitude.bright {
            return Some((
                "catalog.magnitude.faint",
                format!("{} is brighter than bright {}", magnitude.faint, magnitude.bright),
            ));
        }
        let epsilon = self.projection.horizon_epsilon;
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Some((
                "projection.horizon_epsilon",
                format!("{epsilon} must be finite and non-negative"),
            ));
        }
        let fade = self.projection.fade_window;
        if !(fade.is_finite() && fade >= 0.0) {
            return Some((
                "projection.fade_window",
                format!("{fade} must be finite and non-negative"),
            ));
        }
        let threshold = self.background.rotation_threshold;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Some((
                "background.rotation_threshold",
                format!("{threshold} must be finite and non-negative"),
            ));
        }
        None
    }
}
