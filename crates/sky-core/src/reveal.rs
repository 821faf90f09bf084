//! Pointer-proximity reveal for constellation lines.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSettings {
    /// Distance in pixels beyond which lines stay hidden.
    pub radius_px: f32,
    /// Opacity reached when the pointer sits on an endpoint.
    pub max_opacity: f32,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            radius_px: 180.0,
            max_opacity: 0.6,
        }
    }
}

/// Tracks the last known pointer and turns distances into line opacity.
#[derive(Clone, Debug, Default)]
pub struct RevealController {
    settings: RevealSettings,
    pointer: Option<Vec2>,
}

impl RevealController {
    pub fn new(settings: RevealSettings) -> Self {
        Self {
            settings,
            pointer: None,
        }
    }

    pub fn settings(&self) -> &RevealSettings {
        &self.settings
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// `None` means the pointer left the surface. Non-finite positions count as no pointer.
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer.filter(|p| p.is_finite());
    }

    /// Opacity from the distance between the pointer and the nearer endpoint.
    pub fn opacity_for_distance(&self, distance: f32) -> f32 {
        let radius = self.settings.radius_px;
        if radius <= 0.0 || !(distance < radius) {
            return 0.0;
        }
        self.settings.max_opacity.clamp(0.0, 1.0) * (1.0 - distance.max(0.0) / radius)
    }

    /// Opacity of the line between two projected endpoints.
    ///
    /// Zero unless both endpoints are visible and a pointer is present.
    pub fn line_opacity(&self, a: Vec2, a_visible: bool, b: Vec2, b_visible: bool) -> f32 {
        let Some(pointer) = self.pointer else {
            return 0.0;
        };
        if !(a_visible && b_visible) {
            return 0.0;
        }
        let nearest = pointer.distance(a).min(pointer.distance(b));
        self.opacity_for_distance(nearest)
    }
}
