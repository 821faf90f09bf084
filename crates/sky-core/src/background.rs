//! Regeneration policy for the cached large-area background layer.
//!
//! Nebulae and galaxies are drawn into an off-frame target. The target is
//! only redrawn after the view has turned far enough since the last redraw,
//! so continuous scrolling shows a slightly stale background instead of
//! paying for full-screen gradients every frame.

use serde::{Deserialize, Serialize};

use crate::projector::ViewOrientation;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSettings {
    /// Accumulated rotation, radians, that triggers a redraw.
    pub rotation_threshold: f32,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            rotation_threshold: 1.0_f32.to_radians(),
        }
    }
}

/// Decides when the background layer is stale.
///
/// Renderers compare [`BackgroundCache::generation`] against the generation
/// they last drew and redraw on mismatch. `rendered_view` is the orientation
/// the current generation should be drawn with.
#[derive(Clone, Debug)]
pub struct BackgroundCache {
    threshold: f32,
    last_observed: Option<ViewOrientation>,
    accumulated: f32,
    rendered_view: ViewOrientation,
    generation: u64,
}

impl BackgroundCache {
    pub fn new(settings: BackgroundSettings) -> Self {
        Self {
            threshold: settings.rotation_threshold.max(0.0),
            last_observed: None,
            accumulated: 0.0,
            rendered_view: ViewOrientation::default(),
            generation: 0,
        }
    }

    /// Feed the orientation of the current tick. Returns `true` when the
    /// background must be regenerated.
    pub fn observe(&mut self, view: ViewOrientation) -> bool {
        let Some(last) = self.last_observed.replace(view) else {
            self.regenerate(view);
            return true;
        };
        self.accumulated += last.angle_to(&view);
        if self.accumulated > self.threshold {
            self.regenerate(view);
            return true;
        }
        false
    }

    /// Force a redraw on the next observation (resize, theme change).
    pub fn invalidate(&mut self) {
        self.last_observed = None;
        self.accumulated = 0.0;
    }

    fn regenerate(&mut self, view: ViewOrientation) {
        self.accumulated = 0.0;
        self.rendered_view = view;
        self.generation += 1;
        log::trace!("Background regeneration #{}", self.generation);
    }

    /// Incremented on every regeneration; starts at 0 before the first observation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Orientation the current background generation was taken at.
    pub fn rendered_view(&self) -> ViewOrientation {
        self.rendered_view
    }

    /// Rotation accumulated since the last regeneration, radians.
    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }
}

impl Default for BackgroundCache {
    fn default() -> Self {
        Self::new(BackgroundSettings::default())
    }
}
