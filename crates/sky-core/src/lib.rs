//! Backend-agnostic night-sky model.
//!
//! Everything both renderers share lives here: the star catalog and filler
//! generator, the stereographic projector, the damped view controller,
//! procedural nebulae and galaxies, constellation edges, pointer reveal and
//! the background regeneration policy. [`SkyScene`] ties them together.

pub mod appearance;
pub mod background;
pub mod catalog;
pub mod constellation;
pub mod filler;
pub mod procedural;
pub mod projector;
pub mod reveal;
pub mod rng;
pub mod scene;
pub mod settings;
pub mod star;
pub mod theme;
pub mod view;

pub use appearance::MagnitudeScale;
pub use background::{BackgroundCache, BackgroundSettings};
pub use catalog::{BRIGHT_STARS, CatalogStar, SpectralClass};
pub use constellation::Connection;
pub use procedural::{Galaxy, GalaxyShape, Lobe, Nebula};
pub use projector::{ViewOrientation, project, project_faded};
pub use reveal::{RevealController, RevealSettings};
pub use rng::{FillerLcg, ObjectRng};
pub use scene::{HostProjection, SceneError, SceneStats, SkyScene};
pub use settings::{CatalogSettings, ProjectionSettings, SkySettings};
pub use star::{LayerTier, RuntimeStar};
pub use theme::{Rgb, ThemePalette, ThemePreset};
pub use view::{ViewController, ViewParams, ViewState};
