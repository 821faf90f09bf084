//! Configuration structs, defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sky_core::{
    BackgroundSettings, CatalogSettings, MagnitudeScale, ProjectionSettings, RevealSettings,
    SkySettings, ThemePalette, ThemePreset, ViewParams,
};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    /// Star population and procedural content.
    pub sky: SkyConfig,
    /// View motion and projection.
    pub view: ViewConfig,
    /// Constellation-line reveal around the pointer.
    pub reveal: RevealConfig,
    /// Cached background layer.
    pub background: BackgroundConfig,
    pub render: RenderConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    pub title: String,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
}

/// Catalog and generator knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    pub filler_seed: u32,
    /// Filler stars per megapixel of viewport.
    pub filler_density: f32,
    pub filler_min: usize,
    pub filler_max: usize,
    pub nebula_count: usize,
    pub galaxy_count: usize,
    pub content_seed: u64,
    pub twinkle_seed: u64,
    /// Magnitudes brighter than this map to full size and brightness.
    pub magnitude_bright: f32,
    /// Magnitudes fainter than this map to minimum size and brightness.
    pub magnitude_faint: f32,
    /// Star radius range in pixels, `(min, max)`.
    pub size_range: (f32, f32),
    /// Base opacity range, `(min, max)`.
    pub brightness_range: (f32, f32),
}

/// View motion and projection. Angles in radians.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub base_declination: f32,
    pub initial_right_ascension: f32,
    /// Radians of declination per pixel of scroll.
    pub scroll_rate: f32,
    /// Fraction of the remaining distance covered per tick.
    pub damping: f32,
    /// Right-ascension drift in radians per second.
    pub drift_rate: f32,
    pub max_declination: f32,
    pub zoom: f32,
    pub horizon_epsilon: f32,
    pub fade_window: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevealConfig {
    pub radius_px: f32,
    pub max_opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Accumulated rotation in radians before the background is redrawn.
    pub rotation_threshold: f32,
}

/// Which renderer to start with.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendPreference {
    /// GPU when a device is available, CPU otherwise.
    #[default]
    Auto,
    Gpu,
    Cpu,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: BackendPreference,
    /// Constellation line width in pixels.
    pub line_width: f32,
}

/// Palette selection. `custom` wins over `preset` when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    pub preset: ThemePreset,
    pub custom: Option<ThemePalette>,
}

impl ThemeConfig {
    pub fn palette(&self) -> ThemePalette {
        self.custom.unwrap_or_else(|| self.preset.palette())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g., "debug", "info,sky_render=trace").
    pub log_level: String,
    /// Log per-frame scene statistics every this many frames, 0 to disable.
    pub stats_interval: u32,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Skyview".to_string(),
            vsync: true,
        }
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        let catalog = CatalogSettings::default();
        let magnitude = catalog.magnitude;
        Self {
            filler_seed: catalog.filler_seed,
            filler_density: catalog.filler_density,
            filler_min: catalog.filler_min,
            filler_max: catalog.filler_max,
            nebula_count: catalog.nebula_count,
            galaxy_count: catalog.galaxy_count,
            content_seed: catalog.content_seed,
            twinkle_seed: catalog.twinkle_seed,
            magnitude_bright: magnitude.bright,
            magnitude_faint: magnitude.faint,
            size_range: magnitude.size,
            brightness_range: magnitude.brightness,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        let view = ViewParams::default();
        let projection = ProjectionSettings::default();
        Self {
            base_declination: view.base_declination,
            initial_right_ascension: view.initial_right_ascension,
            scroll_rate: view.scroll_rate,
            damping: view.damping,
            drift_rate: view.drift_rate,
            max_declination: view.max_declination,
            zoom: projection.zoom,
            horizon_epsilon: projection.horizon_epsilon,
            fade_window: projection.fade_window,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        let reveal = RevealSettings::default();
        Self {
            radius_px: reveal.radius_px,
            max_opacity: reveal.max_opacity,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            rotation_threshold: BackgroundSettings::default().rotation_threshold,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            line_width: 1.2,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 0,
        }
    }
}

// --- Conversion ---

impl Config {
    /// The scene settings this config describes.
    pub fn sky_settings(&self) -> SkySettings {
        let sky = &self.sky;
        let view = &self.view;
        SkySettings {
            catalog: CatalogSettings {
                filler_seed: sky.filler_seed,
                filler_density: sky.filler_density,
                filler_min: sky.filler_min,
                filler_max: sky.filler_max,
                nebula_count: sky.nebula_count,
                galaxy_count: sky.galaxy_count,
                content_seed: sky.content_seed,
                twinkle_seed: sky.twinkle_seed,
                magnitude: MagnitudeScale {
                    bright: sky.magnitude_bright,
                    faint: sky.magnitude_faint,
                    size: sky.size_range,
                    brightness: sky.brightness_range,
                },
            },
            view: ViewParams {
                base_declination: view.base_declination,
                scroll_rate: view.scroll_rate,
                damping: view.damping,
                drift_rate: view.drift_rate,
                max_declination: view.max_declination,
                initial_right_ascension: view.initial_right_ascension,
            },
            projection: ProjectionSettings {
                zoom: view.zoom,
                horizon_epsilon: view.horizon_epsilon,
                fade_window: view.fade_window,
            },
            reveal: RevealSettings {
                radius_px: self.reveal.radius_px,
                max_opacity: self.reveal.max_opacity,
            },
            background: BackgroundSettings {
                rotation_threshold: self.background.rotation_threshold,
            },
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load `config.ron` from `config_dir`, or write and return the defaults.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save as `config.ron` under `config_dir`, creating the directory if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Hot-reload: `Some(new_config)` if the file differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = std::fs::read_to_string(config_dir.join(CONFIG_FILE))
            .map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let ron_str =
            ron::ser::to_string_pretty(&Config::default(), ron::ser::PrettyConfig::new()).unwrap();
        assert!(ron_str.contains("width: 1280"), "{ron_str}");
        assert!(ron_str.contains("backend: Auto"), "{ron_str}");
        assert!(ron_str.contains("preset: Night"), "{ron_str}");
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.theme.custom = Some(ThemePreset::Aurora.palette());
        config.render.backend = BackendPreference::Cpu;
        let ron_str = ron::to_string(&config).unwrap();
        let back: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = ron::from_str("(window: (width: 640), render: ())").unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.sky, SkyConfig::default());
        assert_eq!(config.reveal, RevealConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_sky_settings_match_core_defaults() {
        assert_eq!(Config::default().sky_settings(), SkySettings::default());
    }

    #[test]
    fn test_sky_settings_carry_overrides() {
        let mut config = Config::default();
        config.sky.filler_seed = 99;
        config.view.zoom = 1.5;
        config.reveal.radius_px = 240.0;
        let settings = config.sky_settings();
        assert_eq!(settings.catalog.filler_seed, 99);
        assert_eq!(settings.projection.zoom, 1.5);
        assert_eq!(settings.reveal.radius_px, 240.0);
    }

    #[test]
    fn test_custom_palette_wins() {
        let mut theme = ThemeConfig {
            preset: ThemePreset::Dusk,
            custom: None,
        };
        assert_eq!(theme.palette(), ThemePreset::Dusk.palette());
        let custom = ThemePalette {
            background: [0.1, 0.2, 0.3],
            ..ThemePreset::Night.palette()
        };
        theme.custom = Some(custom);
        assert_eq!(theme.palette(), custom);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.sky.nebula_count = 9;
        config.theme.preset = ThemePreset::Aurora;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.view.drift_rate = 0.02;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.view.drift_rate), Some(0.02));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)), "{err}");
    }
}
