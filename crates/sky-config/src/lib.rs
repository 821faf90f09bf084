//! Configuration for the night-sky viewer.
//!
//! Settings persist to `config.ron`, accept clap overrides and convert into
//! the [`sky_core::SkySettings`] the scene is built from.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BackendPreference, BackgroundConfig, Config, DebugConfig, RenderConfig, RevealConfig,
    SkyConfig, ThemeConfig, ViewConfig, WindowConfig,
};
pub use error::ConfigError;
