//! `skyview` application: window, frame clock and headless frame output.

pub mod game_loop;
pub mod headless;
pub mod window;
