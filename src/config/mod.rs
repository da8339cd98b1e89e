//! Configuration — user settings loaded from `~/.akv.toml`.

pub mod settings;

pub use settings::{home_dir, Settings};
