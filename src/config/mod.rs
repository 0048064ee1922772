//! Configuration loaded from `passman.toml` in the data directory.

pub mod settings;

pub use settings::Settings;
