//! Application configuration
//!
//! Defaults, then an optional TOML file, then `MGO_*` environment variables.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, LogFormat, LogRotation, LoggingConfig, MongoConfig};
