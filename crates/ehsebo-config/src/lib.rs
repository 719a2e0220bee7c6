//! ehsebo-config
//!
//! Application settings and their on-disk persistence.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{AppConfig, Language, MirrorSettings, RateSettings};
