//! # Configuration Management
//!
//! Settings for the translation core: validation cache sizing, the external
//! proxy validator, and logging/metrics switches.

pub mod settings;

pub use settings::{AppConfig, ObservabilityConfig, ValidationConfig, ENV_PREFIX};
