//! Engine configuration with sensible defaults and RON persistence.

mod config;
mod error;

pub use config::{Config, DebugConfig, SimConfig, WaterConfig};
pub use error::ConfigError;
