//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Simulation settings.
    pub sim: SimConfig,
    /// Water/buoyancy settings.
    pub water: WaterConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// World gravity along Y.
    pub gravity_y: f32,
    /// Whether the host renders with textures (persisted with scenes).
    pub textures_enabled: bool,
    /// Seed for destruction and wander randomness; fixed seed, fixed
    /// outcomes.
    pub rng_seed: u64,
    /// Half-extent of the anchored ground plane, in meters. Smaller than
    /// the world bounds: beyond the ground lies open water.
    pub ground_half_extent: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity_y: -9.81,
            textures_enabled: true,
            rng_seed: 0x5eed_b0b5,
            ground_half_extent: 200.0,
        }
    }
}

/// Water configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaterConfig {
    /// Whether buoyancy simulation runs at all.
    pub enabled: bool,
    /// Resting water level (y).
    pub base_level: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_level: 0.0,
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log a per-frame stats line every N frames (0 = never).
    pub stats_interval: u32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: String::new(),
            stats_interval: 0,
        }
    }
}

impl Config {
    /// Loads configuration from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&content).map_err(ConfigError::ParseError)
    }

    /// Saves configuration to a RON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::SerializeError)?;
        std::fs::write(path, content).map_err(ConfigError::WriteError)
    }

    /// Loads from `path` if it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}
